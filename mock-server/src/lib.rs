use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{Path, Query},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use uuid::Uuid;

/// How long `/slow` waits before answering.
pub const SLOW_DELAY: Duration = Duration::from_secs(2);

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateResource {
    pub name: String,
    pub description: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Created {
    pub id: Uuid,
    pub name: String,
}

pub fn app() -> Router {
    Router::new()
        .route("/api/my-resource", get(get_resource).post(create_resource))
        .route("/echo", any(echo))
        .route("/status/{code}", any(status))
        .route("/headers", any(headers))
        .route("/slow", get(slow))
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_resource() -> Json<Message> {
    Json(Message {
        message: "my message".to_string(),
    })
}

async fn create_resource(Json(input): Json<CreateResource>) -> (StatusCode, Json<Created>) {
    tracing::debug!(name = %input.name, description = %input.description, "creating resource");
    let created = Created {
        id: Uuid::new_v4(),
        name: input.name,
    };
    (StatusCode::CREATED, Json(created))
}

/// Returns the request body unchanged, with the request's content type.
async fn echo(request_headers: HeaderMap, body: Bytes) -> Response {
    let mut response = body.into_response();
    if let Some(content_type) = request_headers.get(header::CONTENT_TYPE) {
        response
            .headers_mut()
            .insert(header::CONTENT_TYPE, content_type.clone());
    } else {
        response.headers_mut().remove(header::CONTENT_TYPE);
    }
    response
}

/// Responds with status `code` and the `body` query parameter, if any.
async fn status(
    Path(code): Path<u16>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Response, StatusCode> {
    let status = StatusCode::from_u16(code).map_err(|_| StatusCode::BAD_REQUEST)?;
    let body = params.get("body").cloned().unwrap_or_default();
    let mut response = (status, body).into_response();
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    Ok(response)
}

/// Reflects the request headers as a JSON object.
async fn headers(request_headers: HeaderMap) -> Json<BTreeMap<String, String>> {
    let reflected = request_headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    Json(reflected)
}

async fn slow() -> Json<Message> {
    tokio::time::sleep(SLOW_DELAY).await;
    Json(Message {
        message: "too late".to_string(),
    })
}

