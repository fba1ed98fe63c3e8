//! 解説プロキシの HTTP サーバ（`POST /api/openai` のみ）

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::insight::{ErrorBody, InsightError, InsightService, SummarizeRequest, SummarizeResponse};

pub const INSIGHT_PATH: &str = "/api/openai";

pub fn router(service: Arc<InsightService>) -> Router {
    Router::new()
        .route(INSIGHT_PATH, post(summarize).fallback(method_not_allowed))
        .with_state(service)
}

pub async fn serve(listener: TcpListener, service: Arc<InsightService>) -> std::io::Result<()> {
    let addr = listener.local_addr()?;
    info!(%addr, model = service.model(), "insight proxy listening");
    axum::serve(listener, router(service)).await
}

async fn summarize(
    State(service): State<Arc<InsightService>>,
    Json(request): Json<SummarizeRequest>,
) -> Result<Json<SummarizeResponse>, ApiError> {
    let data = service
        .summarize(&request.token_name, &request.token_description)
        .await
        .map_err(ApiError)?;
    Ok(Json(SummarizeResponse { data }))
}

async fn method_not_allowed() -> impl IntoResponse {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        [(header::ALLOW, "POST")],
        "Method Not Allowed",
    )
}

/// 上流の失敗をログに残し、呼び出し側にもステータス付きで返す
pub struct ApiError(pub InsightError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self.0 {
            InsightError::Api {
                status,
                message,
                code,
                kind,
            } => {
                error!(
                    status,
                    message = %message,
                    code = code.as_deref().unwrap_or("-"),
                    kind = kind.as_deref().unwrap_or("-"),
                    "upstream API error"
                );
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        error: message,
                        status: Some(status),
                        code,
                        kind,
                    },
                )
            }
            InsightError::MissingApiKey(ref env) => {
                error!(env = %env, "API key is not configured");
                (StatusCode::INTERNAL_SERVER_ERROR, plain(&self.0))
            }
            ref other => {
                error!(error = %other, "insight request failed");
                (StatusCode::BAD_GATEWAY, plain(other))
            }
        };
        (status, Json(body)).into_response()
    }
}

fn plain(err: &InsightError) -> ErrorBody {
    ErrorBody {
        error: err.to_string(),
        status: None,
        code: None,
        kind: None,
    }
}
