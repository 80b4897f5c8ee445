// 🌐 REST API with Axum
// POST /receipts/process, GET /receipts/:id/points, GET /health

use crate::model::{
    is_valid_receipt_id, PointsResponse, ProcessResponse, Receipt, ReceiptPayload,
    ValidationError,
};
use crate::service::{ReceiptService, ServiceError};
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

const ROUTE_NOT_FOUND_MESSAGE: &str =
    "This endpoint isn't part of the receipt processor API. Try POST /receipts/process.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: ReceiptService,
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid receipt")]
    InvalidReceipt(Vec<ValidationError>),

    #[error("invalid receipt id: {0:?}")]
    InvalidReceiptId(String),

    #[error("receipt not found")]
    ReceiptNotFound,

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidReceipt(_) | Self::InvalidReceiptId(_) => StatusCode::BAD_REQUEST,
            Self::ReceiptNotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound(_) => ApiError::ReceiptNotFound,
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidReceipt(vec![ValidationError {
            field: "body".to_string(),
            message: rejection.body_text(),
        }])
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match self {
            Self::InvalidReceipt(errors) => json!({
                "detail": "The receipt is invalid.",
                "errors": errors,
            }),
            Self::InvalidReceiptId(_) => json!({ "detail": "The receipt id is invalid." }),
            Self::ReceiptNotFound => json!({ "detail": "Receipt not found" }),
            Self::Internal(message) => {
                // Details stay in the log
                error!(error = %message, "request failed");
                json!({ "detail": "Internal server error" })
            }
        };

        (status, Json(body)).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// GET /health - Health check
async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "OK",
        version: crate::VERSION,
    })
}

/// POST /receipts/process - Submit a receipt for processing
async fn process_receipt(
    State(state): State<AppState>,
    payload: Result<Json<ReceiptPayload>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let Json(payload) = payload?;

    let receipt = Receipt::try_from(payload).map_err(|errors| {
        warn!(errors = errors.len(), "rejected invalid receipt");
        ApiError::InvalidReceipt(errors)
    })?;

    // Dropping the handle detaches the scoring task
    let submission = state.service.process(receipt)?;

    Ok(Json(ProcessResponse { id: submission.id }))
}

/// GET /receipts/:id/points - Points awarded for a receipt
async fn get_receipt_points(
    State(state): State<AppState>,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<PointsResponse>, ApiError> {
    let Path(id) = id.map_err(|rejection| ApiError::InvalidReceiptId(rejection.body_text()))?;
    if !is_valid_receipt_id(&id) {
        return Err(ApiError::InvalidReceiptId(id));
    }

    let points = state.service.points(&id)?;
    Ok(Json(PointsResponse { points }))
}

/// Fallback for unmatched routes
async fn route_not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "Route not found",
            "message": ROUTE_NOT_FOUND_MESSAGE,
        })),
    )
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/receipts/process", post(process_receipt))
        .route("/receipts/:id/points", get(get_receipt_points))
        .fallback(route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::Value;
    use tower::ServiceExt;

    const TARGET_RECEIPT: &str = r#"{
        "retailer": "Target",
        "purchaseDate": "2022-01-01",
        "purchaseTime": "13:01",
        "total": "35.35",
        "items": [
            {"shortDescription": "Mountain Dew 12PK", "price": "6.49"}
        ]
    }"#;

    const CORNER_MARKET_RECEIPT: &str = r#"{
        "retailer": "M&M Corner Market",
        "purchaseDate": "2022-03-20",
        "purchaseTime": "14:33",
        "items": [
            {"shortDescription": "Gatorade", "price": "2.25"},
            {"shortDescription": "Gatorade", "price": "2.25"},
            {"shortDescription": "Gatorade", "price": "2.25"},
            {"shortDescription": "Gatorade", "price": "2.25"}
        ],
        "total": "9.00"
    }"#;

    fn app() -> Router {
        router(AppState {
            service: ReceiptService::in_memory(),
        })
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn post_receipt(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/receipts/process")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn submit(app: &Router, body: &str) -> String {
        let (status, json) = send(app, post_receipt(body)).await;
        assert_eq!(status, StatusCode::OK);
        json["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_process_then_points() {
        let app = app();
        let id = submit(&app, TARGET_RECEIPT).await;

        let (status, json) = send(&app, get(&format!("/receipts/{}/points", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "points": 12 }));
    }

    #[tokio::test]
    async fn test_corner_market_points() {
        let app = app();
        let id = submit(&app, CORNER_MARKET_RECEIPT).await;

        let (_, json) = send(&app, get(&format!("/receipts/{}/points", id))).await;
        assert_eq!(json["points"], 109);
    }

    #[tokio::test]
    async fn test_repeated_points_are_stable() {
        let app = app();
        let id = submit(&app, CORNER_MARKET_RECEIPT).await;
        let uri = format!("/receipts/{}/points", id);

        let (_, first) = send(&app, get(&uri)).await;
        tokio::task::yield_now().await;
        let (_, second) = send(&app, get(&uri)).await;

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_each_submission_gets_new_id() {
        let app = app();
        let first = submit(&app, TARGET_RECEIPT).await;
        let second = submit(&app, TARGET_RECEIPT).await;

        assert_ne!(first, second);
        assert!(uuid::Uuid::parse_str(&first).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_receipt_is_receipt_not_found() {
        let app = app();

        let (status, json) = send(&app, get("/receipts/unknown-id/points")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json, json!({ "detail": "Receipt not found" }));
    }

    #[tokio::test]
    async fn test_unmatched_route_is_route_not_found() {
        let app = app();

        let (status, json) = send(&app, get("/receipts/abc/score")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "Route not found");
        assert_eq!(json["message"], ROUTE_NOT_FOUND_MESSAGE);
    }

    #[tokio::test]
    async fn test_whitespace_id_rejected() {
        let app = app();

        let (status, json) = send(&app, get("/receipts/abc%20def/points")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "The receipt id is invalid.");
    }

    #[tokio::test]
    async fn test_non_utf8_id_rejected_as_json() {
        let app = app();

        let (status, json) = send(&app, get("/receipts/%FF%FE/points")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json, json!({ "detail": "The receipt id is invalid." }));
    }

    #[tokio::test]
    async fn test_blank_description_scores_end_to_end() {
        let app = app();
        let body = r#"{
            "retailer": "Target",
            "purchaseDate": "2022-01-01",
            "purchaseTime": "13:01",
            "total": "10.00",
            "items": [{"shortDescription": "   ", "price": "10.00"}]
        }"#;
        let id = submit(&app, body).await;

        // 6 retailer + 50 round + 25 quarter + 2 blank description + 6 odd day
        let (status, json) = send(&app, get(&format!("/receipts/{}/points", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "points": 89 }));
    }

    #[tokio::test]
    async fn test_oversized_amounts_rejected_at_submission() {
        let app = app();
        let huge_price = TARGET_RECEIPT.replace("6.49", "92233720368547758060.00");
        let huge_total = TARGET_RECEIPT.replace("35.35", "100000000000000000000000000000.00");

        for body in [huge_price, huge_total] {
            let (status, json) = send(&app, post_receipt(&body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(json["detail"], "The receipt is invalid.");
        }
    }

    #[tokio::test]
    async fn test_invalid_receipt_rejected() {
        let app = app();
        let body = TARGET_RECEIPT.replace("35.35", "35.3");

        let (status, json) = send(&app, post_receipt(&body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "The receipt is invalid.");
        assert_eq!(json["errors"][0]["field"], "total");
    }

    #[tokio::test]
    async fn test_malformed_json_rejected() {
        let app = app();

        let (status, json) = send(&app, post_receipt(r#"{"retailer": "Target"}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["detail"], "The receipt is invalid.");
        assert_eq!(json["errors"][0]["field"], "body");
    }

    #[tokio::test]
    async fn test_health_check() {
        let app = app();

        let (status, json) = send(&app, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "OK");
        assert_eq!(json["version"], crate::VERSION);
    }

    #[test]
    fn test_error_status_codes() {
        assert_eq!(ApiError::ReceiptNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::InvalidReceipt(vec![]).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidReceiptId(" ".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal("boom".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_service_not_found_maps_to_receipt_not_found() {
        let err: ApiError = ServiceError::NotFound("x".to_string()).into();
        assert!(matches!(err, ApiError::ReceiptNotFound));
    }
}
