use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::controllers::travels_controller::TravelsController;
use crate::dto::travels_dto::{
    ActionQuery, EstimateRequest, HealthResponse, MessageResponse, RoutesResponse,
};
use crate::models::booking::Channel;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, AppError};

pub fn create_travels_router() -> Router<AppState> {
    Router::new()
        .route(
            "/.netlify/functions/travels-api",
            get(travels_api).post(travels_api).options(preflight),
        )
        .route(
            "/api/travels",
            get(travels_api).post(travels_api).options(preflight),
        )
        .route(
            "/.netlify/functions/submit-booking",
            post(legacy_submit_booking).options(preflight),
        )
        .route("/health", get(health))
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        log::warn!("⚠️ Unreadable request body: {}", e);
        bad_request_error("Request body must be valid JSON")
    })
}

fn parse_object(body: &Bytes) -> Result<Map<String, Value>, AppError> {
    match parse_json::<Value>(body)? {
        Value::Object(map) => Ok(map),
        _ => Err(bad_request_error("Request body must be a JSON object")),
    }
}

/// Single entry point of the site's forms and fare calculator, `?action=` picks the operation
async fn travels_api(
    State(state): State<AppState>,
    Query(query): Query<ActionQuery>,
    body: Bytes,
) -> Result<Response, AppError> {
    let action = query.action.unwrap_or_default();
    let controller = TravelsController::new(&state);

    if let Some(channel) = Channel::from_action(&action) {
        let payload = parse_object(&body)?;
        let response = controller.submit(channel, &payload).await?;
        return Ok(Json(response).into_response());
    }

    match action.as_str() {
        "estimateFare" => {
            let request: EstimateRequest = parse_json(&body)?;
            Ok(Json(controller.estimate_fare(request).await?).into_response())
        }
        "getTariff" => Ok(Json(controller.tariff().await).into_response()),
        "getRoutes" => Ok(Json(controller.routes().await?).into_response()),
        "getAllRoutes" => {
            let routes = controller.routes().await?;
            Ok(Json(RoutesResponse { routes }).into_response())
        }
        _ => Err(bad_request_error("Invalid Action")),
    }
}

/// Older booking form posting `name`/`phone`/`pickup`/`drop`
async fn legacy_submit_booking(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let payload = parse_object(&body)?;
    TravelsController::new(&state)
        .submit(Channel::Booking, &payload)
        .await?;
    Ok(Json(MessageResponse {
        message: "Success".to_string(),
    }))
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
