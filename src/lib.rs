//! Travels API
//!
//! Fare estimation and form submission backend for the travels website:
//! prices local and outstation trips, and stores bookings, contact messages,
//! driver applications and quick leads in the business spreadsheet with an
//! e-mail alert to the operators.

pub mod clients;
pub mod config;
pub mod controllers;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;

use axum::Router;
use tower_http::trace::TraceLayer;

use middleware::cors::cors_middleware;
use state::AppState;

/// Full application router with its layers
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(routes::travels_routes::create_travels_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors_middleware())
        .with_state(state)
}
