use std::sync::Arc;

use serde_json::{Map, Value};

use crate::clients::TabularStore;
use crate::config::environment::EnvironmentConfig;
use crate::dto::travels_dto::{EstimateRequest, EstimateResponse, SubmissionResponse, TariffResponse};
use crate::models::booking::Channel;
use crate::models::fare::TripInputs;
use crate::models::route::RouteRecord;
use crate::models::tariff::{default_catalog, TariffCatalog, TripMode};
use crate::services::booking_id::now_ist;
use crate::services::fare_calculator;
use crate::services::submission_service::SubmissionService;
use crate::state::AppState;
use crate::utils::errors::{AppError, FareError};
use crate::utils::validation::{describe, validate_non_negative, validate_not_empty};

/// Store tab holding the editable tariff card
pub const TARIFF_TABLE: &str = "tariff";
/// Store tab holding the published routes
pub const ROUTES_TABLE: &str = "routes";

pub struct TravelsController {
    config: Arc<EnvironmentConfig>,
    store: Arc<dyn TabularStore>,
    submissions: Arc<SubmissionService>,
}

impl TravelsController {
    pub fn new(state: &AppState) -> Self {
        Self {
            config: state.config.clone(),
            store: state.store.clone(),
            submissions: state.submissions.clone(),
        }
    }

    pub async fn submit(
        &self,
        channel: Channel,
        payload: &Map<String, Value>,
    ) -> Result<SubmissionResponse, AppError> {
        let receipt = self
            .submissions
            .submit(payload, channel)
            .await
            .map_err(|e| AppError::from_submission(e, &self.config.business_phone))?;

        log::info!(
            "✅ {} accepted: {} (notification {:?})",
            channel.label(),
            receipt.booking_id,
            receipt.notification
        );
        Ok(SubmissionResponse::success(receipt.booking_id))
    }

    /// Tariff card from the store, or the built-in card when the tab is
    /// missing, empty or unreadable
    pub async fn tariff_catalog(&self) -> TariffCatalog {
        match self.store.read_rows(TARIFF_TABLE).await {
            Ok(rows) => {
                let catalog = TariffCatalog::from_rows(&rows);
                if catalog.is_empty() {
                    log::info!("📋 No tariffs in store, using built-in card");
                    default_catalog()
                } else {
                    catalog
                }
            }
            Err(e) => {
                log::warn!("⚠️ Tariff read failed, using built-in card: {}", e);
                default_catalog()
            }
        }
    }

    pub async fn tariff(&self) -> TariffResponse {
        let catalog = self.tariff_catalog().await;
        TariffResponse {
            local: catalog.local().into_iter().cloned().collect(),
            outstation: catalog.outstation().into_iter().cloned().collect(),
        }
    }

    /// Price a trip and attach the quotation text dated today (IST)
    pub async fn estimate_fare(&self, request: EstimateRequest) -> Result<EstimateResponse, AppError> {
        validate_not_empty("vehicleId", &request.vehicle_id).map_err(|e| AppError::Validation(describe(&e)))?;
        for (field, value) in [
            ("extraKm", request.extra_km),
            ("extraHr", request.extra_hr),
            ("days", request.days),
            ("distanceKm", request.distance_km),
        ] {
            if let Some(value) = value {
                validate_non_negative(field, value).map_err(|e| AppError::Validation(describe(&e)))?;
            }
        }

        let catalog = self.tariff_catalog().await;
        let tariff = catalog
            .find(&request.vehicle_id)
            .ok_or_else(|| FareError::UnknownTariff(request.vehicle_id.clone()))?;

        let inputs = match tariff.mode() {
            TripMode::Local => TripInputs::Local {
                extra_km: request.extra_km.unwrap_or(0),
                extra_hr: request.extra_hr.unwrap_or(0),
            },
            TripMode::Outstation => TripInputs::Outstation {
                days: request.days.unwrap_or(0),
                distance_km: request.distance_km.unwrap_or(0),
            },
        };

        let estimate = fare_calculator::estimate(tariff, inputs)?;
        let quotation =
            fare_calculator::quotation_text(&estimate, now_ist().date_naive(), &self.config.business_phone);
        Ok(EstimateResponse { estimate, quotation })
    }

    pub async fn routes(&self) -> Result<Vec<RouteRecord>, AppError> {
        let rows = self
            .store
            .read_rows(ROUTES_TABLE)
            .await
            .map_err(|e| AppError::ExternalApi(format!("routes read failed: {}", e)))?;
        let routes = RouteRecord::from_rows(&rows);
        log::debug!("🗺️ {} routes loaded", routes.len());
        Ok(routes)
    }
}
