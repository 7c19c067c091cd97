use serde::{Deserialize, Serialize};

use crate::models::fare::FareEstimate;
use crate::models::route::RouteRecord;
use crate::models::tariff::VehicleTariff;

/// Query string of the travels API, `?action=submitBooking`
#[derive(Debug, Default, Deserialize)]
pub struct ActionQuery {
    pub action: Option<String>,
}

/// Response of every submit action
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct SubmissionResponse {
    pub success: bool,
    pub id: String,
}

impl SubmissionResponse {
    pub fn success(id: String) -> Self {
        Self { success: true, id }
    }
}

/// Request of estimateFare. Only the fields of the tariff's mode are read.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    pub vehicle_id: String,
    #[serde(default)]
    pub extra_km: Option<i64>,
    #[serde(default)]
    pub extra_hr: Option<i64>,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default)]
    pub distance_km: Option<i64>,
}

/// Response of estimateFare: the estimate plus a shareable quotation
#[derive(Debug, Serialize)]
pub struct EstimateResponse {
    #[serde(flatten)]
    pub estimate: FareEstimate,
    pub quotation: String,
}

/// Response of getTariff
#[derive(Debug, Serialize)]
pub struct TariffResponse {
    pub local: Vec<VehicleTariff>,
    pub outstation: Vec<VehicleTariff>,
}

/// Response of getAllRoutes
#[derive(Debug, Serialize)]
pub struct RoutesResponse {
    pub routes: Vec<RouteRecord>,
}

/// Response of the legacy submit-booking function
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response of `/health`
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: String,
}
