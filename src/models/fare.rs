//! Fare estimates

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::tariff::TripMode;

/// Raw trip parameters an estimate was computed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TripInputs {
    Local {
        #[serde(rename = "extraKm")]
        extra_km: i64,
        #[serde(rename = "extraHr")]
        extra_hr: i64,
    },
    Outstation {
        days: i64,
        #[serde(rename = "distanceKm")]
        distance_km: i64,
    },
}

/// One labelled amount of an estimate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakdownLine {
    pub label: String,
    pub amount: Decimal,
}

impl BreakdownLine {
    pub fn new(label: impl Into<String>, amount: Decimal) -> Self {
        Self {
            label: label.into(),
            amount,
        }
    }
}

/// Result of a fare calculation. Never mutated after it is produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FareEstimate {
    pub vehicle_id: String,
    pub vehicle_name: String,
    pub mode: TripMode,
    pub inputs: TripInputs,
    /// Kilometres billed on an outstation trip, after the daily minimum
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charged_km: Option<i64>,
    pub min_charge_applied: bool,
    pub breakdown_lines: Vec<BreakdownLine>,
    pub total: Decimal,
    /// Set while the inputs are not yet enough to price the trip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl FareEstimate {
    pub fn is_computable(&self) -> bool {
        self.note.is_none() && self.total > Decimal::ZERO
    }

    pub fn breakdown_sum(&self) -> Decimal {
        self.breakdown_lines.iter().map(|line| line.amount).sum()
    }
}
