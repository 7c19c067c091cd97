//! Vehicle tariffs
//!
//! One `VehicleTariff` prices one vehicle class in one trip mode. The mode is
//! carried by the `TariffPlan` variant, so a tariff always has exactly one of
//! the local or outstation rate sets.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

use crate::utils::fields::FieldSource;
use crate::utils::validation::{describe, validate_non_negative, validate_positive};

/// Trip mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TripMode {
    Local,
    Outstation,
}

impl TripMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripMode::Local => "local",
            TripMode::Outstation => "outstation",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "local" => Some(TripMode::Local),
            "outstation" => Some(TripMode::Outstation),
            _ => None,
        }
    }
}

/// Package rates for a local (city) rental
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalRates {
    pub base_fare: Decimal,
    pub base_km: u32,
    pub base_hr: u32,
    pub extra_km_rate: Decimal,
    pub extra_hr_rate: Decimal,
}

/// Per-kilometre rates for an outstation trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutstationRates {
    pub rate_per_km: Decimal,
    pub driver_bata: Decimal,
    pub min_km_per_day: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum TariffPlan {
    Local(LocalRates),
    Outstation(OutstationRates),
}

/// Pricing for one vehicle class in one trip mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleTariff {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub plan: TariffPlan,
}

impl VehicleTariff {
    pub fn local(id: &str, name: &str, rates: LocalRates) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            plan: TariffPlan::Local(rates),
        }
    }

    pub fn outstation(id: &str, name: &str, rates: OutstationRates) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            plan: TariffPlan::Outstation(rates),
        }
    }

    pub fn mode(&self) -> TripMode {
        match self.plan {
            TariffPlan::Local(_) => TripMode::Local,
            TariffPlan::Outstation(_) => TripMode::Outstation,
        }
    }

    /// Check the numeric invariants of the rate set
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.plan {
            TariffPlan::Local(rates) => {
                validate_non_negative("Base fare", rates.base_fare)?;
                validate_positive("Base km", rates.base_km)?;
                validate_positive("Base hours", rates.base_hr)?;
                validate_non_negative("Extra km rate", rates.extra_km_rate)?;
                validate_non_negative("Extra hour rate", rates.extra_hr_rate)?;
            }
            TariffPlan::Outstation(rates) => {
                validate_positive("Rate per km", rates.rate_per_km)?;
                validate_non_negative("Driver bata", rates.driver_bata)?;
                validate_positive("Minimum km per day", rates.min_km_per_day)?;
            }
        }
        Ok(())
    }

    /// Parse a row of the `tariff` tab
    pub fn from_row(row: &HashMap<String, String>) -> Result<Self, String> {
        let id = row
            .lookup(&["Id", "Vehicle_Id", "Tariff_Id"])
            .ok_or_else(|| "missing Id".to_string())?;
        let name = row
            .lookup(&["Name", "Vehicle_Name", "Vehicle"])
            .unwrap_or_else(|| id.clone());
        let mode_raw = row
            .lookup(&["Mode", "Type", "Trip_Type"])
            .ok_or_else(|| format!("{}: missing Mode", id))?;
        let mode = TripMode::parse(&mode_raw)
            .ok_or_else(|| format!("{}: unknown mode '{}'", id, mode_raw))?;

        let plan = match mode {
            TripMode::Local => TariffPlan::Local(LocalRates {
                base_fare: decimal_field(row, &id, &["Base_Fare", "baseFare"])?,
                base_km: integer_field(row, &id, &["Base_Km", "baseKm"])?,
                base_hr: integer_field(row, &id, &["Base_Hr", "Base_Hours", "baseHr"])?,
                extra_km_rate: decimal_field(row, &id, &["Extra_Km_Rate", "Km_Rate", "kmRate"])?,
                extra_hr_rate: decimal_field(row, &id, &["Extra_Hr_Rate", "Hr_Rate", "hrRate"])?,
            }),
            TripMode::Outstation => TariffPlan::Outstation(OutstationRates {
                rate_per_km: decimal_field(row, &id, &["Rate_Per_Km", "Km_Rate", "kmRate"])?,
                driver_bata: decimal_field(row, &id, &["Driver_Bata", "Bata"])?,
                min_km_per_day: integer_field(row, &id, &["Min_Km_Per_Day", "Min_Km", "minKm"])?,
            }),
        };

        let tariff = Self { id, name, plan };
        tariff
            .validate()
            .map_err(|e| format!("{}: {}", tariff.id, describe(&e)))?;
        Ok(tariff)
    }
}

fn decimal_field(row: &HashMap<String, String>, id: &str, aliases: &[&str]) -> Result<Decimal, String> {
    let raw = row
        .lookup(aliases)
        .ok_or_else(|| format!("{}: missing {}", id, aliases[0]))?;
    let cleaned: String = raw.chars().filter(|c| !matches!(c, ',' | '₹' | ' ')).collect();
    cleaned
        .parse::<Decimal>()
        .map_err(|_| format!("{}: {} is not a number ('{}')", id, aliases[0], raw))
}

fn integer_field(row: &HashMap<String, String>, id: &str, aliases: &[&str]) -> Result<u32, String> {
    let raw = row
        .lookup(aliases)
        .ok_or_else(|| format!("{}: missing {}", id, aliases[0]))?;
    raw.replace(',', "")
        .trim()
        .parse::<u32>()
        .map_err(|_| format!("{}: {} is not a whole number ('{}')", id, aliases[0], raw))
}

/// The tariff card, split by mode
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TariffCatalog {
    tariffs: Vec<VehicleTariff>,
}

impl TariffCatalog {
    pub fn new(tariffs: Vec<VehicleTariff>) -> Self {
        Self { tariffs }
    }

    /// Build a catalog from store rows, skipping rows that do not parse
    pub fn from_rows(rows: &[HashMap<String, String>]) -> Self {
        let tariffs = rows
            .iter()
            .filter_map(|row| match VehicleTariff::from_row(row) {
                Ok(tariff) => Some(tariff),
                Err(reason) => {
                    log::warn!("⚠️ Skipping tariff row: {}", reason);
                    None
                }
            })
            .collect();
        Self { tariffs }
    }

    pub fn is_empty(&self) -> bool {
        self.tariffs.is_empty()
    }

    pub fn find(&self, id: &str) -> Option<&VehicleTariff> {
        self.tariffs.iter().find(|t| t.id.eq_ignore_ascii_case(id.trim()))
    }

    pub fn local(&self) -> Vec<&VehicleTariff> {
        self.by_mode(TripMode::Local)
    }

    pub fn outstation(&self) -> Vec<&VehicleTariff> {
        self.by_mode(TripMode::Outstation)
    }

    fn by_mode(&self, mode: TripMode) -> Vec<&VehicleTariff> {
        self.tariffs.iter().filter(|t| t.mode() == mode).collect()
    }
}

fn local_rates(base_fare: i64, extra_km_rate: i64, extra_hr_rate: i64) -> LocalRates {
    LocalRates {
        base_fare: Decimal::from(base_fare),
        base_km: 50,
        base_hr: 5,
        extra_km_rate: Decimal::from(extra_km_rate),
        extra_hr_rate: Decimal::from(extra_hr_rate),
    }
}

fn outstation_rates(rate_per_km: i64, driver_bata: i64, min_km_per_day: u32) -> OutstationRates {
    OutstationRates {
        rate_per_km: Decimal::from(rate_per_km),
        driver_bata: Decimal::from(driver_bata),
        min_km_per_day,
    }
}

/// Published tariff card, used when the store has no `tariff` tab
pub fn default_catalog() -> TariffCatalog {
    TariffCatalog::new(vec![
        VehicleTariff::local("local-sedan", "4+1 Sedan", local_rates(1300, 14, 260)),
        VehicleTariff::local("local-innova", "7+1 Innova", local_rates(1900, 19, 300)),
        VehicleTariff::local("local-crysta", "7+1 Innova Crysta", local_rates(2200, 22, 440)),
        VehicleTariff::local("local-tempo", "12+1 Tempo Traveller", local_rates(3000, 24, 550)),
        VehicleTariff::outstation("outstation-sedan", "4+1 Sedan", outstation_rates(14, 700, 250)),
        VehicleTariff::outstation("outstation-innova", "7+1 Innova", outstation_rates(19, 800, 250)),
        VehicleTariff::outstation("outstation-crysta", "7+1 Crysta", outstation_rates(22, 800, 250)),
        VehicleTariff::outstation(
            "outstation-tempo",
            "12+1 Tempo Traveller",
            outstation_rates(24, 1000, 300),
        ),
    ])
}
