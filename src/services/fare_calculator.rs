//! Fare calculator
//!
//! Pure price estimation for local packages and outstation trips. No I/O and
//! no hidden state: identical inputs always give identical estimates.
//!
//! Outstation trips are billed on `max(actual km, days × minimum km per day)`.
//! The daily minimum always wins; that is published business policy.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::fare::{BreakdownLine, FareEstimate, TripInputs};
use crate::models::tariff::{TariffPlan, TripMode, VehicleTariff};
use crate::utils::errors::FareError;

/// Shown while an outstation estimate is missing its days or distance
pub const INCOMPLETE_OUTSTATION_NOTE: &str = "Enter trip days and kilometers.";
const OUT_OF_RANGE_NOTE: &str = "Trip parameters are out of range.";
const EXCLUSIONS_NOTE: &str = "Excludes tolls, parking, and permits (actuals charged later).";

fn mismatch(tariff: &VehicleTariff, expected: TripMode) -> FareError {
    FareError::ModeMismatch {
        id: tariff.id.clone(),
        expected: expected.as_str(),
        actual: tariff.mode().as_str(),
    }
}

fn placeholder(tariff: &VehicleTariff, inputs: TripInputs, note: &str) -> FareEstimate {
    FareEstimate {
        vehicle_id: tariff.id.clone(),
        vehicle_name: tariff.name.clone(),
        mode: tariff.mode(),
        inputs,
        charged_km: None,
        min_charge_applied: false,
        breakdown_lines: Vec::new(),
        total: Decimal::ZERO,
        note: Some(note.to_string()),
    }
}

/// Price a local package. Negative extras are treated as zero.
pub fn estimate_local(
    tariff: &VehicleTariff,
    extra_km: i64,
    extra_hr: i64,
) -> Result<FareEstimate, FareError> {
    let rates = match &tariff.plan {
        TariffPlan::Local(rates) => rates,
        TariffPlan::Outstation(_) => return Err(mismatch(tariff, TripMode::Local)),
    };

    let extra_km = extra_km.max(0);
    let extra_hr = extra_hr.max(0);
    let inputs = TripInputs::Local { extra_km, extra_hr };

    let (Some(km_cost), Some(hr_cost)) = (
        Decimal::from(extra_km).checked_mul(rates.extra_km_rate),
        Decimal::from(extra_hr).checked_mul(rates.extra_hr_rate),
    ) else {
        return Ok(placeholder(tariff, inputs, OUT_OF_RANGE_NOTE));
    };
    let Some(total) = rates
        .base_fare
        .checked_add(km_cost)
        .and_then(|sum| sum.checked_add(hr_cost))
    else {
        return Ok(placeholder(tariff, inputs, OUT_OF_RANGE_NOTE));
    };

    let mut lines = vec![BreakdownLine::new(
        format!("Base Package ({} Hrs & {} KMs)", rates.base_hr, rates.base_km),
        rates.base_fare,
    )];
    if extra_km > 0 {
        lines.push(BreakdownLine::new(
            format!("Extra KMs ({} km @ {}/km)", extra_km, format_inr(rates.extra_km_rate)),
            km_cost,
        ));
    }
    if extra_hr > 0 {
        lines.push(BreakdownLine::new(
            format!("Extra Hours ({} hr @ {}/hr)", extra_hr, format_inr(rates.extra_hr_rate)),
            hr_cost,
        ));
    }

    Ok(FareEstimate {
        vehicle_id: tariff.id.clone(),
        vehicle_name: tariff.name.clone(),
        mode: TripMode::Local,
        inputs,
        charged_km: None,
        min_charge_applied: false,
        total,
        breakdown_lines: lines,
        note: None,
    })
}

/// Price an outstation trip.
///
/// Fewer than one day, or no distance yet, is incomplete input rather than an
/// error: the estimate comes back with a zero total and an explanatory note.
pub fn estimate_outstation(
    tariff: &VehicleTariff,
    days: i64,
    distance_km: i64,
) -> Result<FareEstimate, FareError> {
    let rates = match &tariff.plan {
        TariffPlan::Outstation(rates) => rates,
        TariffPlan::Local(_) => return Err(mismatch(tariff, TripMode::Outstation)),
    };

    let inputs = TripInputs::Outstation { days, distance_km };
    if days < 1 || distance_km <= 0 {
        return Ok(placeholder(tariff, inputs, INCOMPLETE_OUTSTATION_NOTE));
    }

    let Some(min_required_km) = days.checked_mul(i64::from(rates.min_km_per_day)) else {
        return Ok(placeholder(tariff, inputs, OUT_OF_RANGE_NOTE));
    };
    let charged_km = distance_km.max(min_required_km);
    let min_charge_applied = charged_km > distance_km;

    let (Some(km_cost), Some(bata_cost)) = (
        Decimal::from(charged_km).checked_mul(rates.rate_per_km),
        Decimal::from(days).checked_mul(rates.driver_bata),
    ) else {
        return Ok(placeholder(tariff, inputs, OUT_OF_RANGE_NOTE));
    };
    let Some(total) = km_cost.checked_add(bata_cost) else {
        return Ok(placeholder(tariff, inputs, OUT_OF_RANGE_NOTE));
    };

    let lines = vec![
        BreakdownLine::new(
            format!(
                "KM Charges ({} km @ {}/km, {})",
                group_digits(&charged_km.to_string()),
                format_inr(rates.rate_per_km),
                if min_charge_applied { "Min. Charge Applied" } else { "Actual KMs" }
            ),
            km_cost,
        ),
        BreakdownLine::new(
            format!("Driver BATA ({} day/s @ {})", days, format_inr(rates.driver_bata)),
            bata_cost,
        ),
    ];

    Ok(FareEstimate {
        vehicle_id: tariff.id.clone(),
        vehicle_name: tariff.name.clone(),
        mode: TripMode::Outstation,
        inputs,
        charged_km: Some(charged_km),
        min_charge_applied,
        total,
        breakdown_lines: lines,
        note: None,
    })
}

/// Dispatch on the shape of `inputs`
pub fn estimate(tariff: &VehicleTariff, inputs: TripInputs) -> Result<FareEstimate, FareError> {
    match inputs {
        TripInputs::Local { extra_km, extra_hr } => estimate_local(tariff, extra_km, extra_hr),
        TripInputs::Outstation { days, distance_km } => {
            estimate_outstation(tariff, days, distance_km)
        }
    }
}

/// Indian digit grouping: the last three digits, then pairs (`12,34,567`)
fn group_digits(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

/// Format an amount in rupees with Indian grouping, e.g. `₹1,00,000` or `₹1,234.50`
pub fn format_inr(amount: Decimal) -> String {
    let rounded = amount.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() { "-" } else { "" };
    let abs = rounded.abs();
    let whole = abs.trunc();
    let fraction = abs - whole;

    let grouped = group_digits(&whole.to_string());
    if fraction.is_zero() {
        format!("{}₹{}", sign, grouped)
    } else {
        let cents = (fraction * Decimal::from(100)).round();
        format!("{}₹{}.{:0>2}", sign, grouped, cents.to_string())
    }
}

/// Plain-text quotation suitable for sharing over WhatsApp or printing
pub fn quotation_text(estimate: &FareEstimate, quote_date: NaiveDate, booking_phone: &str) -> String {
    let package = match estimate.mode {
        TripMode::Local => "Local Package",
        TripMode::Outstation => "Outstation Package",
    };

    let mut text = String::from("*Your Travel Quotation from Shrish Travels*\n\n");
    text.push_str(&format!("Vehicle: {}\n", estimate.vehicle_name));
    text.push_str(&format!("Package: {}\n", package));
    text.push_str(&format!("Date: {}\n\n", quote_date.format("%d/%m/%Y")));

    if let Some(note) = &estimate.note {
        text.push_str(note);
        text.push('\n');
    }
    for line in &estimate.breakdown_lines {
        text.push_str(&format!("{}: {}\n", line.label, format_inr(line.amount)));
    }

    text.push_str(&format!("\n*Estimated Total: {}*\n", format_inr(estimate.total)));
    text.push_str(&format!("Note: {}\n", EXCLUSIONS_NOTE));
    text.push_str(&format!("Call to book: {}", booking_phone));
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tariff::{default_catalog, LocalRates, OutstationRates};
    use rust_decimal_macros::dec;

    fn local_sedan() -> VehicleTariff {
        VehicleTariff::local(
            "local-sedan",
            "4+1 Sedan",
            LocalRates {
                base_fare: dec!(1300),
                base_km: 50,
                base_hr: 5,
                extra_km_rate: dec!(14),
                extra_hr_rate: dec!(260),
            },
        )
    }

    fn outstation(rate: i64, bata: i64, min_km: u32) -> VehicleTariff {
        VehicleTariff::outstation(
            "outstation-test",
            "Test",
            OutstationRates {
                rate_per_km: Decimal::from(rate),
                driver_bata: Decimal::from(bata),
                min_km_per_day: min_km,
            },
        )
    }

    #[test]
    fn test_local_package_with_extras() {
        let estimate = estimate_local(&local_sedan(), 10, 1).unwrap();
        assert_eq!(estimate.total, dec!(1700));
        assert_eq!(estimate.breakdown_lines.len(), 3);
        assert_eq!(estimate.breakdown_sum(), estimate.total);
        assert!(estimate.is_computable());
    }

    #[test]
    fn test_local_package_omits_zero_extras() {
        let estimate = estimate_local(&local_sedan(), 0, 2).unwrap();
        assert_eq!(estimate.total, dec!(1820));
        assert_eq!(estimate.breakdown_lines.len(), 2);
        assert!(estimate.breakdown_lines[1].label.starts_with("Extra Hours"));
    }

    #[test]
    fn test_local_negative_inputs_clamp_to_zero() {
        let estimate = estimate_local(&local_sedan(), -40, -3).unwrap();
        assert_eq!(estimate.total, dec!(1300));
        assert_eq!(estimate.inputs, TripInputs::Local { extra_km: 0, extra_hr: 0 });
    }

    #[test]
    fn test_local_total_is_monotonic() {
        let tariff = local_sedan();
        let mut previous = Decimal::ZERO;
        for extra in 0..20 {
            let total = estimate_local(&tariff, extra * 5, extra).unwrap().total;
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn test_outstation_minimum_floor_applies() {
        let estimate = estimate_outstation(&outstation(14, 700, 250), 1, 100).unwrap();
        assert_eq!(estimate.charged_km, Some(250));
        assert_eq!(estimate.total, dec!(4200));
        assert!(estimate.min_charge_applied);
        assert!(estimate.breakdown_lines[0].label.contains("Min. Charge Applied"));
    }

    #[test]
    fn test_outstation_two_day_trip() {
        let estimate = estimate_outstation(&outstation(19, 800, 250), 2, 400).unwrap();
        assert_eq!(estimate.charged_km, Some(500));
        assert_eq!(estimate.total, dec!(11100));
        assert_eq!(estimate.breakdown_sum(), estimate.total);
    }

    #[test]
    fn test_outstation_actual_distance_above_floor() {
        let estimate = estimate_outstation(&outstation(14, 700, 250), 1, 620).unwrap();
        assert_eq!(estimate.charged_km, Some(620));
        assert!(!estimate.min_charge_applied);
        assert!(estimate.breakdown_lines[0].label.contains("Actual KMs"));
        assert_eq!(estimate.total, dec!(9380));
    }

    #[test]
    fn test_outstation_incomplete_input_is_placeholder() {
        for (days, km) in [(0, 400), (-1, 400), (2, 0), (0, 0)] {
            let estimate = estimate_outstation(&outstation(14, 700, 250), days, km).unwrap();
            assert_eq!(estimate.total, Decimal::ZERO);
            assert!(estimate.breakdown_lines.is_empty());
            assert_eq!(estimate.note.as_deref(), Some(INCOMPLETE_OUTSTATION_NOTE));
            assert!(!estimate.is_computable());
        }
    }

    #[test]
    fn test_charged_km_never_below_floor() {
        let tariff = outstation(22, 800, 250);
        for days in 1..6 {
            for km in [1, 100, 249, 250, 251, 900, 1500] {
                let estimate = estimate_outstation(&tariff, days, km).unwrap();
                assert_eq!(estimate.charged_km, Some(km.max(days * 250)));
            }
        }
    }

    #[test]
    fn test_mode_mismatch_is_rejected() {
        let err = estimate_local(&outstation(14, 700, 250), 1, 1).unwrap_err();
        assert!(matches!(err, FareError::ModeMismatch { expected: "local", .. }));
        assert!(estimate_outstation(&local_sedan(), 1, 100).is_err());
        assert!(estimate(&local_sedan(), TripInputs::Outstation { days: 1, distance_km: 10 }).is_err());
    }

    #[test]
    fn test_estimates_are_deterministic() {
        let catalog = default_catalog();
        let tariff = catalog.find("outstation-tempo").unwrap();
        let inputs = TripInputs::Outstation { days: 3, distance_km: 700 };
        assert_eq!(estimate(tariff, inputs).unwrap(), estimate(tariff, inputs).unwrap());
    }

    #[test]
    fn test_huge_inputs_do_not_panic() {
        let estimate = estimate_outstation(&outstation(14, 700, 250), i64::MAX, i64::MAX).unwrap();
        assert_eq!(estimate.total, Decimal::ZERO);
        assert_eq!(estimate.note.as_deref(), Some(OUT_OF_RANGE_NOTE));
    }

    #[test]
    fn test_overflowing_totals_give_out_of_range_estimate() {
        let mut tariff = local_sedan();
        if let TariffPlan::Local(rates) = &mut tariff.plan {
            rates.extra_km_rate = dec!(5000000000);
            rates.extra_hr_rate = dec!(5000000000);
        }
        let estimate = estimate_local(&tariff, i64::MAX, i64::MAX).unwrap();
        assert_eq!(estimate.total, Decimal::ZERO);
        assert_eq!(estimate.note.as_deref(), Some(OUT_OF_RANGE_NOTE));

        // Each product fits, only the sum overflows
        let tariff = outstation(5_000_000_000, 5_000_000_000, 0);
        let estimate = estimate_outstation(&tariff, i64::MAX, i64::MAX).unwrap();
        assert_eq!(estimate.total, Decimal::ZERO);
        assert_eq!(estimate.note.as_deref(), Some(OUT_OF_RANGE_NOTE));
    }

    #[test]
    fn test_format_inr() {
        assert_eq!(format_inr(dec!(0)), "₹0");
        assert_eq!(format_inr(dec!(700)), "₹700");
        assert_eq!(format_inr(dec!(4200)), "₹4,200");
        assert_eq!(format_inr(dec!(100000)), "₹1,00,000");
        assert_eq!(format_inr(dec!(12345678)), "₹1,23,45,678");
        assert_eq!(format_inr(dec!(1234.5)), "₹1,234.50");
        assert_eq!(format_inr(dec!(-1500)), "-₹1,500");
    }

    #[test]
    fn test_quotation_text() {
        let estimate = estimate_local(&local_sedan(), 10, 1).unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let text = quotation_text(&estimate, date, "+91 888 345 1668");
        assert!(text.contains("Vehicle: 4+1 Sedan"));
        assert!(text.contains("Date: 19/10/2026"));
        assert!(text.contains("Extra KMs (10 km @ ₹14/km): ₹140"));
        assert!(text.contains("*Estimated Total: ₹1,700*"));
        assert!(text.ends_with("+91 888 345 1668"));
    }
}
