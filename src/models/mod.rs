//! Domain models
//!
//! Tariffs, fare estimates, booking records and the read-only route list.

pub mod booking;
pub mod fare;
pub mod route;
pub mod tariff;

pub use booking::{BookingRecord, Channel};
pub use fare::{BreakdownLine, FareEstimate, TripInputs};
pub use route::{RouteCategory, RouteRecord};
pub use tariff::{TariffCatalog, TariffPlan, TripMode, VehicleTariff};
