//! Booking records
//!
//! A `BookingRecord` is the unit persisted for every accepted submission,
//! whatever form it came from. It is written once and never edited here;
//! status changes happen in the spreadsheet.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Where a submission came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    /// Full booking form
    Booking,
    /// Contact page message
    Contact,
    /// Driver job application
    Career,
    /// Quick call-back / WhatsApp lead from the home page
    Lead,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Booking, Channel::Contact, Channel::Career, Channel::Lead];

    /// Channel addressed by a `?action=` value
    pub fn from_action(action: &str) -> Option<Self> {
        match action {
            "submitBooking" => Some(Channel::Booking),
            "submitContact" => Some(Channel::Contact),
            "submitCareer" => Some(Channel::Career),
            "submitLead" => Some(Channel::Lead),
            _ => None,
        }
    }

    /// Logical table (spreadsheet tab) the channel writes to
    pub fn table(&self) -> &'static str {
        match self {
            Channel::Booking | Channel::Lead => "bookings",
            Channel::Contact => "contacts",
            Channel::Career => "careers",
        }
    }

    /// Booking-id prefix; keeps leads apart from bookings in the same tab
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Channel::Booking => "ST",
            Channel::Contact => "STC",
            Channel::Career => "STJ",
            Channel::Lead => "STW",
        }
    }

    pub fn initial_status(&self) -> &'static str {
        match self {
            Channel::Booking => "New",
            Channel::Contact => "New Inquiry",
            Channel::Career => "New Applicant",
            Channel::Lead => "Quick Lead",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Channel::Booking => "Booking",
            Channel::Contact => "Contact Message",
            Channel::Career => "Driver Application",
            Channel::Lead => "Quick Lead",
        }
    }
}

/// Placeholder written for optional fields the customer left empty
pub const NOT_AVAILABLE: &str = "N/A";
pub const DRIVER_PENDING: &str = "Pending";

/// Canonical persisted record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingRecord {
    pub booking_id: String,
    pub channel: Channel,
    pub submitted_at: DateTime<FixedOffset>,
    pub customer_name: String,
    pub mobile_number: String,
    pub email: String,
    pub pickup_city: String,
    pub drop_city: String,
    pub travel_date: String,
    pub journey_type: String,
    pub vehicle_type: String,
    pub company_name: String,
    pub is_corporate: bool,
    pub travelers: String,
    pub comments: String,
    pub status: String,
    pub driver_assigned: String,
}

/// Column order of every submission tab
pub const RECORD_COLUMNS: [&str; 16] = [
    "Booking_ID",
    "Timestamp",
    "Customer_Name",
    "Mobile_Number",
    "Email",
    "Pickup_City",
    "Drop_City",
    "Travel_Date",
    "Journey_Type",
    "Vehicle_Type",
    "Company_Name",
    "Is_Corporate",
    "Travelers",
    "Comments",
    "Status",
    "Driver_Assigned",
];

impl BookingRecord {
    /// Submission time as shown in the sheet, e.g. `19/10/2026, 3:05:09 pm`
    pub fn timestamp(&self) -> String {
        self.submitted_at.format("%d/%m/%Y, %-I:%M:%S %P").to_string()
    }

    /// Values in [`RECORD_COLUMNS`] order
    pub fn to_row(&self) -> Vec<(&'static str, String)> {
        let values = [
            self.booking_id.clone(),
            self.timestamp(),
            self.customer_name.clone(),
            self.mobile_number.clone(),
            self.email.clone(),
            self.pickup_city.clone(),
            self.drop_city.clone(),
            self.travel_date.clone(),
            self.journey_type.clone(),
            self.vehicle_type.clone(),
            self.company_name.clone(),
            if self.is_corporate { "Yes" } else { "No" }.to_string(),
            self.travelers.clone(),
            self.comments.clone(),
            self.status.clone(),
            self.driver_assigned.clone(),
        ];
        RECORD_COLUMNS.iter().copied().zip(values).collect()
    }
}
