//! Submission normalization
//!
//! Every form on the site posts its own field names. The tables below map
//! each channel's known spellings onto the canonical record, first alias
//! wins. Keys are compared folded (see `utils::fields`), so `Mobile_Number`,
//! `mobileNumber` and `mobile-number` are the same key.

use chrono::{DateTime, FixedOffset};
use serde_json::{Map, Value};

use crate::models::booking::{BookingRecord, Channel, DRIVER_PENDING, NOT_AVAILABLE};
use crate::utils::fields::{is_truthy, FieldSource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    CustomerName,
    MobileNumber,
    CountryCode,
    Email,
    PickupCity,
    DropCity,
    TravelDate,
    JourneyType,
    VehicleType,
    CompanyName,
    IsCorporate,
    Travelers,
    Comments,
}

/// Accepted spellings of one canonical field
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub field: CanonicalField,
    pub aliases: &'static [&'static str],
}

const fn rule(field: CanonicalField, aliases: &'static [&'static str]) -> FieldRule {
    FieldRule { field, aliases }
}

use CanonicalField::*;

const NAME: &[&str] = &["Customer_Name", "Name", "Full_Name"];
const MOBILE: &[&str] = &["Mobile_Number", "Mobile", "Phone", "Phone_Number", "WhatsApp"];
const COUNTRY: &[&str] = &["Country_Code", "Dial_Code"];
const EMAIL: &[&str] = &["Email", "Email_Address"];

const BOOKING_FIELDS: &[FieldRule] = &[
    rule(CustomerName, NAME),
    rule(MobileNumber, MOBILE),
    rule(CountryCode, COUNTRY),
    rule(Email, EMAIL),
    rule(PickupCity, &["Pickup_City", "Pickup", "From"]),
    rule(DropCity, &["Drop_City", "Dropoff", "Drop", "To"]),
    rule(TravelDate, &["Travel_Date", "Date_of_Journey", "Date"]),
    rule(JourneyType, &["Journey_Type", "JourneyType", "Trip_Type"]),
    rule(VehicleType, &["Vehicle_Type", "Vehicle"]),
    rule(CompanyName, &["Company_Name", "Company"]),
    rule(IsCorporate, &["Is_Corporate", "Corporate", "Corporate_Booking"]),
    rule(Travelers, &["Travelers", "Passengers"]),
    rule(Comments, &["Comments", "Message", "Notes"]),
];

const CONTACT_FIELDS: &[FieldRule] = &[
    rule(CustomerName, NAME),
    rule(MobileNumber, MOBILE),
    rule(CountryCode, COUNTRY),
    rule(Email, EMAIL),
    rule(PickupCity, &["City"]),
    rule(CompanyName, &["Company_Name", "Company"]),
    rule(Comments, &["Message", "Comments", "Subject"]),
];

const CAREER_FIELDS: &[FieldRule] = &[
    rule(CustomerName, &["Full_Name", "Name"]),
    rule(MobileNumber, &["Phone_Number", "Phone", "Mobile_Number"]),
    rule(CountryCode, COUNTRY),
    rule(Email, &["Email_Address", "Email"]),
    rule(PickupCity, &["City_Area", "City"]),
    rule(VehicleType, &["License_Type", "Vehicle_Type"]),
    rule(Comments, &["Experience", "Comments", "Message"]),
];

const LEAD_FIELDS: &[FieldRule] = &[
    rule(CustomerName, NAME),
    rule(MobileNumber, MOBILE),
    rule(CountryCode, COUNTRY),
    rule(PickupCity, &["Pickup_City", "Pickup"]),
    rule(DropCity, &["Drop_City", "Dropoff", "Drop"]),
    rule(JourneyType, &["Journey_Type"]),
    rule(VehicleType, &["Vehicle_Type", "Vehicle"]),
    rule(Comments, &["Comments", "Message"]),
];

/// Field-mapping table of a channel
pub fn field_map(channel: Channel) -> &'static [FieldRule] {
    match channel {
        Channel::Booking => BOOKING_FIELDS,
        Channel::Contact => CONTACT_FIELDS,
        Channel::Career => CAREER_FIELDS,
        Channel::Lead => LEAD_FIELDS,
    }
}

/// A submission in canonical shape, before defaults. `None` means the
/// customer did not provide the field.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSubmission {
    pub channel: Channel,
    pub customer_name: Option<String>,
    pub mobile_number: Option<String>,
    pub country_code: Option<String>,
    pub email: Option<String>,
    pub pickup_city: Option<String>,
    pub drop_city: Option<String>,
    pub travel_date: Option<String>,
    pub journey_type: Option<String>,
    pub vehicle_type: Option<String>,
    pub company_name: Option<String>,
    pub is_corporate: bool,
    pub travelers: Option<String>,
    pub comments: Option<String>,
}

impl NormalizedSubmission {
    fn empty(channel: Channel) -> Self {
        Self {
            channel,
            customer_name: None,
            mobile_number: None,
            country_code: None,
            email: None,
            pickup_city: None,
            drop_city: None,
            travel_date: None,
            journey_type: None,
            vehicle_type: None,
            company_name: None,
            is_corporate: false,
            travelers: None,
            comments: None,
        }
    }

    /// Fill every optional field with its default and attach identity.
    /// The resulting record never has an empty column.
    pub fn into_record(self, booking_id: String, submitted_at: DateTime<FixedOffset>) -> BookingRecord {
        let or_na = |value: Option<String>| value.unwrap_or_else(|| NOT_AVAILABLE.to_string());
        let default_vehicle = match self.channel {
            Channel::Booking => "Sedan",
            _ => NOT_AVAILABLE,
        };
        let travel_date = match self.channel {
            Channel::Booking | Channel::Lead => self
                .travel_date
                .unwrap_or_else(|| submitted_at.date_naive().format("%Y-%m-%d").to_string()),
            _ => or_na(self.travel_date),
        };

        BookingRecord {
            booking_id,
            channel: self.channel,
            submitted_at,
            customer_name: self.customer_name.unwrap_or_else(|| "Guest".to_string()),
            mobile_number: or_na(self.mobile_number),
            email: or_na(self.email),
            pickup_city: or_na(self.pickup_city),
            drop_city: or_na(self.drop_city),
            travel_date,
            journey_type: or_na(self.journey_type),
            vehicle_type: self.vehicle_type.unwrap_or_else(|| default_vehicle.to_string()),
            is_corporate: self.is_corporate,
            company_name: or_na(self.company_name),
            travelers: or_na(self.travelers),
            comments: or_na(self.comments),
            status: self.channel.initial_status().to_string(),
            driver_assigned: DRIVER_PENDING.to_string(),
        }
    }
}

/// Map a raw JSON payload onto the canonical fields of `channel`.
///
/// Unknown keys are ignored, as is any client-sent `Status`: the initial
/// status is decided by the channel. Older forms post a literal `N/A` for
/// empty inputs, which is read as not provided.
pub fn normalize(raw: &Map<String, Value>, channel: Channel) -> NormalizedSubmission {
    let mut out = NormalizedSubmission::empty(channel);
    let mut corporate_flag = false;

    for rule in field_map(channel) {
        let value = raw
            .lookup(rule.aliases)
            .filter(|v| !v.eq_ignore_ascii_case(NOT_AVAILABLE));
        match rule.field {
            CustomerName => out.customer_name = value,
            MobileNumber => out.mobile_number = value,
            CountryCode => out.country_code = value,
            Email => out.email = value,
            PickupCity => out.pickup_city = value,
            DropCity => out.drop_city = value,
            TravelDate => out.travel_date = value,
            JourneyType => out.journey_type = value,
            VehicleType => out.vehicle_type = value,
            CompanyName => out.company_name = value,
            IsCorporate => corporate_flag = value.map(|v| is_truthy(&v)).unwrap_or(false),
            Travelers => out.travelers = value,
            Comments => out.comments = value,
        }
    }

    out.is_corporate = corporate_flag || out.company_name.is_some();
    out
}
