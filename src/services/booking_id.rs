//! Booking identifiers
//!
//! Format: `<PREFIX>-<MMDD>-<SUFFIX>`, e.g. `ST-1019-K7QD`. The prefix names
//! the channel, `MMDD` is the submission date in IST and the suffix is drawn
//! from an alphabet without look-alike characters (no `I`, `O`, `0`, `1`).
//!
//! Ids are not checked against the store. With a 4-character suffix there are
//! 32^4 ids per prefix and day, so a collision is unlikely but possible under
//! load; operators de-duplicate on the timestamp column if it ever happens.

use chrono::{DateTime, Datelike, FixedOffset, Utc};
use lazy_static::lazy_static;
use rand::Rng;
use regex::Regex;

use crate::models::booking::Channel;

/// Characters used for the random suffix
pub const SUFFIX_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

lazy_static! {
    static ref BOOKING_ID_RE: Regex =
        Regex::new(r"^[A-Z]{2,3}-(0[1-9]|1[0-2])(0[1-9]|[12][0-9]|3[01])-[A-HJ-NP-Z2-9]{3,4}$").unwrap();
}

/// India Standard Time, the business's local clock
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is within range")
}

/// Current time in IST
pub fn now_ist() -> DateTime<FixedOffset> {
    Utc::now().with_timezone(&ist())
}

#[derive(Debug, Clone)]
pub struct BookingIdGenerator {
    suffix_len: usize,
}

impl BookingIdGenerator {
    /// `suffix_len` is clamped to 3..=4
    pub fn new(suffix_len: usize) -> Self {
        Self {
            suffix_len: suffix_len.clamp(3, 4),
        }
    }

    pub fn suffix_len(&self) -> usize {
        self.suffix_len
    }

    /// Generate an id with the thread-local RNG
    pub fn generate(&self, channel: Channel, at: DateTime<FixedOffset>) -> String {
        self.generate_with(channel, at, &mut rand::thread_rng())
    }

    /// Generate an id with a caller supplied RNG
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        channel: Channel,
        at: DateTime<FixedOffset>,
        rng: &mut R,
    ) -> String {
        let local = at.with_timezone(&ist());
        let suffix: String = (0..self.suffix_len)
            .map(|_| SUFFIX_ALPHABET[rng.gen_range(0..SUFFIX_ALPHABET.len())] as char)
            .collect();
        format!(
            "{}-{:02}{:02}-{}",
            channel.id_prefix(),
            local.month(),
            local.day(),
            suffix
        )
    }
}

impl Default for BookingIdGenerator {
    fn default() -> Self {
        Self::new(4)
    }
}

/// Whether `value` has the booking-id shape
pub fn is_valid_booking_id(value: &str) -> bool {
    BOOKING_ID_RE.is_match(value)
}
