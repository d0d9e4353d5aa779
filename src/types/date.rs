use std::fmt;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::trace;

use crate::utils::error::{DateFormatError, Result};

// Bounds substituted by start_date/end_date when the optional is absent.
const START_DATE_MILLIS: i64 = -5_364_662_400_000; // 1800-01-01T00:00:00Z
const END_DATE_MILLIS: i64 = 4_102_358_400_000; // 2099-12-31T00:00:00Z

/// Date as exchanged with the Exact Online API.
///
/// Exact sends dates as epoch milliseconds embedded in a string, most
/// commonly `"/Date(1234567890123)/"`, sometimes as a bare number.
/// `null` and digit-free payloads mean "no date", which decodes to the
/// unset value. An unset `Date` orders before every set one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Date(Option<DateTime<Utc>>);

impl Date {
    pub fn new(instant: Option<DateTime<Utc>>) -> Self {
        Date(instant)
    }

    pub fn is_set(&self) -> bool {
        self.0.is_some()
    }

    pub fn instant(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// Builds a date from whole milliseconds since the Unix epoch (UTC).
    pub fn from_epoch_millis(millis: i64) -> Result<Self> {
        DateTime::from_timestamp_millis(millis)
            .map(|instant| Date(Some(instant)))
            .ok_or(DateFormatError::OutOfRange(millis))
    }

    /// Decodes the textual content of a JSON date token.
    ///
    /// Accepts RFC 3339 date-times (the form [`Date`] itself
    /// serializes to) as well as the millisecond envelope; for the
    /// latter the first contiguous digit run is taken as epoch
    /// milliseconds. A token with no digits at all decodes as unset.
    pub fn from_wire(token: &str) -> Result<Self> {
        if let Ok(instant) = DateTime::<FixedOffset>::parse_from_rfc3339(token) {
            return Ok(Date(Some(instant.with_timezone(&Utc))));
        }

        match first_digit_run(token) {
            Some(digits) => Self::from_epoch_millis(digits.parse()?),
            None => {
                trace!(token, "date payload carries no digits, treating as unset");
                Ok(Date(None))
            }
        }
    }

    /// Lower bound for date-range filters: the date itself when the
    /// optional is present, 1800-01-01 when it is absent.
    pub fn start_date(date: Option<Date>) -> Date {
        date.unwrap_or(Date(DateTime::from_timestamp_millis(START_DATE_MILLIS)))
    }

    /// Upper bound for date-range filters: the date itself when the
    /// optional is present, 2099-12-31 when it is absent.
    pub fn end_date(date: Option<Date>) -> Date {
        date.unwrap_or(Date(DateTime::from_timestamp_millis(END_DATE_MILLIS)))
    }

    pub fn before(&self, other: Date) -> bool {
        self.0 < other.0
    }

    pub fn after(&self, other: Date) -> bool {
        self.0 > other.0
    }

    /// True when `self` lies strictly inside the open interval spanned
    /// by `a` and `b`, whichever order the bounds are given in.
    pub fn between(&self, a: Date, b: Date) -> bool {
        (self.after(a) && self.before(b)) || (self.after(b) && self.before(a))
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(instant: DateTime<Utc>) -> Self {
        Date(Some(instant))
    }
}

// First maximal run of ASCII decimal digits, if any.
fn first_digit_run(raw: &str) -> Option<&str> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let run = &raw[start..];
    let end = run
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(run.len());
    Some(&run[..end])
}

impl Serialize for Date {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self.0 {
            Some(instant) => {
                serializer.serialize_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            None => serializer.serialize_none(),
        }
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DateVisitor)
    }
}

struct DateVisitor;

impl<'de> Visitor<'de> for DateVisitor {
    type Value = Date;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an Exact date string, epoch milliseconds, or null")
    }

    fn visit_str<E>(self, v: &str) -> std::result::Result<Date, E>
    where
        E: de::Error,
    {
        Date::from_wire(v).map_err(E::custom)
    }

    // Numbers go through the same digit scan as strings so that the
    // envelope and bare-number encodings decode identically.
    fn visit_i64<E>(self, v: i64) -> std::result::Result<Date, E>
    where
        E: de::Error,
    {
        Date::from_wire(&v.to_string()).map_err(E::custom)
    }

    fn visit_u64<E>(self, v: u64) -> std::result::Result<Date, E>
    where
        E: de::Error,
    {
        Date::from_wire(&v.to_string()).map_err(E::custom)
    }

    fn visit_f64<E>(self, v: f64) -> std::result::Result<Date, E>
    where
        E: de::Error,
    {
        Date::from_wire(&v.to_string()).map_err(E::custom)
    }

    fn visit_unit<E>(self) -> std::result::Result<Date, E>
    where
        E: de::Error,
    {
        Ok(Date(None))
    }

    fn visit_none<E>(self) -> std::result::Result<Date, E>
    where
        E: de::Error,
    {
        Ok(Date(None))
    }

    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Date, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(DateVisitor)
    }
}
