use serde::{Deserialize, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Outcome of a positioning solution. Only `Valid` fixes carry a usable
/// position, time and DOP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FixStatus {
    None,
    Valid,
    NoAprioriPos,
    EphNotAvailable,
    NotEnoughSats,
    MaxHdop,
    MaxEres,
    MaxCorrection,
    Exception,
}

impl FixStatus {
    pub fn is_valid(self) -> bool {
        self == FixStatus::Valid
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FixStatus::None => "None",
            FixStatus::Valid => "Valid",
            FixStatus::NoAprioriPos => "NoAprioriPos",
            FixStatus::EphNotAvailable => "EphNotAvailable",
            FixStatus::NotEnoughSats => "NotEnoughSats",
            FixStatus::MaxHdop => "MaxHDOP",
            FixStatus::MaxEres => "MaxERES",
            FixStatus::MaxCorrection => "MaxCorrection",
            FixStatus::Exception => "Exception",
        }
    }
}

impl fmt::Display for FixStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Geodetic position with its dilution-of-precision figures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
    pub pdop: f64,
    pub hdop: f64,
    pub vdop: f64,
}

/// A position solved from a specific set of observations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObservedFix {
    pub index: u32,
    pub status: FixStatus,
    pub sats_in_use: u8,
    pub sats_observed: u8,
    /// When the raw observation was taken.
    pub sample_time: OffsetDateTime,
    /// When the solution refers to (reference / RTC time). Not meaningful
    /// unless `status` is `Valid`.
    pub fix_time: OffsetDateTime,
    pub gps_week: u32,
    pub gps_tow: f64,
    pub position: Position,
    pub residual_error: f64,
}

impl ObservedFix {
    /// Seconds between sampling and the solution reference time.
    pub fn delta_s(&self) -> f64 {
        (unix_ms(self.fix_time) - unix_ms(self.sample_time)) as f64 / 1000.0
    }
}

/// One positioning solution as handed over by the producer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fix {
    Position(Position),
    Observed(ObservedFix),
}

impl Fix {
    pub fn position(&self) -> &Position {
        match self {
            Fix::Position(p) => p,
            Fix::Observed(o) => &o.position,
        }
    }

    pub fn observed(&self) -> Option<&ObservedFix> {
        match self {
            Fix::Observed(o) => Some(o),
            Fix::Position(_) => None,
        }
    }
}

impl From<Position> for Fix {
    fn from(p: Position) -> Self {
        Fix::Position(p)
    }
}

impl From<ObservedFix> for Fix {
    fn from(o: ObservedFix) -> Self {
        Fix::Observed(o)
    }
}

/// Milliseconds since the Unix epoch.
pub fn unix_ms(t: OffsetDateTime) -> i64 {
    (t.unix_timestamp_nanos() / 1_000_000) as i64
}

/// Inverse of [`unix_ms`]. Returns `None` outside the supported date range.
pub fn from_unix_ms(ms: i64) -> Option<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos(ms as i128 * 1_000_000).ok()
}
