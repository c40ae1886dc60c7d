use time::macros::datetime;
use time::OffsetDateTime;

/// Start of GPS time.
pub const GPS_EPOCH: OffsetDateTime = datetime!(1980-01-06 0:00 UTC);

/// GPS - UTC offset, valid since 2017-01-01.
pub const LEAP_SECONDS: i64 = 18;

const SECONDS_PER_WEEK: i64 = 7 * 86_400;

/// Converts a UTC instant into GPS week number and time of week (seconds).
///
/// Instants before the GPS epoch map to week 0, tow 0.
pub fn gps_week_tow(utc: OffsetDateTime) -> (u32, f64) {
    let since = utc - GPS_EPOCH;
    let ms = since.whole_milliseconds() as i64 + LEAP_SECONDS * 1000;
    if ms < 0 {
        return (0, 0.0);
    }
    let week = ms / (SECONDS_PER_WEEK * 1000);
    let tow_ms = ms % (SECONDS_PER_WEEK * 1000);
    (week as u32, tow_ms as f64 / 1000.0)
}
