//! Fixed-column text rendering of fixes.

use time::format_description::FormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use fixtrail_proto::fix::Fix;

use crate::error::FormatError;

pub const LINE_END: &str = "\r\n";

pub const HEADER: &str = "Index         Status  Sats      Date      RTC time       FIX time   Delta(s)   GPS week        GPS tow     Latitude    Longitude     Altitude   HDOP   eRes";

const DATE: &[FormatItem<'static>] = format_description!("[year repr:last_two]/[month]/[day]");
const TIME_OF_DAY: &[FormatItem<'static>] =
    format_description!("[hour]:[minute]:[second].[subsecond digits:3]");

/// Header line including its terminator.
pub fn header_line() -> String {
    format!("{HEADER}{LINE_END}")
}

/// Renders one record line including its terminator.
///
/// Index, status, satellites, date and sample time are always present.
/// Everything from the fix time onwards is only written for `Valid` fixes.
pub fn format_record(fix: &Fix) -> Result<String, FormatError> {
    let o = fix.observed().ok_or(FormatError::NotObserved)?;

    let mut line = format!(
        "{:>5}  {:>13}  {:>2}/{:>1}  {:>8}{:>14}",
        o.index,
        o.status,
        o.sats_in_use,
        o.sats_observed,
        utc(o.fix_time).format(DATE)?,
        utc(o.sample_time).format(TIME_OF_DAY)?,
    );

    if o.status.is_valid() {
        let p = &o.position;
        line.push_str(&format!(
            "{:>15}{:>10.3}{:>12}{:>15.3}{:>13.5}{:>13.5}{:>13.5}{:>7.1}{:>7.1}",
            utc(o.fix_time).format(TIME_OF_DAY)?,
            o.delta_s(),
            o.gps_week,
            o.gps_tow,
            p.latitude,
            p.longitude,
            p.height,
            p.hdop,
            o.residual_error,
        ));
    }

    line.push_str(LINE_END);
    Ok(line)
}

/// Human-readable one-liner used by the debug echo.
pub fn echo_line(fix: &Fix) -> String {
    let p = fix.position();
    format!(
        "Lon:{:.8} Lat:{:.8} H:{:.3}\tP:{:?} H:{:?} V:{:?} ",
        p.longitude, p.latitude, p.height, p.pdop, p.hdop, p.vdop
    )
}

fn utc(t: OffsetDateTime) -> OffsetDateTime {
    t.to_offset(UtcOffset::UTC)
}
