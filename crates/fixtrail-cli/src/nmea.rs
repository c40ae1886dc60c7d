use anyhow::{Context, Result};
use time::{Duration, OffsetDateTime, Time};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use fixtrail_proto::fix::{FixStatus, ObservedFix, Position};
use fixtrail_proto::gps_time::gps_week_tow;

/// Fewer satellites than this cannot give a 3D fix.
const MIN_SATS: u8 = 4;

/// Turns an NMEA log into observed fixes, one per GGA sentence.
pub struct NmeaSource {
    reader: BufReader<File>,
    follow: bool,
    next_index: u32,
    sats_in_view: Option<u8>,
}

impl NmeaSource {
    pub fn file(path: &str, follow: bool) -> Result<Self> {
        let f = std::fs::File::open(path).with_context(|| format!("open nmea file {}", path))?;
        let f = File::from_std(f);
        Ok(Self { reader: BufReader::new(f), follow, next_index: 1, sats_in_view: None })
    }

    /// Next fix, or `None` at end of file unless following.
    pub async fn next_fix(&mut self) -> Result<Option<ObservedFix>> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self.reader.read_line(&mut line).await.context("read nmea")?;
            if n == 0 {
                if !self.follow {
                    return Ok(None);
                }
                // EOF: wait for the file to grow
                tokio::time::sleep(std::time::Duration::from_millis(500)).await;
                continue;
            }

            let Some(body) = sentence_body(line.trim()) else {
                debug!(line = line.trim(), "skipping invalid nmea sentence");
                continue;
            };

            if is_kind(body, "GSV") {
                if let Some(n) = parse_gsv(body) {
                    self.sats_in_view = Some(n);
                }
                continue;
            }

            if is_kind(body, "GGA") {
                match parse_gga(body) {
                    Some(gga) => return Ok(Some(self.observed(gga, OffsetDateTime::now_utc()))),
                    None => warn!(line = line.trim(), "malformed GGA sentence"),
                }
            }
        }
    }

    fn observed(&mut self, gga: Gga, sample_time: OffsetDateTime) -> ObservedFix {
        let index = self.next_index;
        self.next_index += 1;

        let status = if gga.quality == 0 {
            FixStatus::None
        } else if gga.sats < MIN_SATS {
            FixStatus::NotEnoughSats
        } else {
            FixStatus::Valid
        };

        let fix_time = nearest_fix_time(gga.time, sample_time);
        let (gps_week, gps_tow) = gps_week_tow(fix_time);

        ObservedFix {
            index,
            status,
            sats_in_use: gga.sats,
            sats_observed: self.sats_in_view.unwrap_or(gga.sats).max(gga.sats),
            sample_time,
            fix_time,
            gps_week,
            gps_tow,
            position: Position {
                latitude: gga.lat,
                longitude: gga.lon,
                height: gga.alt,
                pdop: 0.0,
                hdop: gga.hdop,
                vdop: 0.0,
            },
            residual_error: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Gga {
    time: Time,
    quality: u8,
    sats: u8,
    hdop: f64,
    lat: f64,
    lon: f64,
    alt: f64,
}

/// GGA only carries a time of day. Picks the previous, same or next day so
/// the result lies closest to `sample_time`.
fn nearest_fix_time(tod: Time, sample_time: OffsetDateTime) -> OffsetDateTime {
    let same_day = sample_time.date().with_time(tod).assume_utc();
    [same_day - Duration::DAY, same_day, same_day + Duration::DAY]
        .into_iter()
        .min_by_key(|t| (*t - sample_time).abs())
        .unwrap_or(same_day)
}

/// Strips `$` and the checksum, returning `None` if the checksum is wrong.
fn sentence_body(s: &str) -> Option<&str> {
    let s = s.strip_prefix('$')?;
    match s.split_once('*') {
        Some((body, sum)) => {
            let want = u8::from_str_radix(sum.trim(), 16).ok()?;
            let got = body.bytes().fold(0u8, |acc, b| acc ^ b);
            (want == got).then_some(body)
        }
        None => Some(s),
    }
}

/// Matches any talker (`GP`, `GN`, `GL`, ...) for the given sentence type.
fn is_kind(body: &str, kind: &str) -> bool {
    body.get(2..5) == Some(kind)
}

// GGA: time, lat, N/S, lon, E/W, quality, sats, hdop, alt, M, ...
fn parse_gga(body: &str) -> Option<Gga> {
    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() < 10 {
        return None;
    }
    let quality: u8 = parts[6].parse().ok()?;
    Some(Gga {
        time: parse_hhmmss(parts[1])?,
        quality,
        sats: parts[7].parse().unwrap_or(0),
        hdop: parts[8].parse().unwrap_or(99.9),
        lat: parse_deg_min(parts[2], parts[3]).unwrap_or(0.0),
        lon: parse_deg_min(parts[4], parts[5]).unwrap_or(0.0),
        alt: parts[9].parse().unwrap_or(0.0),
    })
}

// GSV: total msgs, msg number, sats in view, ...
fn parse_gsv(body: &str) -> Option<u8> {
    body.split(',').nth(3)?.parse().ok()
}

fn parse_hhmmss(v: &str) -> Option<Time> {
    if v.len() < 6 {
        return None;
    }
    let h: u8 = v.get(0..2)?.parse().ok()?;
    let m: u8 = v.get(2..4)?.parse().ok()?;
    let s: f64 = v.get(4..)?.parse().ok()?;
    let ms = ((s.fract() * 1000.0).round() as u16).min(999);
    Time::from_hms_milli(h, m, s.trunc() as u8, ms).ok()
}

fn parse_deg_min(v: &str, hemi: &str) -> Option<f64> {
    if v.is_empty() { return None; }
    // lat: ddmm.mmmm, lon: dddmm.mmmm
    let dot = v.find('.')?;
    let deg_len = if dot > 4 { 3 } else { 2 };
    let deg: f64 = v.get(..deg_len)?.parse().ok()?;
    let min: f64 = v.get(deg_len..)?.parse().ok()?;
    let mut out = deg + (min / 60.0);
    if hemi == "S" || hemi == "W" { out = -out; }
    Some(out)
}
