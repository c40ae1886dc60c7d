use std::path::Path;
use std::time::Duration;

use fixtrail_log::format::{format_record, header_line};
use fixtrail_log::{Fix, FixLog, FixStatus, ObservedFix, Position, WriterConfig, WriterState};
use time::macros::datetime;
use time::Duration as TimeDuration;

const POLL_MS: u64 = 20;

fn cfg() -> WriterConfig {
    WriterConfig { poll_interval_ms: POLL_MS, debug: false }
}

fn fix(index: u32) -> Fix {
    let sample = datetime!(2021-01-01 0:00 UTC) + TimeDuration::seconds(index as i64);
    let status = if index % 3 == 0 { FixStatus::NotEnoughSats } else { FixStatus::Valid };
    Fix::Observed(ObservedFix {
        index,
        status,
        sats_in_use: 8,
        sats_observed: 9,
        sample_time: sample,
        fix_time: sample + TimeDuration::milliseconds(400),
        gps_week: 2138,
        gps_tow: 432018.0 + index as f64,
        position: Position {
            latitude: 45.0 + index as f64 * 1e-5,
            longitude: 9.0,
            height: 120.5,
            pdop: 1.8,
            hdop: 1.2,
            vdop: 1.3,
        },
        residual_error: 0.3,
    })
}

fn expected(fixes: &[Fix]) -> String {
    let mut s = header_line();
    for f in fixes {
        s.push_str(&format_record(f).unwrap());
    }
    s
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(POLL_MS * 10)).await;
}

#[tokio::test]
async fn test_submitted_fixes_appear_within_poll_interval() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    let log = FixLog::open(&path, &cfg()).await.unwrap();

    let fixes: Vec<Fix> = (1..=5).map(fix).collect();
    for f in &fixes {
        log.submit(f.clone()).unwrap();
    }
    settle().await;

    assert_eq!(read(&path), expected(&fixes));
    assert_eq!(log.state(), WriterState::Running);

    log.request_stop();
    log.join().await.unwrap();
}

#[tokio::test]
async fn test_file_is_always_prefix_of_submissions() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    let log = FixLog::open(&path, &cfg()).await.unwrap();

    let fixes: Vec<Fix> = (1..=40).map(fix).collect();
    for (i, f) in fixes.iter().enumerate() {
        log.submit(f.clone()).unwrap();
        if i % 4 == 0 {
            tokio::time::sleep(Duration::from_millis(POLL_MS / 2)).await;
            // A rewrite may be in progress; only complete lines are checked.
            let text = read(&path);
            let full = expected(&fixes);
            let complete = match text.rfind("\r\n") {
                Some(end) => &text[..end + 2],
                None => "",
            };
            assert!(full.starts_with(complete));
        }
    }

    log.request_stop();
    log.join().await.unwrap();
    assert_eq!(read(&path), expected(&fixes));
}

#[tokio::test]
async fn test_unchanged_buffer_does_not_rewrite() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    let log = FixLog::open(&path, &cfg()).await.unwrap();

    log.submit(fix(1)).unwrap();
    settle().await;
    let first = std::fs::read(&path).unwrap();
    let modified = std::fs::metadata(&path).unwrap().modified().unwrap();

    settle().await;
    assert_eq!(std::fs::read(&path).unwrap(), first);
    assert_eq!(std::fs::metadata(&path).unwrap().modified().unwrap(), modified);

    log.request_stop();
    log.join().await.unwrap();
}

#[tokio::test]
async fn test_stop_flushes_everything_submitted_before_it() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    // Long interval: only the final pass can pick these up.
    let log = FixLog::open(&path, &WriterConfig { poll_interval_ms: 60_000, debug: false }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    let fixes: Vec<Fix> = (1..=7).map(fix).collect();
    for f in &fixes {
        log.submit(f.clone()).unwrap();
    }
    assert_eq!(read(&path), header_line());

    log.request_stop();
    assert_ne!(log.state(), WriterState::Running);
    log.join().await.unwrap();

    let settled = read(&path);
    assert_eq!(settled, expected(&fixes));

    settle().await;
    assert_eq!(read(&path), settled);
}

#[tokio::test]
async fn test_state_reaches_terminated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    let log = FixLog::open(&path, &cfg()).await.unwrap();
    assert_eq!(log.state(), WriterState::Running);

    log.request_stop();
    let mut state = log.state();
    for _ in 0..100 {
        if state == WriterState::Terminated {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        state = log.state();
    }
    assert_eq!(state, WriterState::Terminated);

    // Nothing was submitted, so the header written at open is untouched.
    assert_eq!(read(&path), header_line());
}

#[tokio::test]
async fn test_drop_with_live_runtime_performs_final_flush() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    let log = FixLog::open(&path, &WriterConfig { poll_interval_ms: 60_000, debug: false }).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;

    log.submit(fix(1)).unwrap();
    log.submit(fix(2)).unwrap();
    drop(log);
    settle().await;

    assert_eq!(read(&path), expected(&[fix(1), fix(2)]));
}

#[test]
fn test_join_flushes_before_runtime_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();

    let log = rt
        .block_on(FixLog::open(&path, &WriterConfig { poll_interval_ms: 60_000, debug: false }))
        .unwrap();
    log.submit(fix(1)).unwrap();
    log.submit(fix(2)).unwrap();
    log.request_stop();
    rt.block_on(log.join()).unwrap();
    drop(rt);

    assert_eq!(read(&path), expected(&[fix(1), fix(2)]));
}

#[tokio::test]
async fn test_non_valid_lines_are_truncated() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("track.txt");
    let log = FixLog::open(&path, &cfg()).await.unwrap();

    log.submit(fix(2)).unwrap();
    log.submit(fix(3)).unwrap();
    log.request_stop();
    log.join().await.unwrap();

    let text = read(&path);
    let lines: Vec<&str> = text.split("\r\n").collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(lines[1].len(), 155);
    assert_eq!(lines[2], "    3  NotEnoughSats   8/9  21/01/01  00:00:03.000");
    assert_eq!(lines[3], "");
}
