use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;

// IMG_20240501_203015, VID_..., PXL_20240501_203015123.MP, IMG_20240501_203015(1), IMG_..._2
static RE_DEVICE_PREFIX: OnceLock<Regex> = OnceLock::new();
// Screenshot_20240501-203015
static RE_SCREENSHOT: OnceLock<Regex> = OnceLock::new();
// 2024-05-01 20.30.15
static RE_DASHED_DOTTED: OnceLock<Regex> = OnceLock::new();
// 2024-05-01_20-30-15
static RE_DASHED_UNDERSCORE: OnceLock<Regex> = OnceLock::new();
// 1714595415000
static RE_UNIX_MS: OnceLock<Regex> = OnceLock::new();

fn compile(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("filename pattern is a valid regex"))
}

/// Builds a datetime from six numeric capture groups (year through second).
///
/// Returns `None` when the fields do not form a real calendar date and time, so a
/// shape-only match such as month 13 never produces a timestamp.
fn datetime_from_captures(caps: &Captures) -> Option<NaiveDateTime> {
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();
    let year = i32::try_from(field(1)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(field(4)?, field(5)?, field(6)?)
}

/// Recovers the capture time embedded in common camera and phone filenames.
///
/// Patterns are tried in order on the file stem; the first one that matches and
/// yields a valid date and time wins.
pub fn extract_datetime_from_filename(filename: &str) -> Option<NaiveDateTime> {
    let stem = Path::new(filename).file_stem()?.to_str()?;

    let calendar_patterns = [
        compile(
            &RE_DEVICE_PREFIX,
            r"(?i)^(?:IMG|VID|PXL|MVIMG)_(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})\d{0,3}(?:\(\d+\)|_\d+)?(?:\.[a-z]+)*$",
        ),
        compile(
            &RE_SCREENSHOT,
            r"(?i)^Screenshot_(\d{4})(\d{2})(\d{2})-(\d{2})(\d{2})(\d{2})",
        ),
        compile(
            &RE_DASHED_DOTTED,
            r"^(\d{4})-(\d{2})-(\d{2}) (\d{2})\.(\d{2})\.(\d{2})",
        ),
        compile(
            &RE_DASHED_UNDERSCORE,
            r"(\d{4})-(\d{2})-(\d{2})_(\d{2})-(\d{2})-(\d{2})",
        ),
    ];
    for re in calendar_patterns {
        if let Some(dt) = re.captures(stem).and_then(|caps| datetime_from_captures(&caps)) {
            return Some(dt);
        }
    }

    // Exported chat media often uses the unix time in milliseconds, which is UTC.
    let re_unix = compile(&RE_UNIX_MS, r"^(\d{13})$");
    re_unix
        .captures(stem)
        .and_then(|caps| caps[1].parse::<i64>().ok())
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.naive_utc())
}
