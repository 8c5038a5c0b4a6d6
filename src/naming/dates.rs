//! Date resolution
//!
//! One precedence order shared by date-mode folders and image filename prefixes:
//! embedded metadata, then a date in the original filename, then the model's
//! estimate, then the filesystem modification time. First hit wins.

use crate::models::SourceFile;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// `2023-04-01`, `2023_04_01`, `2023.04.01`
static SEPARATED_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[-_.](\d{2})[-_.](\d{2})").expect("valid separated date regex")
});

/// `20230401`, not part of a longer digit run
static COMPACT_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|\D)(\d{4})(\d{2})(\d{2})(?:\D|$)").expect("valid compact date regex")
});

/// Where a resolved date came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DateSource {
    Embedded,
    Filename,
    Inferred,
    Modified,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    pub date: NaiveDate,
    pub source: DateSource,
}

/// Resolve a file's date using the fixed precedence
pub fn resolve_date(file: &SourceFile, inferred: Option<NaiveDate>) -> ResolvedDate {
    if let Some(date) = intrinsic_date(file) {
        return date;
    }
    if let Some(date) = inferred {
        return ResolvedDate {
            date,
            source: DateSource::Inferred,
        };
    }
    ResolvedDate {
        date: file.modified.date_naive(),
        source: DateSource::Modified,
    }
}

/// The dates that outrank model inference: embedded metadata, then filename
pub fn intrinsic_date(file: &SourceFile) -> Option<ResolvedDate> {
    if let Some(date) = file.embedded_date {
        return Some(ResolvedDate {
            date,
            source: DateSource::Embedded,
        });
    }
    date_from_filename(&file.stem()).map(|date| ResolvedDate {
        date,
        source: DateSource::Filename,
    })
}

/// Find a plausible calendar date in a filename stem
pub fn date_from_filename(stem: &str) -> Option<NaiveDate> {
    let from_caps = |caps: regex::Captures<'_>| {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day).filter(|d| is_plausible(*d))
    };

    SEPARATED_DATE
        .captures_iter(stem)
        .find_map(from_caps)
        .or_else(|| COMPACT_DATE.captures_iter(stem).find_map(from_caps))
}

fn is_plausible(date: NaiveDate) -> bool {
    (1900..=2100).contains(&chrono::Datelike::year(&date))
}
