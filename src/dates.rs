use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use tracing::debug;

use crate::document::Page;
use crate::scalars::clean_cell;
use crate::warning::{ExtractWarning, WarningCode};

/// Dates recovered from a report's first page. `report_date` is the
/// authoritative one: the explicit "FOR" date when the filing carries it,
/// else the date of reporting. Every field is independently nullable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportDates {
    pub report_date_for: Option<NaiveDate>,
    pub report_date_of_reporting: Option<NaiveDate>,
    pub reporting_datetime: Option<NaiveDateTime>,
    pub report_date: Option<NaiveDate>,
}

/// Date renderings seen across operator filings, tried in order.
const DATE_FORMATS: &[&str] = &[
    "%d-%b-%Y",
    "%d-%B-%Y",
    "%d-%m-%Y",
    "%Y-%m-%d",
    "%d %b %Y",
    "%d %B %Y",
    "%d-%b-%y",
    "%d-%m-%y",
];

/// A date-shaped run of text, permissive enough to cover every format above.
const DATE_TOKEN: &str = r"\d{1,2}[-/ ][A-Za-z0-9]{1,9}[-/ ]\d{2,4}|\d{4}-\d{2}-\d{2}";

/// Vertical tolerance, in page units, when grouping words into one text band.
const BAND_TOLERANCE: f32 = 12.0;

/// How far past the "date" label to look for its "reporting" qualifier.
const LABEL_WINDOW: usize = 8;

/// How many same-band candidates to the right of the label to try.
const MAX_CANDIDATES: usize = 12;

pub(crate) fn parse_date_token(token: &str) -> Option<NaiveDate> {
    let cleaned = clean_cell(token);
    let trimmed = cleaned.trim_matches(|ch: char| !ch.is_ascii_alphanumeric());
    if trimmed.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

fn parse_time_token(token: &str) -> Option<NaiveTime> {
    let normalized = token.replace('.', ":");
    NaiveTime::parse_from_str(normalized.trim(), "%H:%M").ok()
}

/// How many leading text lines the report banner may occupy.
const BANNER_LINES: usize = 8;

/// Step 1: an explicit "FOR <date>" marker in the report banner, naming the
/// day the data covers. Only the top of the page text is searched; prose
/// further down mentioning "for" some date is not the banner.
fn labeled_for_date(text: &str) -> Option<NaiveDate> {
    let banner = text
        .lines()
        .take(BANNER_LINES)
        .collect::<Vec<_>>()
        .join("\n");
    let pattern = Regex::new(&format!(r"(?i)\bfor\s*[:\-]?\s*({DATE_TOKEN})"))
        .expect("hardcoded for-date regex is valid");
    pattern
        .captures_iter(&banner)
        .find_map(|captures| parse_date_token(&captures[1]))
}

/// Step 2: explicit "DATE OF REPORTING" label in the page text, optionally
/// followed by a filing time.
fn labeled_reporting_date(text: &str) -> Option<(NaiveDate, Option<NaiveTime>)> {
    let pattern = Regex::new(&format!(
        r"(?i)date\s+of\s+reporting\s*[:\-]?\s*({DATE_TOKEN})(?:\s*(?:at)?\s*([0-2]?\d[:.][0-5]\d))?"
    ))
    .expect("hardcoded reporting-date regex is valid");
    let captures = pattern.captures(text)?;
    let date = parse_date_token(captures.get(1)?.as_str())?;
    let time = captures.get(2).and_then(|m| parse_time_token(m.as_str()));
    Some((date, time))
}

/// Step 3: positional scan for when the label and its value are separate
/// text runs. Finds a "date" label word whose nearby context mentions
/// reporting, then tries date-shaped words in the same horizontal band to
/// its right, nearest first, with a time-shaped word further right.
fn banded_reporting_date(page: &Page) -> Option<(NaiveDate, Option<NaiveTime>)> {
    for (index, label) in page.words.iter().enumerate() {
        if !clean_cell(&label.text).eq_ignore_ascii_case("date") {
            continue;
        }
        let window_end = (index + 1 + LABEL_WINDOW).min(page.words.len());
        let qualified = page.words[index + 1..window_end]
            .iter()
            .any(|word| word.text.to_lowercase().contains("reporting"));
        if !qualified {
            continue;
        }

        let mut candidates: Vec<&crate::document::Word> = page
            .words
            .iter()
            .filter(|word| {
                (word.top - label.top).abs() <= BAND_TOLERANCE && word.left > label.left
            })
            .collect();
        candidates.sort_by(|a, b| a.left.total_cmp(&b.left));
        candidates.truncate(MAX_CANDIDATES);

        let mut date = None;
        let mut date_left = 0.0f32;
        for candidate in &candidates {
            if let Some(parsed) = parse_date_token(&candidate.text) {
                date = Some(parsed);
                date_left = candidate.left;
                break;
            }
        }
        if date.is_none() {
            // Dates like "05 Jan 2024" land as separate words; retry over
            // joined runs of three.
            for run in candidates.windows(3) {
                let joined = run
                    .iter()
                    .map(|word| word.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ");
                if let Some(parsed) = parse_date_token(&joined) {
                    date = Some(parsed);
                    date_left = run[2].left;
                    break;
                }
            }
        }
        if let Some(date) = date {
            let time = candidates
                .iter()
                .filter(|word| word.left > date_left)
                .find_map(|word| parse_time_token(&word.text));
            return Some((date, time));
        }
    }
    None
}

/// Step 4: loose fallback, the label phrase followed by any date-shaped
/// token within 200 characters.
fn loose_reporting_date(text: &str) -> Option<NaiveDate> {
    let pattern = Regex::new(&format!(r"(?is)reporting.{{0,200}}?({DATE_TOKEN})"))
        .expect("hardcoded loose reporting-date regex is valid");
    pattern
        .captures_iter(text)
        .find_map(|captures| parse_date_token(&captures[1]))
}

/// Resolves report dates from a report's first page. Each field falls
/// through its own ordered strategies; a fully failed resolution is recorded
/// as a warning, not an error.
pub fn resolve_report_dates(page: &Page, warnings: &mut Vec<ExtractWarning>) -> ReportDates {
    let mut dates = ReportDates {
        report_date_for: labeled_for_date(&page.text),
        ..ReportDates::default()
    };

    if let Some((date, time)) = labeled_reporting_date(&page.text) {
        debug!(%date, "reporting date from labeled text");
        dates.report_date_of_reporting = Some(date);
        dates.reporting_datetime = time.map(|time| date.and_time(time));
    } else if let Some((date, time)) = banded_reporting_date(page) {
        debug!(%date, "reporting date from word-band scan");
        dates.report_date_of_reporting = Some(date);
        dates.reporting_datetime = time.map(|time| date.and_time(time));
    } else if let Some(date) = loose_reporting_date(&page.text) {
        debug!(%date, "reporting date from loose text scan");
        dates.report_date_of_reporting = Some(date);
    }

    dates.report_date = dates.report_date_for.or(dates.report_date_of_reporting);
    if dates.report_date.is_none() {
        warnings.push(
            ExtractWarning::new(
                WarningCode::NotFound,
                "report date could not be resolved from the first page",
            )
            .with_page(page.number),
        );
    }
    dates
}
