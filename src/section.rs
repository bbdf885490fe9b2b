//! Marker-driven section scan for tables whose sections are delimited by
//! label rows rather than geometry.
//!
//! Row classification and the scan loop are separate units: `classify_row`
//! names what a row is, `split_sections` runs the state machine over those
//! events. Stop is terminal; nothing after it is ever collected.

use tracing::trace;

use crate::locate::RawRow;
use crate::schema::SectionedSpec;

/// What one row means to the scan, in evaluation priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowEvent {
    /// A repeated column-header row; skipped wherever it appears.
    Header,
    /// The closing total row of the final section; collected, then the scan
    /// stops.
    FinalTotal,
    /// An unrelated following block begins; terminal.
    Stop,
    /// A section boundary; the marker row itself is never data.
    Start(usize),
    /// Anything else; data while a section is active, noise otherwise.
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    Searching,
    InSection(usize),
    Stopped,
}

/// Classifies one row against a sectioned table's markers.
#[must_use]
pub fn classify_row(spec: &SectionedSpec, row: &RawRow) -> RowEvent {
    if spec
        .header_filters
        .iter()
        .any(|filter| filter.matches(&row.cells))
    {
        return RowEvent::Header;
    }
    if spec
        .final_total
        .as_ref()
        .is_some_and(|total| total.matches(&row.cells))
    {
        return RowEvent::FinalTotal;
    }
    if spec.stop.iter().any(|marker| marker.matches(&row.cells)) {
        return RowEvent::Stop;
    }
    if let Some(section) = spec
        .sections
        .iter()
        .position(|section| section.start.iter().any(|marker| marker.matches(&row.cells)))
    {
        return RowEvent::Start(section);
    }
    RowEvent::Data
}

/// Splits a sectioned table's rows into its declared sections. Sections come
/// back in declaration order, empty when nothing matched.
#[must_use]
pub fn split_sections(spec: &SectionedSpec, rows: &[RawRow]) -> Vec<(String, Vec<RawRow>)> {
    let mut out: Vec<(String, Vec<RawRow>)> = spec
        .sections
        .iter()
        .map(|section| (section.name.clone(), Vec::new()))
        .collect();
    let mut state = ScanState::Searching;

    for row in rows {
        match (state, classify_row(spec, row)) {
            (ScanState::Stopped, _) => break,
            (_, RowEvent::Header) => trace!(?row.cells, "header row filtered"),
            (ScanState::InSection(index), RowEvent::FinalTotal) => {
                out[index].1.push(row.clone());
                state = ScanState::Stopped;
            }
            (_, RowEvent::FinalTotal | RowEvent::Stop) => state = ScanState::Stopped,
            (_, RowEvent::Start(section)) => state = ScanState::InSection(section),
            (ScanState::InSection(index), RowEvent::Data) => out[index].1.push(row.clone()),
            (ScanState::Searching, RowEvent::Data) => {}
        }
    }
    out
}
