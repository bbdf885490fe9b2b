use crate::scalars::clean_cell;

/// Historical layout family of an operator's report. Drives which column
/// template and row shape apply downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternVariant {
    Old,
    New,
    Unknown,
}

const SAMPLE_ROWS: usize = 6;

/// Average non-empty cell count at or above which the wider, newer layout is
/// assumed when no keyword signature matched. Empirical.
const WIDE_LAYOUT_THRESHOLD: f64 = 9.0;

/// Decides which layout variant produced the given rows. Never fails:
/// absence of signal is a valid, reportable outcome (`Unknown`).
#[must_use]
pub fn classify_variant(rows: &[Vec<String>]) -> PatternVariant {
    if rows.is_empty() {
        return PatternVariant::Unknown;
    }

    let sample = rows
        .iter()
        .take(SAMPLE_ROWS)
        .map(|row| {
            row.iter()
                .map(|cell| clean_cell(cell).to_uppercase())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n");

    // The newer layout splits day energy and adds a minimum-generation pair.
    if sample.contains("MIN GENERATION")
        || sample.contains("GROSS GEN")
        || sample.contains("NET GEN")
    {
        return PatternVariant::New;
    }
    if sample.contains("DAY ENERGY") {
        return PatternVariant::Old;
    }

    // No header keywords visible; fall back to counting populated cells in
    // data-like rows.
    let widths = rows
        .iter()
        .map(|row| {
            row.iter()
                .filter(|cell| !clean_cell(cell).is_empty())
                .count()
        })
        .filter(|&width| width > 5)
        .collect::<Vec<_>>();

    if widths.is_empty() {
        return PatternVariant::Unknown;
    }

    #[allow(clippy::cast_precision_loss)]
    let average = widths.iter().sum::<usize>() as f64 / widths.len() as f64;
    if average >= WIDE_LAYOUT_THRESHOLD {
        PatternVariant::New
    } else {
        PatternVariant::Old
    }
}
