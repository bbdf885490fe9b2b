//! Header reconciliation for fixed-grid tables.
//!
//! The provider often splits a header across two physical rows (a spanning
//! super-header above a per-column row). Reconciliation merges those into
//! one observed name per column, which the pipeline compares against the
//! declared template before mapping cells positionally.

use crate::scalars::clean_cell;
use crate::schema::{ColumnTemplate, FieldSpec};

/// Observed and declared widths further apart than this indicate a layout
/// the template was never written for.
const WIDTH_TOLERANCE: usize = 2;

fn merge_pair(top: &str, bottom: &str) -> String {
    let top = clean_cell(top);
    let bottom = clean_cell(bottom);
    if top.is_empty() {
        return bottom;
    }
    if bottom.is_empty() {
        return top;
    }
    // A bottom label restating its super-header already carries it.
    if bottom.to_uppercase().starts_with(&top.to_uppercase()) {
        bottom
    } else {
        format!("{top} {bottom}")
    }
}

/// Merges up to two header rows into one observed column name per position.
/// Unnamed columns get positional placeholders; a repeated name keeps its
/// first column and drops the later ones (`None`).
#[must_use]
pub fn merge_header_rows(header: &[Vec<String>]) -> Vec<Option<String>> {
    let width = header.iter().map(Vec::len).max().unwrap_or(0);
    let empty = String::new();
    let mut merged = Vec::with_capacity(width);
    for index in 0..width {
        let top = if header.len() > 1 {
            header[0].get(index).unwrap_or(&empty)
        } else {
            &empty
        };
        let bottom = header
            .last()
            .and_then(|row| row.get(index))
            .unwrap_or(&empty);
        let name = merge_pair(top, bottom);
        if name.is_empty() {
            merged.push(format!("col_{index}"));
        } else {
            merged.push(name);
        }
    }

    let mut seen: Vec<String> = Vec::new();
    merged
        .into_iter()
        .map(|name| {
            let key = name.to_uppercase();
            if seen.contains(&key) {
                None
            } else {
                seen.push(key);
                Some(name)
            }
        })
        .collect()
}

/// Lowercased, underscore-separated rendering of an observed header label.
fn canonical_field_name(label: &str) -> String {
    let mut out = String::with_capacity(label.len());
    for ch in label.chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch.to_ascii_lowercase());
        } else if !out.is_empty() && !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_end_matches('_').to_string()
}

/// Builds a template for a grid whose schema declares no explicit one,
/// naming fields from the merged header. The leading column stays the text
/// entity label and every other column is numeric. Columns the merge
/// dropped as duplicates, and labels that canonicalize to an already-used
/// name, fall back to positional placeholders so later cells stay aligned.
#[must_use]
pub fn template_from_header(merged: &[Option<String>]) -> ColumnTemplate {
    let mut names: Vec<String> = Vec::with_capacity(merged.len());
    for (index, name) in merged.iter().enumerate() {
        let candidate = name
            .as_deref()
            .map(canonical_field_name)
            .filter(|name| !name.is_empty() && !names.contains(name));
        names.push(candidate.unwrap_or_else(|| format!("col_{index}")));
    }
    if names.is_empty() {
        names.push("entity".to_string());
    }
    let fields = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| {
            if index == 0 {
                FieldSpec::text(&name)
            } else {
                FieldSpec::number(&name)
            }
        })
        .collect();
    ColumnTemplate::new(fields)
}

/// True when an observed grid is too far from the template to be trusted.
#[must_use]
pub fn width_mismatch(template: &ColumnTemplate, observed_width: usize) -> bool {
    template.fields.len().abs_diff(observed_width) > WIDTH_TOLERANCE
}
