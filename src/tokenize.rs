//! Row tokenization: turning a row of cell strings into a typed record.
//!
//! Two strategies exist. Fixed-grid rows map cells onto a template
//! positionally. Variable-shape rows (the sector generation table) carry an
//! optional minimum-generation pair whose presence is probed, with rollback
//! when the probe fails, and trailing energy fields that degrade
//! right-to-left when a row runs short.

use crate::locate::RawRow;
use crate::record::{CanonicalRecord, Provenance, RowType, Value};
use crate::scalars::{
    is_time_token, looks_like_entity_text, parse_label_string, parse_number,
};
use crate::schema::{ColumnTemplate, FieldKind, FieldSpec, RowShape, TailShape};

/// Forward-only reader over a row's value cells with checkpointed probing.
struct Cursor<'a> {
    cells: &'a [String],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(cells: &'a [String]) -> Self {
        Self { cells, pos: 0 }
    }

    fn next(&mut self) -> Option<&'a str> {
        let cell = self.cells.get(self.pos)?;
        self.pos += 1;
        Some(cell)
    }

    /// Runs a speculative parse; on `None` the position rolls back to where
    /// the probe started.
    fn probe<T>(&mut self, parse: impl FnOnce(&mut Self) -> Option<T>) -> Option<T> {
        let checkpoint = self.pos;
        let result = parse(self);
        if result.is_none() {
            self.pos = checkpoint;
        }
        result
    }
}

fn parse_cell(kind: FieldKind, token: Option<&str>) -> Value {
    match token {
        None => Value::Null,
        Some(token) => match kind {
            FieldKind::Number => Value::from(parse_number(token)),
            FieldKind::Text => Value::from(parse_label_string(token)),
        },
    }
}

/// Hour cells use "-" or a bare "0" when the station never hit the slot.
fn is_hour_placeholder(token: &str) -> bool {
    matches!(token.trim(), "-" | "--" | "0")
}

fn probe_min_generation(cursor: &mut Cursor) -> Option<(Value, Value)> {
    cursor.probe(|cursor| {
        // The MW candidate is the first numeric-shaped token; placeholder
        // dashes ahead of it are stepped over.
        let megawatts = loop {
            if let Some(value) = parse_number(cursor.next()?) {
                break value;
            }
        };
        let hours = cursor.next()?;
        if is_hour_placeholder(hours) {
            Some((Value::Number(megawatts), Value::Null))
        } else if is_time_token(hours) {
            Some((Value::Number(megawatts), Value::Text(hours.to_string())))
        } else {
            None
        }
    })
}

fn consume_fixed(cursor: &mut Cursor, fields: &[FieldSpec], out: &mut Vec<(String, Value)>) {
    for field in fields {
        out.push((field.name.clone(), parse_cell(field.kind, cursor.next())));
    }
}

/// Tokenizes one variable-shape row. The entity label is not assumed to sit
/// in column 0; the first entity-looking cell is taken, so grids with a
/// leading filler column still tokenize. Returns `None` for rows with no
/// entity label at all (stray numeric fragments, blank spacers).
#[must_use]
pub fn tokenize_sectioned_row(row: &RawRow, shape: &RowShape) -> Option<CanonicalRecord> {
    let entity_index = row
        .cells
        .iter()
        .position(|cell| looks_like_entity_text(cell))?;
    let entity = row.cells[entity_index].clone();

    // Providers emit empty filler cells between real values; the shape only
    // sees the populated ones.
    let values: Vec<String> = row.cells[entity_index + 1..]
        .iter()
        .filter(|cell| !cell.is_empty())
        .cloned()
        .collect();
    let mut cursor = Cursor::new(&values);

    let mut fields: Vec<(String, Value)> = Vec::with_capacity(shape.template().fields.len());
    fields.push((shape.fixed[0].name.clone(), Value::Text(entity.clone())));
    consume_fixed(&mut cursor, &shape.fixed[1..], &mut fields);

    match &shape.tail {
        TailShape::Positional(tail) => consume_fixed(&mut cursor, tail, &mut fields),
        TailShape::ProbedEnergy {
            optional_mw,
            optional_hrs,
            gross,
            net,
            avg,
        } => {
            let (min_mw, min_hrs) = probe_min_generation(&mut cursor)
                .map_or((Value::Null, Value::Null), |pair| pair);
            fields.push((optional_mw.clone(), min_mw));
            fields.push((optional_hrs.clone(), min_hrs));

            // Only numeric tokens hold energy figures; dashes and stray
            // text in the tail are skipped so placeholders never shift a
            // real value into the wrong column. Short rows lose their
            // leftmost energy columns first: totals and partial rows always
            // keep the net figure.
            let mut energies: Vec<f64> = Vec::with_capacity(3);
            while let Some(token) = cursor.next() {
                if let Some(value) = parse_number(token) {
                    energies.push(value);
                }
            }
            let (gross_value, net_value, avg_value) = match energies[..] {
                [] => (Value::Null, Value::Null, Value::Null),
                [net] => (Value::Null, Value::Number(net), Value::Null),
                [gross, net] => (Value::Number(gross), Value::Number(net), Value::Null),
                [gross, net, avg, ..] => (
                    Value::Number(gross),
                    Value::Number(net),
                    Value::Number(avg),
                ),
            };
            fields.push((gross.clone(), gross_value));
            fields.push((net.clone(), net_value));
            fields.push((avg.clone(), avg_value));
        }
    }

    Some(CanonicalRecord {
        row_type: RowType::from_entity(&entity),
        entity,
        fields,
        provenance: Provenance {
            page: row.page,
            table_index: row.table_index,
        },
    })
}

/// Tokenizes one fixed-grid row against its template. The caller has already
/// matched and canonicalized the entity; cells map by grid position, so an
/// empty cell is a null value in its own column and never shifts its
/// neighbors. Missing trailing cells become nulls too.
#[must_use]
pub fn tokenize_fixed_row(
    row: &RawRow,
    template: &ColumnTemplate,
    entity: String,
) -> CanonicalRecord {
    let mut fields: Vec<(String, Value)> = Vec::with_capacity(template.fields.len());
    fields.push((template.fields[0].name.clone(), Value::Text(entity.clone())));
    for (index, field) in template.fields.iter().enumerate().skip(1) {
        let token = row.cells.get(index).map(String::as_str);
        fields.push((field.name.clone(), parse_cell(field.kind, token)));
    }
    CanonicalRecord {
        row_type: RowType::from_entity(&entity),
        entity,
        fields,
        provenance: Provenance {
            page: row.page,
            table_index: row.table_index,
        },
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{tokenize_fixed_row, tokenize_sectioned_row};
    use crate::locate::RawRow;
    use crate::pattern::PatternVariant;
    use crate::record::{RowType, Value};
    use crate::schema::{TableMode, southern_region};

    fn row(cells: &[&str]) -> RawRow {
        RawRow {
            page: 3,
            table_index: 0,
            cells: cells.iter().map(ToString::to_string).collect(),
        }
    }

    fn shape(variant: PatternVariant) -> crate::schema::RowShape {
        let schema = southern_region();
        let table = schema
            .tables
            .into_iter()
            .find(|table| table.name == "sector_generation")
            .unwrap();
        match table.mode {
            TableMode::Sectioned(spec) => spec
                .shapes
                .into_iter()
                .find(|(candidate, _)| *candidate == variant)
                .unwrap()
                .1,
            TableMode::FixedGrid(_) => unreachable!(),
        }
    }

    fn number(record: &crate::record::CanonicalRecord, name: &str) -> Option<f64> {
        record.field(name).unwrap().as_number()
    }

    #[test]
    fn full_new_layout_row_with_min_generation() {
        let shape = shape(PatternVariant::New);
        let record = tokenize_sectioned_row(
            &row(&[
                "NTPC KUDGI", "2400", "2100", "1800", "2150", "19:15", "1200", "03:40", "48.2",
                "45.1", "1880",
            ]),
            &shape,
        )
        .unwrap();

        assert_eq!(record.entity, "NTPC KUDGI");
        assert_eq!(record.row_type, RowType::Data);
        assert_eq!(number(&record, "installed_capacity_mw"), Some(2400.0));
        assert_eq!(number(&record, "min_generation_mw"), Some(1200.0));
        assert_eq!(
            record.field("min_generation_hrs").unwrap(),
            &Value::Text("03:40".to_string())
        );
        assert_eq!(number(&record, "gross_energy_mu"), Some(48.2));
        assert_eq!(number(&record, "net_energy_mu"), Some(45.1));
        assert_eq!(number(&record, "avg_mw"), Some(1880.0));
    }

    #[test]
    fn keys_match_the_template_exactly_and_in_order() {
        let shape = shape(PatternVariant::New);
        let record = tokenize_sectioned_row(
            &row(&["MAPS", "440", "410", "400", "415", "12:00", "390", "02:10", "9.8", "9.1", "405"]),
            &shape,
        )
        .unwrap();
        assert_eq!(record.field_names(), shape.template().field_names());
    }

    #[test]
    fn probe_rolls_back_when_min_generation_is_absent() {
        // A total row under the new layout: no min-generation pair, so the
        // three tokens after the fixed fields are the energies.
        let shape = shape(PatternVariant::New);
        let record = tokenize_sectioned_row(
            &row(&["TOTAL ISGS", "2840", "2510", "2200", "2565", "19:15", "58.0", "54.2", "2285"]),
            &shape,
        )
        .unwrap();

        assert_eq!(record.row_type, RowType::Total);
        assert!(record.field("min_generation_mw").unwrap().is_null());
        assert!(record.field("min_generation_hrs").unwrap().is_null());
        assert_eq!(number(&record, "gross_energy_mu"), Some(58.0));
        assert_eq!(number(&record, "net_energy_mu"), Some(54.2));
        assert_eq!(number(&record, "avg_mw"), Some(2285.0));
    }

    #[test]
    fn dashed_out_min_generation_pair_leaves_energies_in_place() {
        // Totals render the absent pair as dashes; the energies must not
        // slide left into the gross and net slots.
        let shape = shape(PatternVariant::New);
        let record = tokenize_sectioned_row(
            &row(&[
                "TOTAL ISGS", "2840", "2510", "2200", "2565", "19:15", "-", "-", "58.0", "54.2",
                "2285",
            ]),
            &shape,
        )
        .unwrap();

        assert!(record.field("min_generation_mw").unwrap().is_null());
        assert!(record.field("min_generation_hrs").unwrap().is_null());
        assert_eq!(number(&record, "gross_energy_mu"), Some(58.0));
        assert_eq!(number(&record, "net_energy_mu"), Some(54.2));
        assert_eq!(number(&record, "avg_mw"), Some(2285.0));
    }

    #[test]
    fn min_generation_probe_steps_over_a_leading_dash() {
        let shape = shape(PatternVariant::New);
        let record = tokenize_sectioned_row(
            &row(&[
                "NTPC KUDGI", "2400", "2100", "1800", "2150", "19:15", "-", "1200", "03:40",
                "48.2", "45.1", "1880",
            ]),
            &shape,
        )
        .unwrap();

        assert_eq!(number(&record, "min_generation_mw"), Some(1200.0));
        assert_eq!(
            record.field("min_generation_hrs").unwrap(),
            &Value::Text("03:40".to_string())
        );
        assert_eq!(number(&record, "gross_energy_mu"), Some(48.2));
        assert_eq!(number(&record, "avg_mw"), Some(1880.0));
    }

    #[test]
    fn zero_min_generation_with_placeholder_hour_is_kept() {
        let shape = shape(PatternVariant::New);
        let record = tokenize_sectioned_row(
            &row(&["KAIGA", "880", "850", "840", "860", "10:05", "0", "-", "20.1", "19.5", "845"]),
            &shape,
        )
        .unwrap();
        assert_eq!(number(&record, "min_generation_mw"), Some(0.0));
        assert!(record.field("min_generation_hrs").unwrap().is_null());
        assert_eq!(number(&record, "gross_energy_mu"), Some(20.1));
    }

    #[test]
    fn short_rows_degrade_energies_right_to_left() {
        let shape = shape(PatternVariant::New);

        let two = tokenize_sectioned_row(
            &row(&["NLC TPS-II", "1470", "1100", "900", "1150", "18:45", "30.2", "28.0"]),
            &shape,
        )
        .unwrap();
        assert_eq!(number(&two, "gross_energy_mu"), Some(30.2));
        assert_eq!(number(&two, "net_energy_mu"), Some(28.0));
        assert!(two.field("avg_mw").unwrap().is_null());

        let one = tokenize_sectioned_row(
            &row(&["NLC TPS-II", "1470", "1100", "900", "1150", "18:45", "28.0"]),
            &shape,
        )
        .unwrap();
        assert!(one.field("gross_energy_mu").unwrap().is_null());
        assert_eq!(number(&one, "net_energy_mu"), Some(28.0));
        assert!(one.field("avg_mw").unwrap().is_null());

        let none = tokenize_sectioned_row(
            &row(&["NLC TPS-II", "1470", "1100", "900", "1150", "18:45"]),
            &shape,
        )
        .unwrap();
        assert!(none.field("gross_energy_mu").unwrap().is_null());
        assert!(none.field("net_energy_mu").unwrap().is_null());
        assert!(none.field("avg_mw").unwrap().is_null());
    }

    #[test]
    fn old_layout_maps_day_energy_positionally() {
        let shape = shape(PatternVariant::Old);
        let record = tokenize_sectioned_row(
            &row(&["NTPC RAMAGUNDAM", "2600", "2450", "2300", "2480", "20:30", "57.5", "2395"]),
            &shape,
        )
        .unwrap();
        assert_eq!(number(&record, "day_energy_mu"), Some(57.5));
        assert_eq!(number(&record, "avg_mw"), Some(2395.0));
        assert!(record.field("day_peak_hrs").unwrap().as_text() == Some("20:30"));
    }

    #[test]
    fn dashes_and_blanks_become_nulls() {
        let shape = shape(PatternVariant::Old);
        let record = tokenize_sectioned_row(
            &row(&["MAPS", "440", "-", "", "415", "380", "-", "9.8", "405"]),
            &shape,
        )
        .unwrap();
        assert!(record.field("peak_1900_mw").unwrap().is_null());
        assert!(record.field("day_peak_hrs").unwrap().is_null());
        // The empty cell is filler, not a value: later cells shift left.
        assert_eq!(number(&record, "offpeak_0300_mw"), Some(415.0));
    }

    #[test]
    fn entity_cell_is_found_past_a_filler_column() {
        let shape = shape(PatternVariant::Old);
        let record = tokenize_sectioned_row(
            &row(&["", "KAIGA", "880", "850", "840", "860", "10:05", "20.1", "855"]),
            &shape,
        )
        .unwrap();
        assert_eq!(record.entity, "KAIGA");
        assert_eq!(number(&record, "installed_capacity_mw"), Some(880.0));
    }

    #[test]
    fn rows_without_an_entity_label_are_rejected() {
        let shape = shape(PatternVariant::New);
        assert!(tokenize_sectioned_row(&row(&["1,234.5", "99"]), &shape).is_none());
        assert!(tokenize_sectioned_row(&row(&["", "99"]), &shape).is_none());
    }

    #[test]
    fn empty_grid_cells_stay_in_their_own_columns() {
        let schema = southern_region();
        let template = schema.tables[0]
            .template_for(PatternVariant::Old)
            .unwrap();
        let record = tokenize_fixed_row(
            &row(&[
                "KARNATAKA", "95.0", "", "0.0", "40.2", "22.1", "2.0", "30.5", "31.0", "0.5",
                "208.1", "208.1", "0.0",
            ]),
            &template,
            "KARNATAKA".to_string(),
        );
        assert!(record.field("hydro_mu").unwrap().is_null());
        assert_eq!(number(&record, "gas_naptha_diesel_mu"), Some(0.0));
        assert_eq!(number(&record, "solar_mu"), Some(40.2));
        assert_eq!(number(&record, "shortage_mu"), Some(0.0));
    }

    #[test]
    fn fixed_rows_pad_missing_trailing_cells_with_nulls() {
        let schema = southern_region();
        let template = schema.tables[0]
            .template_for(PatternVariant::Old)
            .unwrap();
        let record = tokenize_fixed_row(
            &row(&["Karnataka", "210.4", "95.2", "10.1", "55.0"]),
            &template,
            "KARNATAKA".to_string(),
        );
        assert_eq!(record.entity, "KARNATAKA");
        assert_eq!(number(&record, "thermal_mu"), Some(210.4));
        assert_eq!(number(&record, "solar_mu"), Some(55.0));
        assert!(record.field("shortage_mu").unwrap().is_null());
        assert_eq!(record.field_names(), template.field_names());
    }
}
