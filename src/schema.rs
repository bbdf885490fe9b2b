//! Operator schemas: everything that differs between grid operators lives
//! here as data, so the extraction pipeline itself stays operator-agnostic.

use regex::Regex;

use crate::error::ExtractError;
use crate::pattern::PatternVariant;
use crate::scalars::clean_cell;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Coerced through the null-degrading numeric parser.
    Number,
    /// Kept as cleaned text; blank and dash cells become null.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldSpec {
    pub fn number(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Number,
        }
    }

    pub fn text(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
        }
    }
}

/// Canonical column names and types for one table layout. The first field is
/// always the entity label column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnTemplate {
    pub fields: Vec<FieldSpec>,
}

impl ColumnTemplate {
    pub fn new(fields: Vec<FieldSpec>) -> Self {
        Self { fields }
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.name.as_str()).collect()
    }
}

/// Which part of a row a marker pattern is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerScope {
    FirstCell,
    FullRow,
}

/// A structural row marker (section start, stop, header noise). Patterns are
/// matched case-insensitively against whitespace-normalized text.
#[derive(Debug, Clone)]
pub struct Marker {
    pattern: Regex,
    pub scope: MarkerScope,
}

impl Marker {
    pub fn new(pattern: &str, scope: MarkerScope) -> Result<Self, ExtractError> {
        let pattern = Regex::new(&format!("(?i){pattern}")).map_err(|err| {
            ExtractError::InvalidSchema(format!("bad marker pattern {pattern:?}: {err}"))
        })?;
        Ok(Self { pattern, scope })
    }

    fn first_cell(pattern: &str) -> Self {
        Self::new(pattern, MarkerScope::FirstCell).expect("builtin marker pattern is valid")
    }

    fn full_row(pattern: &str) -> Self {
        Self::new(pattern, MarkerScope::FullRow).expect("builtin marker pattern is valid")
    }

    #[must_use]
    pub fn matches(&self, cells: &[String]) -> bool {
        match self.scope {
            MarkerScope::FirstCell => cells
                .first()
                .is_some_and(|cell| self.pattern.is_match(&clean_cell(cell))),
            MarkerScope::FullRow => {
                let joined = cells
                    .iter()
                    .map(|cell| clean_cell(cell))
                    .collect::<Vec<_>>()
                    .join(" ");
                self.pattern.is_match(&joined)
            }
        }
    }
}

/// One named slice of a sectioned table, opened by any of its start markers.
#[derive(Debug, Clone)]
pub struct SectionSchema {
    pub name: String,
    pub start: Vec<Marker>,
    /// Entities substituted when the document yields no rows for this
    /// section, so downstream consumers always see a stable shape.
    pub template_entities: Vec<String>,
}

/// Variable-shape row layout for sectioned tables.
#[derive(Debug, Clone)]
pub struct RowShape {
    /// Positionally mapped leading fields, entity column first.
    pub fixed: Vec<FieldSpec>,
    pub tail: TailShape,
}

#[derive(Debug, Clone)]
pub enum TailShape {
    /// Remaining cells map positionally onto these fields.
    Positional(Vec<FieldSpec>),
    /// An optional minimum-generation pair probed after the fixed fields,
    /// then energy fields that degrade right-to-left when cells run short.
    ProbedEnergy {
        optional_mw: String,
        optional_hrs: String,
        gross: String,
        net: String,
        avg: String,
    },
}

impl RowShape {
    /// The canonical field list rows tokenized under this shape carry.
    #[must_use]
    pub fn template(&self) -> ColumnTemplate {
        let mut fields = self.fixed.clone();
        match &self.tail {
            TailShape::Positional(tail) => fields.extend(tail.iter().cloned()),
            TailShape::ProbedEnergy {
                optional_mw,
                optional_hrs,
                gross,
                net,
                avg,
            } => {
                fields.push(FieldSpec::number(optional_mw));
                fields.push(FieldSpec::text(optional_hrs));
                fields.push(FieldSpec::number(gross));
                fields.push(FieldSpec::number(net));
                fields.push(FieldSpec::number(avg));
            }
        }
        ColumnTemplate::new(fields)
    }
}

/// A table whose rows carry fixed, template-known columns (state summaries).
#[derive(Debug, Clone)]
pub struct FixedGridSpec {
    /// Snapshot section the table's records land in.
    pub section_name: String,
    /// Declared column layouts per variant. May be empty for generic
    /// tables, whose fields are named from the observed header instead.
    pub templates: Vec<(PatternVariant, ColumnTemplate)>,
    /// Uppercased entity labels accepted from the first column.
    pub entities: Vec<String>,
    /// Abbreviation to canonical label, applied after the allow-list match.
    pub aliases: Vec<(String, String)>,
    /// Scanning stops after this entity (inclusive); rows below it are
    /// footnotes.
    pub cutoff_entity: Option<String>,
    pub template_entities: Vec<String>,
}

/// A table split into marker-delimited sections of variable-width rows.
#[derive(Debug, Clone)]
pub struct SectionedSpec {
    pub sections: Vec<SectionSchema>,
    pub stop: Vec<Marker>,
    /// A closing total row collected into the current section before the
    /// scan stops.
    pub final_total: Option<Marker>,
    /// Header noise interleaved with data rows (repeated on page breaks).
    pub header_filters: Vec<Marker>,
    pub shapes: Vec<(PatternVariant, RowShape)>,
}

impl SectionedSpec {
    /// The row shape for a classified variant, defaulting to the older
    /// layout when the variant is unknown.
    #[must_use]
    pub fn shape_for(&self, variant: PatternVariant) -> Option<&RowShape> {
        pick_variant(&self.shapes, variant)
    }
}

#[derive(Debug, Clone)]
pub enum TableMode {
    FixedGrid(FixedGridSpec),
    Sectioned(SectionedSpec),
}

#[derive(Debug, Clone)]
pub struct TableSchema {
    pub name: String,
    /// Matched against whitespace-stripped, uppercased page words.
    pub heading: Regex,
    /// Keywords that must all appear in a row for it to be the header row.
    /// Used to find where data starts inside a located fixed grid.
    pub header_signature: Vec<String>,
    /// A super-header word (like "STATE") one row above the signature row.
    pub super_header_hint: Option<String>,
    pub mode: TableMode,
}

impl TableSchema {
    /// The template for a classified variant, defaulting to the older layout
    /// when the variant is unknown.
    #[must_use]
    pub fn template_for(&self, variant: PatternVariant) -> Option<ColumnTemplate> {
        match &self.mode {
            TableMode::FixedGrid(grid) => pick_variant(&grid.templates, variant).cloned(),
            TableMode::Sectioned(sectioned) => {
                sectioned.shape_for(variant).map(RowShape::template)
            }
        }
    }
}

fn pick_variant<T>(choices: &[(PatternVariant, T)], variant: PatternVariant) -> Option<&T> {
    let wanted = match variant {
        PatternVariant::Unknown => PatternVariant::Old,
        other => other,
    };
    choices
        .iter()
        .find(|(candidate, _)| *candidate == wanted)
        .map(|(_, choice)| choice)
        .or_else(|| choices.first().map(|(_, choice)| choice))
}

/// Everything the pipeline needs to know about one grid operator's report
/// format.
#[derive(Debug, Clone)]
pub struct OperatorSchema {
    pub operator: String,
    pub tables: Vec<TableSchema>,
}

impl OperatorSchema {
    /// Structural validation, run once before extraction. Catches schema
    /// authoring mistakes early instead of as silent empty output.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.tables.is_empty() {
            return Err(ExtractError::InvalidSchema(format!(
                "operator {:?} declares no tables",
                self.operator
            )));
        }
        for table in &self.tables {
            match &table.mode {
                TableMode::FixedGrid(grid) => {
                    for (_, template) in &grid.templates {
                        validate_template(&table.name, template)?;
                    }
                    if grid.entities.is_empty() {
                        return Err(ExtractError::InvalidSchema(format!(
                            "table {:?} has an empty entity allow-list",
                            table.name
                        )));
                    }
                }
                TableMode::Sectioned(sectioned) => {
                    if sectioned.sections.is_empty() || sectioned.shapes.is_empty() {
                        return Err(ExtractError::InvalidSchema(format!(
                            "table {:?} needs at least one section and one row shape",
                            table.name
                        )));
                    }
                    let mut names: Vec<&str> = sectioned
                        .sections
                        .iter()
                        .map(|section| section.name.as_str())
                        .collect();
                    names.sort_unstable();
                    names.dedup();
                    if names.len() != sectioned.sections.len() {
                        return Err(ExtractError::InvalidSchema(format!(
                            "table {:?} declares duplicate section names",
                            table.name
                        )));
                    }
                    for (_, shape) in &sectioned.shapes {
                        validate_template(&table.name, &shape.template())?;
                    }
                }
            }
        }
        Ok(())
    }

    /// The table whose raw rows feed the layout classifier: the sectioned
    /// table when the operator has one, else the first table.
    #[must_use]
    pub fn variant_reference_table(&self) -> Option<&TableSchema> {
        self.tables
            .iter()
            .find(|table| matches!(table.mode, TableMode::Sectioned(_)))
            .or_else(|| self.tables.first())
    }
}

fn validate_template(table: &str, template: &ColumnTemplate) -> Result<(), ExtractError> {
    if template.fields.len() < 2 {
        return Err(ExtractError::InvalidSchema(format!(
            "table {table:?} template needs an entity column plus data columns"
        )));
    }
    if template.fields[0].kind != FieldKind::Text {
        return Err(ExtractError::InvalidSchema(format!(
            "table {table:?} template must lead with a text entity column"
        )));
    }
    let mut names = template.field_names();
    names.sort_unstable();
    names.dedup();
    if names.len() != template.fields.len() {
        return Err(ExtractError::InvalidSchema(format!(
            "table {table:?} template has duplicate field names"
        )));
    }
    Ok(())
}

fn heading(pattern: &str) -> Regex {
    Regex::new(pattern).expect("builtin heading pattern is valid")
}

fn generation_shapes() -> Vec<(PatternVariant, RowShape)> {
    let fixed = vec![
        FieldSpec::text("station"),
        FieldSpec::number("installed_capacity_mw"),
        FieldSpec::number("peak_1900_mw"),
        FieldSpec::number("offpeak_0300_mw"),
        FieldSpec::number("day_peak_mw"),
        FieldSpec::text("day_peak_hrs"),
    ];
    vec![
        (
            PatternVariant::Old,
            RowShape {
                fixed: fixed.clone(),
                tail: TailShape::Positional(vec![
                    FieldSpec::number("day_energy_mu"),
                    FieldSpec::number("avg_mw"),
                ]),
            },
        ),
        (
            PatternVariant::New,
            RowShape {
                fixed,
                tail: TailShape::ProbedEnergy {
                    optional_mw: "min_generation_mw".to_string(),
                    optional_hrs: "min_generation_hrs".to_string(),
                    gross: "gross_energy_mu".to_string(),
                    net: "net_energy_mu".to_string(),
                    avg: "avg_mw".to_string(),
                },
            },
        ),
    ]
}

/// Schema for the southern regional operator's daily PSP report.
#[must_use]
pub fn southern_region() -> OperatorSchema {
    let state_supply = TableSchema {
        name: "power_supply_position".to_string(),
        heading: heading(r"2\(A\)"),
        header_signature: vec!["THERMAL".into(), "HYDRO".into(), "SOLAR".into()],
        super_header_hint: Some("STATE".to_string()),
        mode: TableMode::FixedGrid(FixedGridSpec {
            section_name: "state_supply".to_string(),
            templates: vec![(
                PatternVariant::Old,
                ColumnTemplate::new(vec![
                    FieldSpec::text("state"),
                    FieldSpec::number("thermal_mu"),
                    FieldSpec::number("hydro_mu"),
                    FieldSpec::number("gas_naptha_diesel_mu"),
                    FieldSpec::number("solar_mu"),
                    FieldSpec::number("wind_mu"),
                    FieldSpec::number("others_mu"),
                    FieldSpec::number("net_schedule_mu"),
                    FieldSpec::number("drawal_mu"),
                    FieldSpec::number("deviation_mu"),
                    FieldSpec::number("availability_mu"),
                    FieldSpec::number("demand_met_mu"),
                    FieldSpec::number("shortage_mu"),
                ]),
            )],
            entities: vec![
                "ANDHRA PRADESH".into(),
                "KARNATAKA".into(),
                "KERALA".into(),
                "TAMIL NADU".into(),
                "TAMILNADU".into(),
                "TELANGANA".into(),
                "PUDUCHERRY".into(),
                "PONDICHERRY".into(),
                "REGION".into(),
            ],
            aliases: vec![
                ("TAMILNADU".into(), "TAMIL NADU".into()),
                ("PONDICHERRY".into(), "PUDUCHERRY".into()),
            ],
            cutoff_entity: Some("REGION".to_string()),
            template_entities: vec![
                "ANDHRA PRADESH".into(),
                "KARNATAKA".into(),
                "KERALA".into(),
                "TAMIL NADU".into(),
                "TELANGANA".into(),
                "PUDUCHERRY".into(),
                "REGION".into(),
            ],
        }),
    };

    let state_demand = TableSchema {
        name: "demand_profile".to_string(),
        heading: heading(r"2\(C\)"),
        header_signature: vec!["MAXIMUM".into(), "DEMAND".into()],
        super_header_hint: Some("STATE".to_string()),
        mode: TableMode::FixedGrid(FixedGridSpec {
            section_name: "state_demand".to_string(),
            templates: vec![(
                PatternVariant::Old,
                ColumnTemplate::new(vec![
                    FieldSpec::text("state"),
                    FieldSpec::number("max_demand_met_mw"),
                    FieldSpec::text("max_demand_time"),
                    FieldSpec::number("shortage_at_max_demand_mw"),
                    FieldSpec::number("max_requirement_mw"),
                    FieldSpec::number("demand_met_at_max_requirement_mw"),
                    FieldSpec::text("max_requirement_time"),
                    FieldSpec::number("shortage_at_max_requirement_mw"),
                    FieldSpec::number("min_demand_met_mw"),
                    FieldSpec::text("min_demand_time"),
                ]),
            )],
            entities: vec![
                "AP".into(),
                "KAR".into(),
                "KER".into(),
                "TN".into(),
                "TG".into(),
                "PONDY".into(),
                "ANDHRA PRADESH".into(),
                "KARNATAKA".into(),
                "KERALA".into(),
                "TAMIL NADU".into(),
                "TELANGANA".into(),
                "PUDUCHERRY".into(),
                "REGION".into(),
            ],
            aliases: vec![
                ("AP".into(), "ANDHRA PRADESH".into()),
                ("KAR".into(), "KARNATAKA".into()),
                ("KER".into(), "KERALA".into()),
                ("TN".into(), "TAMIL NADU".into()),
                ("TG".into(), "TELANGANA".into()),
                ("PONDY".into(), "PUDUCHERRY".into()),
            ],
            cutoff_entity: Some("REGION".to_string()),
            template_entities: vec![
                "ANDHRA PRADESH".into(),
                "KARNATAKA".into(),
                "KERALA".into(),
                "TAMIL NADU".into(),
                "TELANGANA".into(),
                "PUDUCHERRY".into(),
                "REGION".into(),
            ],
        }),
    };

    let generation = TableSchema {
        name: "sector_generation".to_string(),
        heading: heading(r"3\(B\)"),
        header_signature: Vec::new(),
        super_header_hint: None,
        mode: TableMode::Sectioned(SectionedSpec {
            sections: vec![
                SectionSchema {
                    name: "central_sector".to_string(),
                    start: vec![
                        Marker::first_cell(r"^ISGS$"),
                        Marker::full_row(r"CENTRAL\s+SECTOR"),
                    ],
                    template_entities: vec![
                        "NTPC RAMAGUNDAM".into(),
                        "NTPC SIMHADRI".into(),
                        "NTPC TALCHER-II".into(),
                        "NTPC KUDGI".into(),
                        "NLC TPS-II".into(),
                        "NLC TPS-I EXP".into(),
                        "MAPS".into(),
                        "KAIGA".into(),
                        "TOTAL ISGS".into(),
                    ],
                },
                SectionSchema {
                    name: "joint_venture".to_string(),
                    start: vec![Marker::full_row(r"JOINT\s*VENTURE")],
                    template_entities: vec![
                        "NTECL VALLUR".into(),
                        "NTPL TUTICORIN".into(),
                        "TOTAL JV".into(),
                    ],
                },
            ],
            stop: vec![
                Marker::full_row(r"IPP\s+UNDER\s+OPEN\s+ACCESS"),
                Marker::full_row(r"STATE\s+SECTOR"),
                Marker::full_row(r"VOLTAGE\s+PROFILE"),
                Marker::first_cell(r"^4\("),
            ],
            final_total: Some(Marker::first_cell(r"^TOTAL\s+JV")),
            header_filters: vec![
                Marker::full_row(r"STATION\b.*\bCAPACITY"),
                Marker::full_row(r"INST\.?\s*CAPACITY"),
                Marker::full_row(r"PEAK.*OFF\s*-?\s*PEAK"),
            ],
            shapes: generation_shapes(),
        }),
    };

    OperatorSchema {
        operator: "southern_region".to_string(),
        tables: vec![state_supply, state_demand, generation],
    }
}

/// Schema for the northern regional operator's daily PSP report. Same
/// machinery, different column vocabulary and state roster.
#[must_use]
pub fn northern_region() -> OperatorSchema {
    let state_supply = TableSchema {
        name: "power_supply_position".to_string(),
        heading: heading(r"2\(A\)"),
        header_signature: vec!["THERMAL".into(), "HYDRO".into()],
        super_header_hint: Some("STATE".to_string()),
        mode: TableMode::FixedGrid(FixedGridSpec {
            section_name: "state_supply".to_string(),
            templates: vec![(
                PatternVariant::Old,
                ColumnTemplate::new(vec![
                    FieldSpec::text("state"),
                    FieldSpec::number("thermal_mu"),
                    FieldSpec::number("hydro_mu"),
                    FieldSpec::number("gas_naptha_diesel_mu"),
                    FieldSpec::number("solar_mu"),
                    FieldSpec::number("wind_mu"),
                    FieldSpec::number("biomass_others_mu"),
                    FieldSpec::number("total_generation_mu"),
                    FieldSpec::number("schedule_drawal_mu"),
                    FieldSpec::number("actual_drawal_mu"),
                    FieldSpec::number("deviation_mu"),
                    FieldSpec::number("requirement_mu"),
                    FieldSpec::number("shortage_mu"),
                    FieldSpec::number("consumption_mu"),
                ]),
            )],
            entities: vec![
                "DELHI".into(),
                "HARYANA".into(),
                "HIMACHAL PRADESH".into(),
                "J&K(UT) & LADAKH(UT)".into(),
                "PUNJAB".into(),
                "RAJASTHAN".into(),
                "UTTAR PRADESH".into(),
                "UTTARAKHAND".into(),
                "CHANDIGARH".into(),
                "REGION".into(),
            ],
            aliases: Vec::new(),
            cutoff_entity: Some("REGION".to_string()),
            template_entities: vec![
                "DELHI".into(),
                "HARYANA".into(),
                "HIMACHAL PRADESH".into(),
                "J&K(UT) & LADAKH(UT)".into(),
                "PUNJAB".into(),
                "RAJASTHAN".into(),
                "UTTAR PRADESH".into(),
                "UTTARAKHAND".into(),
                "CHANDIGARH".into(),
                "REGION".into(),
            ],
        }),
    };

    let generation = TableSchema {
        name: "sector_generation".to_string(),
        heading: heading(r"3\(B\)"),
        header_signature: Vec::new(),
        super_header_hint: None,
        mode: TableMode::Sectioned(SectionedSpec {
            sections: vec![
                SectionSchema {
                    name: "central_sector".to_string(),
                    start: vec![
                        Marker::first_cell(r"^ISGS$"),
                        Marker::full_row(r"CENTRAL\s+SECTOR"),
                    ],
                    template_entities: vec![
                        "NTPC SINGRAULI".into(),
                        "NTPC RIHAND".into(),
                        "NTPC DADRI".into(),
                        "NTPC UNCHAHAR".into(),
                        "NAPS".into(),
                        "RAPS-B".into(),
                        "TOTAL ISGS".into(),
                    ],
                },
                SectionSchema {
                    name: "joint_venture".to_string(),
                    start: vec![Marker::full_row(r"JOINT\s*VENTURE")],
                    template_entities: vec![
                        "APCPL JHAJJAR".into(),
                        "NPGCL NABINAGAR".into(),
                        "TOTAL JV".into(),
                    ],
                },
            ],
            stop: vec![
                Marker::full_row(r"IPP\s+UNDER\s+OPEN\s+ACCESS"),
                Marker::full_row(r"STATE\s+SECTOR"),
                Marker::first_cell(r"^4\("),
            ],
            final_total: Some(Marker::first_cell(r"^TOTAL\s+JV")),
            header_filters: vec![
                Marker::full_row(r"STATION\b.*\bCAPACITY"),
                Marker::full_row(r"INST\.?\s*CAPACITY"),
            ],
            shapes: generation_shapes(),
        }),
    };

    OperatorSchema {
        operator: "northern_region".to_string(),
        tables: vec![state_supply, generation],
    }
}

/// Looks a built-in operator schema up by name.
#[must_use]
pub fn builtin(name: &str) -> Option<OperatorSchema> {
    match name {
        "southern_region" => Some(southern_region()),
        "northern_region" => Some(northern_region()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{
        ColumnTemplate, FieldSpec, Marker, MarkerScope, builtin, northern_region, southern_region,
    };
    use crate::pattern::PatternVariant;

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn builtin_schemas_validate() {
        southern_region().validate().unwrap();
        northern_region().validate().unwrap();
        assert!(builtin("southern_region").is_some());
        assert!(builtin("western_region").is_none());
    }

    #[test]
    fn first_cell_markers_ignore_later_cells() {
        let marker = Marker::new(r"^ISGS$", MarkerScope::FirstCell).unwrap();
        assert!(marker.matches(&cells(&["isgs", "whatever"])));
        assert!(!marker.matches(&cells(&["NTPC", "ISGS"])));
    }

    #[test]
    fn full_row_markers_span_cells() {
        let marker = Marker::new(r"JOINT\s*VENTURE", MarkerScope::FullRow).unwrap();
        assert!(marker.matches(&cells(&["", "Joint", "Venture"])));
        assert!(!marker.matches(&cells(&["NTPC KUDGI", "2400"])));
    }

    #[test]
    fn variant_picks_matching_shape_and_falls_back_to_old() {
        let schema = southern_region();
        let table = schema.variant_reference_table().unwrap();
        assert_eq!(table.name, "sector_generation");

        let new = table.template_for(PatternVariant::New).unwrap();
        assert!(new.field_names().contains(&"min_generation_mw"));

        let unknown = table.template_for(PatternVariant::Unknown).unwrap();
        assert!(unknown.field_names().contains(&"day_energy_mu"));
        assert!(!unknown.field_names().contains(&"min_generation_mw"));
    }

    #[test]
    fn duplicate_template_fields_are_rejected() {
        let mut schema = southern_region();
        if let super::TableMode::FixedGrid(grid) = &mut schema.tables[0].mode {
            grid.templates[0] = (
                PatternVariant::Old,
                ColumnTemplate::new(vec![
                    FieldSpec::text("state"),
                    FieldSpec::number("thermal_mu"),
                    FieldSpec::number("thermal_mu"),
                ]),
            );
        }
        assert!(schema.validate().is_err());
    }
}
