use chrono::{NaiveDate, NaiveDateTime};
use serde::ser::{Serialize, SerializeMap, Serializer};

/// One typed cell value. Equality is value-based so full-pipeline idempotence
/// can be asserted directly on records.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<Option<f64>> for Value {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Null, Self::Number)
    }
}

impl From<Option<String>> for Value {
    fn from(value: Option<String>) -> Self {
        value.map_or(Self::Null, Self::Text)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(value) => serializer.serialize_f64(*value),
            Self::Text(text) => serializer.serialize_str(text),
            Self::Null => serializer.serialize_none(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowType {
    Data,
    Total,
}

impl RowType {
    /// TOTAL rows announce themselves in the entity cell.
    #[must_use]
    pub fn from_entity(entity: &str) -> Self {
        if entity.trim().to_uppercase().starts_with("TOTAL") {
            Self::Total
        } else {
            Self::Data
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::Total => "TOTAL",
        }
    }
}

/// Where a record came from within the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    pub page: u32,
    pub table_index: usize,
}

/// A fully typed, field-named representation of one extracted data row.
/// Field order follows the column template that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub entity: String,
    pub fields: Vec<(String, Value)>,
    pub row_type: RowType,
    pub provenance: Provenance,
}

impl CanonicalRecord {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, value)| value)
    }

    #[must_use]
    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(|(name, _)| name.as_str()).collect()
    }
}

impl Serialize for CanonicalRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + 3))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("row_type", self.row_type.as_str())?;
        map.serialize_entry("source_page", &self.provenance.page)?;
        map.serialize_entry("source_table_index", &self.provenance.table_index)?;
        map.end()
    }
}

/// Composite key a persistence collaborator upserts on. Unique per snapshot
/// section; the assembler enforces this.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityKey {
    pub report_date: Option<NaiveDate>,
    pub entity: String,
}

impl EntityKey {
    #[must_use]
    pub fn new(report_date: Option<NaiveDate>, entity: &str) -> Self {
        Self {
            report_date,
            entity: entity.trim().to_uppercase(),
        }
    }
}

/// The complete normalized output for one document.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub report_date: Option<NaiveDate>,
    pub reporting_datetime: Option<NaiveDateTime>,
    /// Set when the snapshot was emitted without any resolved report date.
    pub low_confidence: bool,
    /// Section name to records, in schema declaration order.
    pub sections: Vec<(String, Vec<CanonicalRecord>)>,
}

impl Snapshot {
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&[CanonicalRecord]> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, records)| records.as_slice())
    }

    /// The plain nested value structure handed to export collaborators.
    pub fn to_json_value(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.sections.len() + 3))?;
        map.serialize_entry(
            "report_date",
            &self.report_date.map(|date| date.format("%Y-%m-%d").to_string()),
        )?;
        map.serialize_entry(
            "reporting_datetime",
            &self
                .reporting_datetime
                .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string()),
        )?;
        map.serialize_entry("low_confidence", &self.low_confidence)?;
        for (name, records) in &self.sections {
            map.serialize_entry(name, records)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::{CanonicalRecord, Provenance, RowType, Value};

    fn record() -> CanonicalRecord {
        CanonicalRecord {
            entity: "NTPC KUDGI".to_string(),
            fields: vec![
                ("station".to_string(), Value::Text("NTPC KUDGI".to_string())),
                ("installed_capacity_mw".to_string(), Value::Number(2400.0)),
                ("day_peak_hrs".to_string(), Value::Null),
            ],
            row_type: RowType::Data,
            provenance: Provenance {
                page: 3,
                table_index: 1,
            },
        }
    }

    #[test]
    fn total_rows_are_tagged_from_entity_text() {
        assert_eq!(RowType::from_entity("Total ISGS"), RowType::Total);
        assert_eq!(RowType::from_entity(" total jv"), RowType::Total);
        assert_eq!(RowType::from_entity("NLC TPS-II"), RowType::Data);
    }

    #[test]
    fn serializes_fields_in_declaration_order() {
        let json = serde_json::to_string(&record()).unwrap();
        let station = json.find("station").unwrap();
        let capacity = json.find("installed_capacity_mw").unwrap();
        let row_type = json.find("row_type").unwrap();
        assert!(station < capacity && capacity < row_type);
        assert!(json.contains("\"day_peak_hrs\":null"));
    }

    #[test]
    fn record_equality_is_value_based() {
        assert_eq!(record(), record());
    }
}
