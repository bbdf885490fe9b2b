#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    /// A heading, marker, or date pattern was absent. Non-fatal; triggers
    /// template fallback downstream.
    NotFound,
    /// Geometry or row shape was present but internally inconsistent, e.g.
    /// a column count far off the declared template.
    Malformed,
    /// Two records carried the same entity key inside one section; the
    /// later one won.
    DuplicateEntity,
    /// The snapshot was emitted without any resolved report date.
    LowConfidence,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractWarning {
    pub code: WarningCode,
    pub message: String,
    pub page: Option<u32>,
    pub table: Option<String>,
    pub section: Option<String>,
}

impl ExtractWarning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            page: None,
            table: None,
            section: None,
        }
    }

    #[must_use]
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    #[must_use]
    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    #[must_use]
    pub fn with_section(mut self, section: impl Into<String>) -> Self {
        self.section = Some(section.into());
        self
    }
}
