//! Typed issue rows

use crate::types::Severity;

/// Column holding the organization display name
pub const ORG_DISPLAY_NAME: &str = "ORG_DISPLAY_NAME";
/// Column holding the organization public id
pub const ORG_PUBLIC_ID: &str = "ORG_PUBLIC_ID";
/// Column holding the severity literal
pub const ISSUE_SEVERITY: &str = "ISSUE_SEVERITY";
/// Column holding the issue status label
pub const ISSUE_STATUS: &str = "ISSUE_STATUS";

/// Status group used for rows without a status value
pub const UNKNOWN_STATUS: &str = "Unknown";

/// One row of an export chunk
///
/// The grouping fields are parsed into named accessors. Every other column is
/// kept verbatim, in file order, so the row can be written back unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IssueRecord {
    org_display_name: Option<String>,
    org_public_id: Option<String>,
    severity: Option<Severity>,
    status: Option<String>,
    extra: Vec<(String, String)>,
}

impl IssueRecord {
    /// Build a record from `(column, value)` pairs
    ///
    /// A column that appears twice keeps its last value, at the position it
    /// first appeared.
    pub fn from_fields<I>(fields: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut record = IssueRecord::default();
        for (name, value) in fields {
            match name.as_str() {
                ORG_DISPLAY_NAME => record.org_display_name = Some(value),
                ORG_PUBLIC_ID => record.org_public_id = Some(value),
                ISSUE_SEVERITY => record.severity = Some(Severity::parse(&value)),
                ISSUE_STATUS => record.status = Some(value),
                _ => match record.extra.iter_mut().find(|(existing, _)| *existing == name) {
                    Some((_, slot)) => *slot = value,
                    None => record.extra.push((name, value)),
                },
            }
        }
        record
    }

    /// Organization display name; empty when the column was missing
    pub fn org_display_name(&self) -> &str {
        self.org_display_name.as_deref().unwrap_or_default()
    }

    /// Organization public id, if present
    pub fn org_public_id(&self) -> Option<&str> {
        self.org_public_id.as_deref()
    }

    /// Severity; a missing column reads as an unrecognized empty value
    pub fn severity(&self) -> Severity {
        self.severity
            .clone()
            .unwrap_or_else(|| Severity::Unrecognized(String::new()))
    }

    /// Raw status value, if present
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Status group this record belongs to
    ///
    /// The value is taken verbatim; only a missing or empty value falls back
    /// to [`UNKNOWN_STATUS`].
    pub fn status_label(&self) -> &str {
        match self.status.as_deref() {
            Some(status) if !status.is_empty() => status,
            _ => UNKNOWN_STATUS,
        }
    }

    /// Raw value of any column present in the source row
    pub fn get(&self, column: &str) -> Option<&str> {
        match column {
            ORG_DISPLAY_NAME => self.org_display_name.as_deref(),
            ORG_PUBLIC_ID => self.org_public_id.as_deref(),
            ISSUE_SEVERITY => self.severity.as_ref().map(Severity::as_str),
            ISSUE_STATUS => self.status.as_deref(),
            _ => self
                .extra
                .iter()
                .find(|(name, _)| name == column)
                .map(|(_, value)| value.as_str()),
        }
    }

    /// Columns other than the grouping fields, in source order
    pub fn extra_fields(&self) -> &[(String, String)] {
        &self.extra
    }

    /// CVE identifiers
    pub fn cve(&self) -> Option<&str> {
        self.get("CVE")
    }

    /// CWE identifiers
    pub fn cwe(&self) -> Option<&str> {
        self.get("CWE")
    }

    /// Project name
    pub fn project_name(&self) -> Option<&str> {
        self.get("PROJECT_NAME")
    }

    /// Project URL
    pub fn project_url(&self) -> Option<&str> {
        self.get("PROJECT_URL")
    }

    /// Priority score
    pub fn score(&self) -> Option<&str> {
        self.get("SCORE")
    }

    /// Problem title
    pub fn problem_title(&self) -> Option<&str> {
        self.get("PROBLEM_TITLE")
    }

    /// Issue URL
    pub fn issue_url(&self) -> Option<&str> {
        self.get("ISSUE_URL")
    }

    /// Product name
    pub fn product_name(&self) -> Option<&str> {
        self.get("PRODUCT_NAME")
    }

    /// First-introduced timestamp, as exported
    pub fn first_introduced(&self) -> Option<&str> {
        self.get("FIRST_INTRODUCED")
    }
}
