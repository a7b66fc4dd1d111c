//! Keys, records and filters of the code-space

use serde::{Deserialize, Serialize};

/// Instrument and case name given to imported codes with no known case
pub const UNKNOWN_INSTRUMENT: &str = "unknown";

/// Key of one code: the code string within its code-space partition
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CodeKey {
    /// Code-space partition name
    pub kind: String,

    /// The code itself
    pub name: String,
}

impl CodeKey {
    pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            name: name.into(),
        }
    }
}

/// Persisted payload of a code
///
/// Instrument and case are always stored lowercase; every constructor
/// folds them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRecord {
    pub instrument_name: String,
    pub case_id: String,
    #[serde(default)]
    pub disabled: bool,
}

impl CodeRecord {
    /// An enabled record for the given instrument and case
    pub fn new(instrument_name: &str, case_id: &str) -> Self {
        Self::with_disabled(instrument_name, case_id, false)
    }

    /// A record with an explicit disabled flag
    pub fn with_disabled(instrument_name: &str, case_id: &str, disabled: bool) -> Self {
        Self {
            instrument_name: instrument_name.to_lowercase(),
            case_id: case_id.to_lowercase(),
            disabled,
        }
    }

    /// The record imported codes are stored with
    pub fn unknown() -> Self {
        Self::new(UNKNOWN_INSTRUMENT, UNKNOWN_INSTRUMENT)
    }

    /// Whether this code was imported without a case
    pub fn is_unknown(&self) -> bool {
        self.instrument_name == UNKNOWN_INSTRUMENT
    }

    /// Copy of this record with `disabled` replaced, names re-folded
    pub fn toggled(&self, disabled: bool) -> Self {
        Self::with_disabled(&self.instrument_name, &self.case_id, disabled)
    }
}

/// A record together with the key it is stored under
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCode {
    pub key: CodeKey,
    pub record: CodeRecord,
}

impl StoredCode {
    /// The code string
    pub fn code(&self) -> &str {
        &self.key.name
    }
}

/// Equality filter over one code-space
///
/// Unset fields match everything. Name filters are folded to lowercase
/// to match stored records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeFilter {
    pub kind: String,
    pub instrument_name: Option<String>,
    pub case_id: Option<String>,
    pub disabled: Option<bool>,
}

impl CodeFilter {
    /// Match every code in a code-space
    pub fn kind(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            ..Default::default()
        }
    }

    pub fn with_instrument(mut self, instrument_name: &str) -> Self {
        self.instrument_name = Some(instrument_name.to_lowercase());
        self
    }

    pub fn with_case_id(mut self, case_id: &str) -> Self {
        self.case_id = Some(case_id.to_lowercase());
        self
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = Some(disabled);
        self
    }

    /// Check a stored entry against every set field
    pub fn matches(&self, key: &CodeKey, record: &CodeRecord) -> bool {
        key.kind == self.kind
            && self
                .instrument_name
                .as_ref()
                .map_or(true, |name| *name == record.instrument_name)
            && self
                .case_id
                .as_ref()
                .map_or(true, |case_id| *case_id == record.case_id)
            && self.disabled.map_or(true, |disabled| disabled == record.disabled)
    }
}
