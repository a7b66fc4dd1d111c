//! Error types for code generation and lifecycle operations

use std::fmt;
use thiserror::Error;
use uac_store::StoreError;

/// Result type alias for generator operations
pub type Result<T> = std::result::Result<T, UacError>;

/// Errors returned by [`crate::UacGenerator`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UacError {
    /// Allocation requested for an empty case id
    #[error("cannot generate a UAC for a blank case id")]
    BlankCaseId,

    /// Configured kind names no known code format
    #[error("unknown UAC kind '{kind}'")]
    UnknownFormat {
        /// The configured code-space kind
        kind: String,
    },

    /// Every allocation attempt collided with an existing code
    #[error("could not generate a unique UAC in {attempts} attempts")]
    Exhausted {
        /// Attempt bound that was reached
        attempts: u32,
    },

    /// Import request rejected before anything was written
    #[error(transparent)]
    Import(#[from] ImportError),

    /// Point read of an absent code
    #[error("UAC not found: {code}")]
    NotFound {
        /// The requested code
        code: String,
    },

    /// Case-indexed listing found two codes for one case
    #[error("instrument '{instrument}' has multiple UACs for the same case id")]
    DuplicateCaseIds {
        /// Instrument being listed
        instrument: String,
    },

    /// Instrument is not installed for web interviewing
    #[error("Instrument '{instrument}' is not installed in CAWI mode")]
    NotCawi {
        /// Instrument requested
        instrument: String,
    },

    /// Survey-metadata source failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// A pooled task panicked or was cancelled
    #[error("worker task failed: {0}")]
    Worker(String),

    /// Backing store failed
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl UacError {
    /// Create an unknown-format error
    pub fn unknown_format(kind: impl Into<String>) -> Self {
        UacError::UnknownFormat { kind: kind.into() }
    }

    /// Create a not-found error
    pub fn not_found(code: impl Into<String>) -> Self {
        UacError::NotFound { code: code.into() }
    }

    /// Check if the requested code does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, UacError::NotFound { .. })
    }

    /// Check if the caller's request was at fault
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            UacError::BlankCaseId
                | UacError::Import(_)
                | UacError::NotCawi { .. }
                | UacError::Catalog(CatalogError::InstrumentNotFound { .. })
        )
    }

    /// Map a store read failure, turning absence into [`UacError::NotFound`]
    pub(crate) fn from_read(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { code } => UacError::NotFound { code },
            other => UacError::Store(other),
        }
    }
}

/// Rejected import: malformed codes, codes owned by a real case, or both
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportError {
    /// Codes that failed format validation, in input order
    pub invalid: Vec<String>,

    /// Codes already claimed by a real instrument, in input order
    pub claimed: Vec<String>,
}

impl ImportError {
    pub fn invalid(codes: Vec<String>) -> Self {
        Self {
            invalid: codes,
            claimed: Vec::new(),
        }
    }

    pub fn claimed(codes: Vec<String>) -> Self {
        Self {
            invalid: Vec::new(),
            claimed: codes,
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.invalid.is_empty() || !self.claimed.is_empty()
    }
}

fn quoted(codes: &[String]) -> String {
    codes
        .iter()
        .map(|code| format!("\"{code}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.invalid.is_empty(), self.claimed.is_empty()) {
            (false, true) => write!(
                f,
                "Cannot import UACs because some were invalid: [{}]",
                quoted(&self.invalid)
            ),
            (true, false) => write!(
                f,
                "Cannot import UACs because some were already in use by questionnaires: [{}]",
                quoted(&self.claimed)
            ),
            (false, false) => write!(
                f,
                "Cannot import UACs because some were invalid: [{}] and some UACs were already in use by questionnaires: [{}]",
                quoted(&self.invalid),
                quoted(&self.claimed)
            ),
            (true, true) => Ok(()),
        }
    }
}

impl std::error::Error for ImportError {}

/// Errors from an [`crate::InstrumentCatalog`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Instrument is not installed
    #[error("instrument '{instrument}' not found")]
    InstrumentNotFound {
        /// Instrument requested
        instrument: String,
    },

    /// Catalog could not be reached or answered badly
    #[error("instrument catalog unavailable: {0}")]
    Unavailable(String),
}

impl CatalogError {
    pub fn instrument_not_found(instrument: impl Into<String>) -> Self {
        CatalogError::InstrumentNotFound {
            instrument: instrument.into(),
        }
    }
}
