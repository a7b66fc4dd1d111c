//! Survey-metadata source and the instrument-driven generation workflow

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tracing::info;

use crate::codes::Codes;
use crate::error::{CatalogError, UacError};
use crate::generator::UacGenerator;

/// Delivery mode codes are issued for
pub const CAWI_MODE: &str = "CAWI";

/// Delivery modes an instrument is installed with
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentModes(pub Vec<String>);

impl InstrumentModes {
    pub fn new<I, S>(modes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(modes.into_iter().map(Into::into).collect())
    }

    /// Whether the instrument is installed for web interviewing
    pub fn has_cawi(&self) -> bool {
        self.0.iter().any(|mode| mode == CAWI_MODE)
    }
}

/// Source of installed instruments and their cases
#[async_trait]
pub trait InstrumentCatalog: Send + Sync + Debug {
    /// Delivery modes of `instrument`
    async fn instrument_modes(&self, instrument: &str) -> Result<InstrumentModes, CatalogError>;

    /// Case ids of `instrument`
    async fn case_ids(&self, instrument: &str) -> Result<Vec<String>, CatalogError>;
}

impl UacGenerator {
    /// Issue codes to every case of a CAWI instrument and list them
    pub async fn generate_for_instrument<C>(
        &self,
        catalog: &C,
        instrument: &str,
    ) -> Result<Codes, UacError>
    where
        C: InstrumentCatalog + ?Sized,
    {
        let modes = catalog.instrument_modes(instrument).await?;
        if !modes.has_cawi() {
            return Err(UacError::NotCawi {
                instrument: instrument.to_string(),
            });
        }

        let case_ids = catalog.case_ids(instrument).await?;
        info!(instrument = %instrument, cases = case_ids.len(), "Fetched case ids");

        self.generate(instrument, &case_ids).await?;
        self.list_by_instrument(instrument).await
    }
}
