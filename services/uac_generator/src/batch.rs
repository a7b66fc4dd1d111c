//! Batch generation across the worker pool

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, UacError};
use crate::generator::UacGenerator;

/// What happened to one case in a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum UnitOutcome {
    /// A new code was claimed
    Issued,
    /// The case already had a code
    Skipped,
}

/// Outcome counts of a batch generation call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateSummary {
    pub issued: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl GenerateSummary {
    /// Fold one unit result in, keeping the first error seen
    pub(crate) fn absorb(&mut self, result: Result<UnitOutcome>, first_error: &mut Option<UacError>) {
        match result {
            Ok(UnitOutcome::Issued) => self.issued += 1,
            Ok(UnitOutcome::Skipped) => self.skipped += 1,
            Err(err) => {
                self.failed += 1;
                warn!(error = %err, "UAC generation failed for a case");
                if first_error.is_none() {
                    *first_error = Some(err);
                }
            }
        }
    }

    /// Total units folded in
    pub fn total(&self) -> usize {
        self.issued + self.skipped + self.failed
    }
}

impl UacGenerator {
    /// Issue a code to every case of `instrument` that has none
    ///
    /// Runs one unit per case id on the worker pool and waits for all of
    /// them. Writes of successful units are kept even when another unit
    /// fails; the first error observed is returned.
    pub async fn generate<S: AsRef<str>>(
        &self,
        instrument: &str,
        case_ids: &[S],
    ) -> Result<GenerateSummary> {
        let mut summary = GenerateSummary::default();
        if case_ids.is_empty() {
            return Ok(summary);
        }

        info!(instrument = %instrument, cases = case_ids.len(), "Generating UACs");

        let results = self
            .pool()
            .run(case_ids.iter().map(|id| id.as_ref().to_string()), |case_id| {
                let generator = self.clone();
                let instrument = instrument.to_string();
                async move { generator.generate_for_case(&instrument, &case_id).await }
            })
            .await;

        let mut first_error = None;
        for result in results {
            summary.absorb(result, &mut first_error);
        }

        info!(
            instrument = %instrument,
            issued = summary.issued,
            skipped = summary.skipped,
            failed = summary.failed,
            "UAC generation finished"
        );

        match first_error {
            Some(err) => Err(err),
            None => Ok(summary),
        }
    }

    async fn generate_for_case(&self, instrument: &str, case_id: &str) -> Result<UnitOutcome> {
        if self.exists_for_case(instrument, case_id).await? {
            return Ok(UnitOutcome::Skipped);
        }
        self.allocate(instrument, case_id, 0).await?;
        Ok(UnitOutcome::Issued)
    }
}
