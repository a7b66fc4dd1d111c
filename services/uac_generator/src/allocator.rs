//! Collision-resolving allocation and the per-case precheck

use tracing::debug;
use uac_store::CodeRecord;

use crate::error::{Result, UacError};
use crate::format::CodeFormat;
use crate::generator::UacGenerator;

fn candidate(format: CodeFormat) -> String {
    format.generate(&mut rand::thread_rng())
}

impl UacGenerator {
    /// Claim a fresh code for `(instrument, case_id)`
    ///
    /// Each attempt draws a new candidate and inserts it if absent. A
    /// collision moves to the next attempt; any other store error is
    /// returned as-is. Attempts run from `attempt` up to `max_attempts`.
    pub async fn allocate(&self, instrument: &str, case_id: &str, attempt: u32) -> Result<String> {
        if case_id.is_empty() {
            return Err(UacError::BlankCaseId);
        }
        let format = self.format()?;
        let record = CodeRecord::new(instrument, case_id);
        let max_attempts = self.settings().max_attempts;

        for attempt in attempt..max_attempts {
            let code = candidate(format);
            match self
                .store()
                .insert_if_absent(&self.code_key(&code), record.clone())
                .await
            {
                Ok(()) => {
                    debug!(instrument = %record.instrument_name, case_id = %record.case_id, attempt, "Allocated UAC");
                    return Ok(code);
                }
                Err(e) if e.is_already_exists() => {
                    debug!(attempt, "UAC collision, retrying with a new candidate");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(UacError::Exhausted {
            attempts: max_attempts,
        })
    }

    /// Whether `(instrument, case_id)` already holds a code
    pub async fn exists_for_case(&self, instrument: &str, case_id: &str) -> Result<bool> {
        let filter = self.instrument_filter(instrument).with_case_id(case_id);
        Ok(!self.store().scan(&filter).await?.is_empty())
    }
}
