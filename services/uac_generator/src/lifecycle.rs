//! Enable/disable, lookups, listings and administrative operations

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uac_store::{CodeFilter, CodeRecord, StoredCode};

use crate::codes::{chunk_code, CodeInfo, Codes};
use crate::error::{Result, UacError};
use crate::generator::UacGenerator;

/// Outcome of a bulk enable or disable
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkToggleSummary {
    /// Codes whose flag was written
    pub updated: usize,
    /// Requested codes that do not exist, in input order
    pub missing: Vec<String>,
}

enum Toggle {
    Updated,
    Missing(usize, String),
}

/// First error wins; every error is logged
fn first_error<T>(results: Vec<Result<T>>, context: &str) -> (Vec<T>, Option<UacError>) {
    let mut values = Vec::with_capacity(results.len());
    let mut first = None;
    for result in results {
        match result {
            Ok(value) => values.push(value),
            Err(err) => {
                warn!(error = %err, "{} failed", context);
                if first.is_none() {
                    first = Some(err);
                }
            }
        }
    }
    (values, first)
}

impl UacGenerator {
    /// Mark a code disabled
    pub async fn disable(&self, code: &str) -> Result<()> {
        self.set_disabled(code, true).await
    }

    /// Mark a code enabled
    pub async fn enable(&self, code: &str) -> Result<()> {
        self.set_disabled(code, false).await
    }

    async fn set_disabled(&self, code: &str, disabled: bool) -> Result<()> {
        let key = self.code_key(code);
        let record = self
            .store()
            .get(&key)
            .await
            .map_err(UacError::from_read)?;
        self.store()
            .update(&key, record.toggled(disabled))
            .await
            .map_err(UacError::from_read)
    }

    /// Enable or disable many codes, reporting the ones that do not exist
    pub async fn set_disabled_many<S: AsRef<str>>(
        &self,
        codes: &[S],
        disabled: bool,
    ) -> Result<BulkToggleSummary> {
        let units = codes
            .iter()
            .map(|code| code.as_ref().to_string())
            .enumerate();
        let results = self
            .pool()
            .run(units, |(index, code)| {
                let generator = self.clone();
                async move {
                    match generator.set_disabled(&code, disabled).await {
                        Ok(()) => Ok(Toggle::Updated),
                        Err(e) if e.is_not_found() => Ok(Toggle::Missing(index, code)),
                        Err(e) => Err(e),
                    }
                }
            })
            .await;

        let (toggles, first) = first_error(results, "UAC toggle");
        if let Some(err) = first {
            return Err(err);
        }

        let mut summary = BulkToggleSummary::default();
        let mut missing = Vec::new();
        for toggle in toggles {
            match toggle {
                Toggle::Updated => summary.updated += 1,
                Toggle::Missing(index, code) => missing.push((index, code)),
            }
        }
        missing.sort_unstable();
        summary.missing = missing.into_iter().map(|(_, code)| code).collect();

        info!(
            disabled,
            updated = summary.updated,
            missing = summary.missing.len(),
            "Bulk UAC toggle finished"
        );
        Ok(summary)
    }

    /// Look up one code
    pub async fn get(&self, code: &str) -> Result<CodeInfo> {
        let record = self
            .store()
            .get(&self.code_key(code))
            .await
            .map_err(UacError::from_read)?;
        let mut info = CodeInfo::from(record);
        info.uac_chunks = chunk_code(code);
        Ok(info)
    }

    /// Every code of `instrument`, keyed by code
    pub async fn list_by_instrument(&self, instrument: &str) -> Result<Codes> {
        let stored = self.store().scan(&self.instrument_filter(instrument)).await?;
        let mut codes: Codes = stored
            .into_iter()
            .map(|StoredCode { key, record }| (key.name, CodeInfo::from(record)))
            .collect();
        codes.build_chunks();
        Ok(codes)
    }

    /// Every code of `instrument`, keyed by case id
    ///
    /// Fails rather than drop an entry if two codes share a case id.
    pub async fn list_by_case_id(&self, instrument: &str) -> Result<Codes> {
        self.list_keyed_by_case(instrument, self.instrument_filter(instrument))
            .await
    }

    /// Disabled codes of `instrument`, keyed by case id
    pub async fn list_disabled(&self, instrument: &str) -> Result<Codes> {
        let filter = self.instrument_filter(instrument).with_disabled(true);
        self.list_keyed_by_case(instrument, filter).await
    }

    async fn list_keyed_by_case(&self, instrument: &str, filter: CodeFilter) -> Result<Codes> {
        let stored = self.store().scan(&filter).await?;
        let mut codes = Codes::new();
        for StoredCode { key, record } in stored {
            let case_id = record.case_id.clone();
            let info = CodeInfo::from(record).with_full_uac(key.name);
            if codes.insert(case_id, info).is_some() {
                return Err(UacError::DuplicateCaseIds {
                    instrument: instrument.to_string(),
                });
            }
        }
        codes.build_chunks();
        Ok(codes)
    }

    /// Number of codes held by `instrument`
    pub async fn count(&self, instrument: &str) -> Result<usize> {
        Ok(self.store().count(&self.instrument_filter(instrument)).await?)
    }

    /// Distinct instrument names holding codes, sorted
    pub async fn instruments(&self) -> Result<Vec<String>> {
        Ok(self.store().distinct_instruments(self.kind()).await?)
    }

    /// Delete every code of `instrument`
    ///
    /// Keys are deleted in chunks of `max_concurrent`, concurrently. Every
    /// chunk is attempted; the first failure is returned afterwards.
    pub async fn admin_delete(&self, instrument: &str) -> Result<usize> {
        let keys = self
            .store()
            .scan_keys(&self.instrument_filter(instrument))
            .await?;
        if keys.is_empty() {
            return Ok(0);
        }

        let chunk_size = self.settings().max_concurrent.max(1);
        let chunks: Vec<_> = keys.chunks(chunk_size).map(<[_]>::to_vec).collect();
        info!(
            instrument = %instrument,
            codes = keys.len(),
            chunks = chunks.len(),
            "Deleting UACs"
        );

        let results = self
            .pool()
            .run(chunks, |chunk| {
                let generator = self.clone();
                async move {
                    generator
                        .store()
                        .delete_many(&chunk)
                        .await
                        .map_err(UacError::from)
                }
            })
            .await;

        let (_, first) = first_error(results, "UAC delete chunk");
        match first {
            Some(err) => Err(err),
            None => Ok(keys.len()),
        }
    }

    /// Move every code of `old` to instrument `new`
    ///
    /// Case ids and disabled flags are preserved. Returns the number of
    /// records rewritten.
    pub async fn rename_instrument(&self, old: &str, new: &str) -> Result<usize> {
        if old.to_lowercase() == new.to_lowercase() {
            return Ok(0);
        }

        let stored = self.store().scan(&self.instrument_filter(old)).await?;
        if stored.is_empty() {
            return Ok(0);
        }

        let new = new.to_string();
        let results = self
            .pool()
            .run(stored, |StoredCode { key, record }| {
                let generator = self.clone();
                let renamed = CodeRecord::with_disabled(&new, &record.case_id, record.disabled);
                async move {
                    generator
                        .store()
                        .update(&key, renamed)
                        .await
                        .map_err(UacError::from)
                }
            })
            .await;

        let (renamed, first) = first_error(results, "UAC rename");
        info!(
            from = %old,
            to = %new,
            renamed = renamed.len(),
            "Instrument rename finished"
        );
        match first {
            Some(err) => Err(err),
            None => Ok(renamed.len()),
        }
    }
}
