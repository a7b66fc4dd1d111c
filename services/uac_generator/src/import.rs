//! Import of externally generated codes
//!
//! Imported codes are stored under the "unknown" instrument and case until a
//! case is attached. An import is all-or-nothing with respect to validation:
//! if any code is malformed or already owned by a real case, nothing is
//! written.

use std::collections::HashSet;
use tracing::{info, warn};
use uac_store::CodeRecord;

use crate::error::{ImportError, Result, UacError};
use crate::generator::UacGenerator;

/// Existing state of one code being imported
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    /// Not in the store
    Free,
    /// Stored under the sentinel instrument by an earlier import
    Imported,
    /// Stored under a real instrument
    Claimed,
}

/// Keep the first error seen, logging every one
fn keep_first(first_error: &mut Option<UacError>, err: UacError) {
    warn!(error = %err, "UAC import unit failed");
    if first_error.is_none() {
        *first_error = Some(err);
    }
}

impl UacGenerator {
    /// Import codes generated elsewhere
    ///
    /// Returns the number of codes inserted. Codes already imported earlier
    /// are skipped without being counted.
    pub async fn import<S: AsRef<str>>(&self, codes: &[S]) -> Result<usize> {
        let format = self.format()?;

        let invalid: Vec<String> = codes
            .iter()
            .map(|code| code.as_ref())
            .filter(|code| !format.validate(code))
            .map(str::to_string)
            .collect();
        if !invalid.is_empty() {
            warn!(invalid = invalid.len(), "Rejecting import with malformed UACs");
            return Err(ImportError::invalid(invalid).into());
        }

        let mut seen = HashSet::new();
        let unique: Vec<String> = codes
            .iter()
            .map(|code| code.as_ref())
            .filter(|code| seen.insert(*code))
            .map(str::to_string)
            .collect();

        info!(codes = unique.len(), "Importing UACs");

        let free = self.find_free(&unique).await?;
        let imported = self.insert_unknown(free).await?;

        info!(imported, "UAC import finished");
        Ok(imported)
    }

    /// Look every code up; return the free ones in input order
    async fn find_free(&self, codes: &[String]) -> Result<Vec<String>> {
        let results = self
            .pool()
            .run(codes.iter().cloned().enumerate(), |(index, code)| {
                let generator = self.clone();
                async move {
                    let lookup = match generator.store().get(&generator.code_key(&code)).await {
                        Ok(record) if record.is_unknown() => Lookup::Imported,
                        Ok(_) => Lookup::Claimed,
                        Err(e) if e.is_not_found() => Lookup::Free,
                        Err(e) => return Err(UacError::from(e)),
                    };
                    Ok((index, code, lookup))
                }
            })
            .await;

        let mut first_error = None;
        let mut free = Vec::new();
        let mut claimed = Vec::new();
        for result in results {
            match result {
                Ok((index, code, Lookup::Free)) => free.push((index, code)),
                Ok((index, code, Lookup::Claimed)) => claimed.push((index, code)),
                Ok((_, _, Lookup::Imported)) => {}
                Err(err) => keep_first(&mut first_error, err),
            }
        }
        if let Some(err) = first_error {
            return Err(err);
        }

        if !claimed.is_empty() {
            claimed.sort_unstable();
            warn!(claimed = claimed.len(), "Rejecting import with UACs already in use");
            let claimed = claimed.into_iter().map(|(_, code)| code).collect();
            return Err(ImportError::claimed(claimed).into());
        }

        free.sort_unstable();
        Ok(free.into_iter().map(|(_, code)| code).collect())
    }

    async fn insert_unknown(&self, codes: Vec<String>) -> Result<usize> {
        let results = self
            .pool()
            .run(codes, |code| {
                let generator = self.clone();
                async move {
                    generator
                        .store()
                        .insert_if_absent(&generator.code_key(&code), CodeRecord::unknown())
                        .await
                        .map_err(UacError::from)
                }
            })
            .await;

        let mut first_error = None;
        let mut inserted = 0;
        for result in results {
            match result {
                Ok(()) => inserted += 1,
                Err(err) => keep_first(&mut first_error, err),
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(inserted),
        }
    }
}
