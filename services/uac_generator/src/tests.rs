//! Tests for batch generation and the instrument workflow

use super::*;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use uac_config::GeneratorSettings;
use uac_store::test_utils::{RecordingStore, ScriptedStore, StoreOp};
use uac_store::{CodeRecord, CodeStore, MemoryStore, StoreError};

type TestStore = RecordingStore<ScriptedStore<MemoryStore>>;

fn setup(settings: GeneratorSettings) -> (UacGenerator, Arc<TestStore>) {
    let store = Arc::new(RecordingStore::new(ScriptedStore::new(MemoryStore::new())));
    let generator = UacGenerator::new(store.clone(), settings);
    (generator, store)
}

fn case_ids(n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("1000{i}")).collect()
}

#[derive(Debug, Default)]
struct StaticCatalog {
    instruments: HashMap<String, (InstrumentModes, Vec<String>)>,
}

impl StaticCatalog {
    fn with(mut self, instrument: &str, modes: &[&str], cases: Vec<String>) -> Self {
        self.instruments.insert(
            instrument.to_string(),
            (InstrumentModes::new(modes.iter().copied()), cases),
        );
        self
    }

    fn lookup(&self, instrument: &str) -> std::result::Result<&(InstrumentModes, Vec<String>), CatalogError> {
        self.instruments
            .get(instrument)
            .ok_or_else(|| CatalogError::instrument_not_found(instrument))
    }
}

#[async_trait]
impl InstrumentCatalog for StaticCatalog {
    async fn instrument_modes(&self, instrument: &str) -> std::result::Result<InstrumentModes, CatalogError> {
        Ok(self.lookup(instrument)?.0.clone())
    }

    async fn case_ids(&self, instrument: &str) -> std::result::Result<Vec<String>, CatalogError> {
        Ok(self.lookup(instrument)?.1.clone())
    }
}

#[tokio::test]
async fn test_generate_fresh_cases() {
    let (generator, store) = setup(GeneratorSettings::default());

    let summary = generator.generate("opn2101a", &case_ids(5)).await.unwrap();

    assert_eq!(
        summary,
        GenerateSummary {
            issued: 5,
            skipped: 0,
            failed: 0,
        }
    );
    assert_eq!(store.calls(StoreOp::Scan), 5);
    assert_eq!(store.calls(StoreOp::Insert), 5);
    assert_eq!(generator.count("opn2101a").await.unwrap(), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_batch_larger_than_pool_gives_each_case_one_code() {
    let (generator, store) = setup(GeneratorSettings::for_kind("uac16").with_max_concurrent(3));
    let cases = case_ids(20);

    let summary = generator.generate("opn2101a", &cases).await.unwrap();

    assert_eq!(summary.issued, 20);
    assert_eq!(summary.total(), 20);
    assert_eq!(store.calls(StoreOp::Insert), 20);

    let by_case = generator.list_by_case_id("opn2101a").await.unwrap();
    assert_eq!(by_case.len(), 20);
    assert!(cases.iter().all(|case_id| by_case.get(case_id).is_some()));

    let codes: HashSet<String> = by_case
        .iter()
        .map(|(_, info)| info.full_uac.clone().unwrap())
        .collect();
    assert_eq!(codes.len(), 20);
    assert!(codes.iter().all(|code| generator.validate(code).unwrap()));
}

#[tokio::test]
async fn test_generate_skips_cases_with_codes() {
    let (generator, store) = setup(GeneratorSettings::default());
    store
        .insert_if_absent(&generator.code_key("123412341234"), CodeRecord::new("opn2101a", "10003"))
        .await
        .unwrap();
    store.reset();

    let summary = generator.generate("OPN2101A", &case_ids(5)).await.unwrap();

    assert_eq!(summary.issued, 4);
    assert_eq!(summary.skipped, 1);
    assert_eq!(store.calls(StoreOp::Scan), 5);
    assert_eq!(store.calls(StoreOp::Insert), 4);

    let by_case = generator.list_by_case_id("opn2101a").await.unwrap();
    assert_eq!(by_case.len(), 5);
    assert_eq!(
        by_case.get("10003").unwrap().full_uac.as_deref(),
        Some("123412341234")
    );
}

#[tokio::test]
async fn test_generate_is_idempotent_per_case() {
    let (generator, _store) = setup(GeneratorSettings::for_kind("uac16"));

    generator.generate("opn2101a", &case_ids(3)).await.unwrap();
    let second = generator.generate("opn2101a", &case_ids(3)).await.unwrap();

    assert_eq!(second.issued, 0);
    assert_eq!(second.skipped, 3);
    let codes = generator.list_by_instrument("opn2101a").await.unwrap();
    assert_eq!(codes.len(), 3);
    assert!(codes.keys().all(|code| generator.validate(code).unwrap()));
    assert!(codes
        .iter()
        .all(|(_, info)| info.uac_chunks.as_ref().unwrap().uac4.is_some()));
}

#[tokio::test]
async fn test_empty_batch_does_no_work() {
    let (generator, store) = setup(GeneratorSettings::default());

    let summary = generator.generate::<String>("opn2101a", &[]).await.unwrap();

    assert_eq!(summary, GenerateSummary::default());
    assert_eq!(store.calls(StoreOp::Scan), 0);
}

#[tokio::test]
async fn test_generate_keeps_successes_and_returns_first_error() {
    let (generator, store) = setup(GeneratorSettings::default().with_max_concurrent(1));
    store
        .inner()
        .fail_next(StoreOp::Insert, StoreError::unavailable("down"));

    let err = generator.generate("opn2101a", &case_ids(4)).await.unwrap_err();

    assert_eq!(err, UacError::Store(StoreError::unavailable("down")));
    assert_eq!(generator.count("opn2101a").await.unwrap(), 3);
}

#[tokio::test]
async fn test_generate_reports_exhaustion() {
    let (generator, store) = setup(GeneratorSettings::default().with_max_attempts(2));
    store
        .inner()
        .fail_always(StoreOp::Insert, StoreError::already_exists("taken"));

    let err = generator.generate("opn2101a", &case_ids(3)).await.unwrap_err();

    assert_eq!(err, UacError::Exhausted { attempts: 2 });
    assert_eq!(store.calls(StoreOp::Insert), 6);
}

#[tokio::test]
async fn test_blank_case_id_is_client_error() {
    let (generator, _store) = setup(GeneratorSettings::default());

    let err = generator.generate("opn2101a", &["10001", ""]).await.unwrap_err();

    assert_eq!(err, UacError::BlankCaseId);
    assert!(err.is_client_error());
    assert_eq!(generator.count("opn2101a").await.unwrap(), 1);
}

#[tokio::test]
async fn test_generate_for_cawi_instrument() {
    let (generator, _store) = setup(GeneratorSettings::default());
    let catalog = StaticCatalog::default().with("dst2106a", &["CATI", "CAWI"], case_ids(3));

    let codes = generator
        .generate_for_instrument(&catalog, "dst2106a")
        .await
        .unwrap();

    assert_eq!(codes.len(), 3);
    for (code, info) in &codes {
        assert_eq!(info.instrument_name, "dst2106a");
        let chunks = info.uac_chunks.as_ref().unwrap();
        assert_eq!(format!("{}{}{}", chunks.uac1, chunks.uac2, chunks.uac3), *code);
    }
}

#[tokio::test]
async fn test_generate_for_instrument_rejects_non_cawi() {
    let (generator, store) = setup(GeneratorSettings::default());
    let catalog = StaticCatalog::default().with("dst2106a", &["CATI"], case_ids(3));

    let err = generator
        .generate_for_instrument(&catalog, "dst2106a")
        .await
        .unwrap_err();

    assert!(matches!(err, UacError::NotCawi { .. }));
    assert_eq!(
        err.to_string(),
        "Instrument 'dst2106a' is not installed in CAWI mode"
    );
    assert_eq!(store.calls(StoreOp::Insert), 0);
}

#[tokio::test]
async fn test_generate_for_missing_instrument() {
    let (generator, _store) = setup(GeneratorSettings::default());
    let catalog: Arc<dyn InstrumentCatalog> = Arc::new(StaticCatalog::default());

    let err = generator
        .generate_for_instrument(catalog.as_ref(), "dst2106a")
        .await
        .unwrap_err();

    assert_eq!(
        err,
        UacError::Catalog(CatalogError::instrument_not_found("dst2106a"))
    );
    assert!(err.is_client_error());
}
