//! Listing views and display chunking

use serde::{Deserialize, Serialize};
use std::collections::btree_map;
use std::collections::BTreeMap;
use uac_store::CodeRecord;

const CHUNK_LEN: usize = 4;

/// A code split into 4-character display groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunks {
    pub uac1: String,
    pub uac2: String,
    pub uac3: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uac4: Option<String>,
}

/// Split a code into display groups
///
/// Returns `None` for codes too short to fill three groups.
pub fn chunk_code(code: &str) -> Option<CodeChunks> {
    let chars: Vec<char> = code.chars().collect();
    let mut groups = chars
        .chunks(CHUNK_LEN)
        .map(|group| group.iter().collect::<String>());

    let uac1 = groups.next()?;
    let uac2 = groups.next()?;
    let uac3 = groups.next()?;
    Some(CodeChunks {
        uac1,
        uac2,
        uac3,
        uac4: groups.next(),
    })
}

/// One code as returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeInfo {
    pub instrument_name: String,
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uac_chunks: Option<CodeChunks>,
    /// The code itself, set when the listing is keyed by case id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_uac: Option<String>,
    pub disabled: bool,
}

impl CodeInfo {
    pub fn with_full_uac(mut self, code: impl Into<String>) -> Self {
        self.full_uac = Some(code.into());
        self
    }
}

impl From<CodeRecord> for CodeInfo {
    fn from(record: CodeRecord) -> Self {
        Self {
            instrument_name: record.instrument_name,
            case_id: record.case_id,
            uac_chunks: None,
            full_uac: None,
            disabled: record.disabled,
        }
    }
}

/// Ordered listing keyed by code or by case id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Codes(BTreeMap<String, CodeInfo>);

impl Codes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the one it replaced
    pub fn insert(&mut self, key: impl Into<String>, info: CodeInfo) -> Option<CodeInfo> {
        self.0.insert(key.into(), info)
    }

    pub fn get(&self, key: &str) -> Option<&CodeInfo> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, CodeInfo> {
        self.0.iter()
    }

    /// Fill display chunks on every entry from `full_uac`, else the key
    pub fn build_chunks(&mut self) {
        for (key, info) in self.0.iter_mut() {
            let chunks = chunk_code(info.full_uac.as_deref().unwrap_or(key.as_str()));
            info.uac_chunks = chunks;
        }
    }
}

impl FromIterator<(String, CodeInfo)> for Codes {
    fn from_iter<I: IntoIterator<Item = (String, CodeInfo)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Codes {
    type Item = (String, CodeInfo);
    type IntoIter = btree_map::IntoIter<String, CodeInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Codes {
    type Item = (&'a String, &'a CodeInfo);
    type IntoIter = btree_map::Iter<'a, String, CodeInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
