//! Code format strategies
//!
//! The configured kind picks one of two shapes:
//!
//! - `uac`: twelve digits in three groups, each group in `1000..=9999`
//! - `uac16`: sixteen characters from [`APPROVED_CHARACTERS`]
//!
//! Validation accepts exactly what generation can produce.

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

/// Characters a 16-character code may contain
///
/// Consonants without the easily confused ones, plus digits 2-9.
pub const APPROVED_CHARACTERS: &str = "bcdfghjklmnpqrstvxz23456789";

/// Kind selecting the twelve-digit format
pub const NUMERIC_KIND: &str = "uac";

/// Kind selecting the sixteen-character format
pub const ALPHANUMERIC_KIND: &str = "uac16";

const NUMERIC_GROUPS: usize = 3;
const GROUP_LEN: usize = 4;
const GROUP_MIN: u16 = 1000;
const GROUP_MAX: u16 = 9999;
const ALPHANUMERIC_LEN: usize = 16;

static ALPHANUMERIC_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[bcdfghjklmnpqrstvxz23456789]{16}$").expect("alphabet pattern compiles")
});

/// Shape of the codes in one code-space
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeFormat {
    /// Three 4-digit groups, no leading zeros
    Numeric12,
    /// Sixteen characters from the approved alphabet
    Alphanumeric16,
}

impl CodeFormat {
    /// Format for a configured kind, `None` if the kind is unrecognized
    pub fn for_kind(kind: &str) -> Option<Self> {
        match kind {
            NUMERIC_KIND => Some(CodeFormat::Numeric12),
            ALPHANUMERIC_KIND => Some(CodeFormat::Alphanumeric16),
            _ => None,
        }
    }

    /// Length in characters of every code of this format
    pub fn code_length(self) -> usize {
        match self {
            CodeFormat::Numeric12 => NUMERIC_GROUPS * GROUP_LEN,
            CodeFormat::Alphanumeric16 => ALPHANUMERIC_LEN,
        }
    }

    /// Draw a fresh random candidate
    pub fn generate<R: Rng + ?Sized>(self, rng: &mut R) -> String {
        match self {
            CodeFormat::Numeric12 => (0..NUMERIC_GROUPS)
                .map(|_| rng.gen_range(GROUP_MIN..=GROUP_MAX).to_string())
                .collect(),
            CodeFormat::Alphanumeric16 => {
                let alphabet = APPROVED_CHARACTERS.as_bytes();
                (0..ALPHANUMERIC_LEN)
                    .map(|_| char::from(alphabet[rng.gen_range(0..alphabet.len())]))
                    .collect()
            }
        }
    }

    /// Whether `code` has the shape this format generates
    pub fn validate(self, code: &str) -> bool {
        match self {
            CodeFormat::Numeric12 => {
                code.len() == self.code_length()
                    && code.bytes().all(|b| b.is_ascii_digit())
                    && code.as_bytes().chunks(GROUP_LEN).all(|group| {
                        std::str::from_utf8(group)
                            .ok()
                            .and_then(|digits| digits.parse::<u16>().ok())
                            .is_some_and(|value| (GROUP_MIN..=GROUP_MAX).contains(&value))
                    })
            }
            CodeFormat::Alphanumeric16 => ALPHANUMERIC_PATTERN.is_match(code),
        }
    }
}
