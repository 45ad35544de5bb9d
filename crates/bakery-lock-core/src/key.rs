//! Key-space convention shared by every participant.
//!
//! The object store is the only channel between participants, so these
//! names are the wire format of the lock:
//!
//! | Key | Meaning |
//! |---|---|
//! | `Entering_<id>` | present while participant `<id>` computes its ticket |
//! | `Number_<id>` | decimal ticket of participant `<id>`, absent means 0 |
//! | `NEXT` | next value of the protected sequence counter |
//! | `data_<seq>_<id>` | marker recording that `<id>` produced `<seq>` |

use crate::error::{LockError, LockResult};

const ENTERING: &str = "Entering_";
const NUMBER: &str = "Number_";
const NEXT: &str = "NEXT";
const DATA: &str = "data_";

/// Builds key names, optionally under a namespace prefix.
///
/// With an empty prefix the keys are exactly `Entering_<id>`, `Number_<id>`,
/// `NEXT` and `data_<seq>_<id>`. With prefix `jobs/nightly` they become
/// `jobs/nightly/Entering_<id>` and so on, which lets several independent
/// locks share one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySpace {
    /// Normalized prefix including the trailing `/`, or empty.
    prefix: String,
}

impl KeySpace {
    /// Creates a key space under `prefix`.
    ///
    /// Leading and trailing `/` are stripped. The remaining prefix must not
    /// contain empty segments, whitespace or control characters.
    pub fn new(prefix: &str) -> LockResult<Self> {
        let trimmed = prefix.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(Self::default());
        }

        if trimmed.split('/').any(str::is_empty) {
            return Err(LockError::InvalidConfig(format!(
                "key prefix '{prefix}' contains an empty segment"
            )));
        }
        if trimmed
            .chars()
            .any(|ch| ch.is_whitespace() || ch.is_control())
        {
            return Err(LockError::InvalidConfig(format!(
                "key prefix '{prefix}' contains whitespace or control characters"
            )));
        }

        Ok(Self {
            prefix: format!("{trimmed}/"),
        })
    }

    /// Returns the prefix without its trailing separator.
    pub fn prefix(&self) -> &str {
        self.prefix.trim_end_matches('/')
    }

    /// `Entering_<id>`
    pub fn entering(&self, participant: usize) -> String {
        format!("{}{ENTERING}{participant}", self.prefix)
    }

    /// `Number_<id>`
    pub fn number(&self, participant: usize) -> String {
        format!("{}{NUMBER}{participant}", self.prefix)
    }

    /// `NEXT`
    pub fn next(&self) -> String {
        format!("{}{NEXT}", self.prefix)
    }

    /// `data_<seq>_<id>`
    pub fn data(&self, seq: u64, participant: usize) -> String {
        format!("{}{DATA}{seq}_{participant}", self.prefix)
    }
}
