//! Round-robin pool of interchangeable API keys.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::GenerationError;

/// Ordered set of API keys with a rotation cursor.
///
/// The cursor is owned by the pool, so two clients never share rotation
/// state. Concurrent callers may interleave; each still gets a valid key.
pub struct CredentialPool {
    keys: Vec<String>,
    cursor: AtomicUsize,
}

impl CredentialPool {
    /// Build a pool, dropping blank entries. Fails when nothing is left.
    pub fn new<I, S>(keys: I) -> Result<Self, GenerationError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(Into::into)
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();
        if keys.is_empty() {
            return Err(GenerationError::NoCredentials);
        }
        Ok(Self {
            keys,
            cursor: AtomicUsize::new(0),
        })
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Advance the cursor and return the selected key, wrapping at the end.
    pub fn next_key(&self) -> &str {
        let slot = self.cursor.fetch_add(1, Ordering::Relaxed) % self.keys.len();
        &self.keys[slot]
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted: Vec<String> = self.keys.iter().map(|k| redact(k)).collect();
        f.debug_struct("CredentialPool")
            .field("keys", &redacted)
            .field("cursor", &self.cursor.load(Ordering::Relaxed))
            .finish()
    }
}

/// Show only the last four characters of a key.
pub fn redact(key: &str) -> String {
    let count = key.chars().count();
    let tail: String = key.chars().skip(count.saturating_sub(4)).collect();
    format!("...{tail}")
}
