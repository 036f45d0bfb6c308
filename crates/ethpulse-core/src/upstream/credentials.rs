//! Ordered upstream credential set with a shared round-robin cursor.

use std::{
    fmt,
    sync::atomic::{AtomicUsize, Ordering},
};

use super::UpstreamError;

/// A single upstream credential resolved to its endpoint URL.
///
/// The URL embeds the API key, so `Debug` prints only the label.
#[derive(Clone)]
pub struct Credential {
    label: String,
    endpoint_url: String,
}

impl Credential {
    #[must_use]
    pub fn new(label: impl Into<String>, endpoint_url: impl Into<String>) -> Self {
        Self { label: label.into(), endpoint_url: endpoint_url.into() }
    }

    /// Log-safe identifier (`credential-N`).
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential").field("label", &self.label).finish_non_exhaustive()
    }
}

/// Result of a rotation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationOutcome {
    Rotated { from: usize, to: usize },
    /// Another caller already moved the cursor off the failed credential.
    Superseded { current: usize },
    /// Only one credential exists; the cursor did not move.
    SingleCredential,
}

/// Non-empty ordered credential list with a current-index cursor.
///
/// The cursor is one atomic cell holding an index in `0..len`. Rotation is a compare-and-swap
/// from the index the failed attempt used, so several callers rate-limited on the same
/// credential advance the cursor once instead of skipping past healthy credentials.
pub struct CredentialSet {
    credentials: Vec<Credential>,
    cursor: AtomicUsize,
}

impl CredentialSet {
    /// # Errors
    ///
    /// Returns [`UpstreamError::NoCredentials`] if `credentials` is empty.
    pub fn new(credentials: Vec<Credential>) -> Result<Self, UpstreamError> {
        if credentials.is_empty() {
            return Err(UpstreamError::NoCredentials);
        }
        Ok(Self { credentials, cursor: AtomicUsize::new(0) })
    }

    /// Builds the set from API keys by expanding `{network}` and `{key}` in `url_template`.
    ///
    /// Blank keys are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`UpstreamError::NoCredentials`] if no usable key remains.
    pub fn from_api_keys(
        api_keys: &[String],
        url_template: &str,
        network: &str,
    ) -> Result<Self, UpstreamError> {
        let credentials = api_keys
            .iter()
            .map(|key| key.trim())
            .filter(|key| !key.is_empty())
            .enumerate()
            .map(|(i, key)| {
                let url = url_template.replace("{network}", network).replace("{key}", key);
                Credential::new(format!("credential-{i}"), url)
            })
            .collect();

        Self::new(credentials)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Current index, always in `0..len`.
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.cursor.load(Ordering::Acquire) % self.credentials.len()
    }

    /// Returns the credential the next call should use along with its index.
    #[must_use]
    pub fn current(&self) -> (usize, &Credential) {
        let index = self.current_index();
        (index, &self.credentials[index])
    }

    /// Moves the cursor from `used` to the next credential in round-robin order.
    ///
    /// `used` is the index the failed attempt ran against. If the cursor has already left it,
    /// nothing changes and [`RotationOutcome::Superseded`] reports where it is now.
    pub fn rotate_from(&self, used: usize) -> RotationOutcome {
        let len = self.credentials.len();
        if len == 1 {
            return RotationOutcome::SingleCredential;
        }

        let from = used % len;
        let to = (from + 1) % len;
        match self.cursor.compare_exchange(from, to, Ordering::AcqRel, Ordering::Acquire) {
            Ok(_) => RotationOutcome::Rotated { from, to },
            Err(current) => RotationOutcome::Superseded { current: current % len },
        }
    }
}

impl fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialSet")
            .field("len", &self.credentials.len())
            .field("current_index", &self.current_index())
            .finish()
    }
}
