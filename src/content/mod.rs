//! Generated content: facts, cover images and narration audio.
//!
//! [`ContentProvider`] is the seam between the app and the generative
//! backend. [`GeminiClient`] is the production implementation; tests swap in
//! scripted providers.
pub mod cover;
pub mod gemini;
pub mod video;

use std::future::Future;
use thiserror::Error;

use crate::model::{FactDescriptor, Language};

pub use gemini::{GeminiClient, GeminiSettings};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ProviderError {
    /// Credentials or configuration are missing.
    #[error("Content provider unavailable: {0}")]
    Unavailable(String),
    #[error("Request timed out after {0}s")]
    Timeout(u64),
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Response is missing {0}")]
    MissingData(&'static str),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

/// Coarse classification used by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    Unavailable,
    RequestFailed,
}

impl ProviderError {
    pub fn kind(&self) -> ProviderErrorKind {
        match self {
            ProviderError::Unavailable(_) | ProviderError::InsecureBaseUrl => {
                ProviderErrorKind::Unavailable
            }
            _ => ProviderErrorKind::RequestFailed,
        }
    }

    /// Whether the request may succeed if sent again.
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Timeout(_) | ProviderError::Network(_) => true,
            ProviderError::HttpStatus(status) => *status >= 500 || *status == 429,
            ProviderError::Unavailable(_)
            | ProviderError::ResponseTooLarge(_)
            | ProviderError::InvalidResponse(_)
            | ProviderError::MissingData(_)
            | ProviderError::InsecureBaseUrl => false,
        }
    }
}

// ============================================================================
// Provider Seam
// ============================================================================

/// The three request/response operations the app needs from the backend.
pub trait ContentProvider: Send + Sync {
    /// A batch of facts in `lang`, each still missing its cover.
    fn fetch_facts(
        &self,
        lang: Language,
    ) -> impl Future<Output = Result<Vec<FactDescriptor>, ProviderError>> + Send;

    /// Raw PNG bytes for a cover prompt.
    fn generate_image(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;

    /// Raw 16-bit PCM speech for `text`.
    fn generate_speech(
        &self,
        text: &str,
    ) -> impl Future<Output = Result<Vec<u8>, ProviderError>> + Send;
}
