//! Backend communication with the remote speech API.
//!
//! Provides the transport trait and its Gemini REST implementation. The
//! trait only moves requests and responses; prompt shaping and error
//! classification live in the engine.

mod client;
mod types;

pub use client::{DEFAULT_ENDPOINT, GeminiBackend};
pub use types::{
    BackendError, Candidate, Content, ErrorBody, ErrorResponse, GenerateContentRequest,
    GenerateContentResponse, InlineData, Part, SpeechModel,
};

/// Trait for speech API communication.
///
/// This trait abstracts the HTTP communication with the remote model,
/// allowing for mock implementations in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Backend: Send + Sync {
    /// Run a `generateContent` call.
    ///
    /// # Arguments
    /// * `model` - Remote model identifier
    /// * `api_key` - Credential sent with the request
    /// * `request` - Request body
    fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, BackendError>;
}

/// Create a backend for the given endpoint.
pub fn create_backend(endpoint: &str) -> Result<GeminiBackend, BackendError> {
    GeminiBackend::new(endpoint)
}
