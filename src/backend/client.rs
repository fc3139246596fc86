//! HTTP client for the Gemini generative language API.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use tracing::{debug, warn};

use super::Backend;
use super::types::{BackendError, ErrorResponse, GenerateContentRequest, GenerateContentResponse};

/// Default REST endpoint of the generative language API.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// HTTP-based Gemini backend.
pub struct GeminiBackend {
    base_url: String,
    client: Client,
}

impl GeminiBackend {
    /// Create a client for `endpoint`.
    ///
    /// Requests have no timeout; a generation waits until the API answers.
    pub fn new(endpoint: &str) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| BackendError::Client(e.to_string()))?;

        Ok(Self {
            base_url: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Get the base URL for this backend.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    fn api_error(response: Response) -> BackendError {
        let code = response.status().as_u16();
        let reason = response
            .status()
            .canonical_reason()
            .unwrap_or("UNKNOWN")
            .to_string();
        let body = response.text().unwrap_or_default();

        match serde_json::from_str::<ErrorResponse>(&body) {
            Ok(parsed) => BackendError::Api {
                code: if parsed.error.code == 0 {
                    code
                } else {
                    parsed.error.code
                },
                status: if parsed.error.status.is_empty() {
                    reason
                } else {
                    parsed.error.status
                },
                message: parsed.error.message,
            },
            Err(_) => BackendError::Api {
                code,
                status: reason,
                message: body,
            },
        }
    }
}

impl Backend for GeminiBackend {
    fn generate_content(
        &self,
        model: &str,
        api_key: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, BackendError> {
        let url = self.generate_url(model);
        debug!(%url, parts = request.parts().len(), "sending generateContent request");

        let response = self
            .client
            .post(&url)
            .header(API_KEY_HEADER, api_key)
            .json(request)
            .send()
            .map_err(|e| BackendError::ConnectionFailed(e.to_string()))?;

        if !response.status().is_success() {
            let error = Self::api_error(response);
            warn!(%error, "generateContent failed");
            return Err(error);
        }

        response
            .json()
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))
    }
}
