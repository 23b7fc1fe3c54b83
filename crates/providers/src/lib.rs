//! Language-model provider adapters for DataLens.
//!
//! All adapters implement `datalens_core::Provider`. The registry maps
//! configured names to adapters and resolves them per request.

pub mod ollama;
pub mod openai;
pub mod registry;
pub mod vertex;

pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
pub use registry::{ProviderRegistry, ResolvedProvider, build_from_config};
pub use vertex::VertexProvider;

use datalens_core::error::ProviderError;
use std::time::Duration;
use tracing::warn;

/// Build the shared HTTP client. No timeout unless one is configured.
pub(crate) fn http_client(timeout_secs: Option<u64>) -> reqwest::Client {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    builder.build().unwrap_or_else(|e| {
        warn!(error = %e, "Falling back to default HTTP client");
        reqwest::Client::new()
    })
}

/// Normalize a transport failure.
pub(crate) fn transport_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(e.to_string())
    } else {
        ProviderError::Network(e.to_string())
    }
}

/// Map a non-success HTTP status to a [`ProviderError`], or pass the
/// response through.
pub(crate) async fn check_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status().as_u16();

    if status == 429 {
        return Err(ProviderError::RateLimited {
            retry_after_secs: 5,
        });
    }

    if status == 401 || status == 403 {
        return Err(ProviderError::AuthenticationFailed(
            "Invalid credentials or insufficient permissions".into(),
        ));
    }

    if !response.status().is_success() {
        let error_body = response.text().await.unwrap_or_default();
        warn!(provider, status, body = %error_body, "Provider returned error");
        return Err(ProviderError::ApiError {
            status_code: status,
            message: error_body,
        });
    }

    Ok(response)
}
