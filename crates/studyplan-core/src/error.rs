//! Error taxonomy for talking to the inference service.
//!
//! Every failure in the core surfaces as one [`BedrockError`] variant so
//! callers can match narrowly or just propagate the whole category.

use thiserror::Error;

/// Boxed underlying cause carried by [`BedrockError`] variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors from building, invoking, or interpreting the remote model.
#[derive(Debug, Error)]
pub enum BedrockError {
    /// The remote client could not be constructed. Not retried.
    #[error("failed to initialize Bedrock client: {message}")]
    Initialization {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The model call failed (after any retries).
    #[error("error invoking Bedrock model stream: {message}")]
    ModelInvocation {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// The model answered, but not with a usable learning plan. Not retried.
    #[error("invalid response from Bedrock: {message}")]
    InvalidResponse {
        message: String,
        /// The raw text the model produced, if any.
        response: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl BedrockError {
    pub fn initialization(message: impl Into<String>) -> Self {
        Self::Initialization {
            message: message.into(),
            source: None,
        }
    }

    pub fn initialization_caused_by(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::Initialization {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn invocation(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ModelInvocation {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn invalid_response(message: impl Into<String>, response: impl Into<String>) -> Self {
        Self::InvalidResponse {
            message: message.into(),
            response: response.into(),
            source: None,
        }
    }

    /// Attach a raw model response to an [`BedrockError::InvalidResponse`].
    ///
    /// Other variants are returned unchanged.
    pub fn with_response(self, raw: impl Into<String>) -> Self {
        match self {
            Self::InvalidResponse {
                message, source, ..
            } => Self::InvalidResponse {
                message,
                response: raw.into(),
                source,
            },
            other => other,
        }
    }

    /// The raw model output attached to an invalid-response error.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Self::InvalidResponse { response, .. } => Some(response),
            _ => None,
        }
    }

    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Initialization { .. } => "initialization",
            Self::ModelInvocation { .. } => "model_invocation",
            Self::InvalidResponse { .. } => "invalid_response",
        }
    }
}
