use thiserror::Error;

/// Classification of JSON-RPC errors for retry handling.
///
/// Only rate limits rotate to the next credential; every other category propagates to the
/// caller on first occurrence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorCategory {
    /// Client errors: invalid request, method not found, invalid params.
    ClientError,
    /// Provider/server errors: internal error, server error.
    ProviderError,
    /// Rate limiting at JSON-RPC level (-32005) or reported in the message.
    RateLimit,
    /// Parse error from upstream - malformed response.
    ParseError,
}

impl RpcErrorCategory {
    /// Classifies a JSON-RPC error code and message into a category.
    ///
    /// Providers are inconsistent about rate-limit codes, so the message is also inspected for
    /// the usual wording ("rate limit", "too many requests", "exceeded ... capacity").
    #[must_use]
    pub fn from_code_and_message(code: i32, message: &str) -> Self {
        if is_rate_limit_message(message) {
            return Self::RateLimit;
        }

        match code {
            -32700 => Self::ParseError,
            -32602..=-32600 => Self::ClientError,
            -32005 | 429 => Self::RateLimit,
            _ => Self::ProviderError,
        }
    }

    /// Returns a static string representation for metrics labels.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ClientError => "client_error",
            Self::ProviderError => "provider_error",
            Self::RateLimit => "rate_limit",
            Self::ParseError => "parse_error",
        }
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("rate limit") ||
        lower.contains("ratelimit") ||
        lower.contains("too many requests") ||
        (lower.contains("exceeded") && lower.contains("capacity"))
}

/// Errors that can occur when interacting with the upstream blockchain provider.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum UpstreamError {
    /// Request exceeded the configured timeout duration.
    #[error("Request timeout")]
    Timeout,

    /// Failed to establish a connection to the upstream endpoint.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// HTTP-level error occurred (non-2xx status code).
    #[error("HTTP error {0}: {1}")]
    HttpError(u16, String),

    /// JSON-RPC error returned by the upstream provider.
    #[error("RPC error {0}: {1}")]
    RpcError(i32, String),

    /// Network-level error from the underlying HTTP client.
    #[error("Network error: {0}")]
    Network(String),

    /// Response from upstream could not be parsed or was malformed.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The requested block, transaction or account does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request validation failed before being sent to upstream.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The credential pool is empty.
    #[error("No upstream credentials configured")]
    NoCredentials,
}

impl UpstreamError {
    /// Returns the RPC error category if this is an RPC error.
    #[must_use]
    pub fn rpc_category(&self) -> Option<RpcErrorCategory> {
        match self {
            Self::RpcError(code, message) => {
                Some(RpcErrorCategory::from_code_and_message(*code, message))
            }
            _ => None,
        }
    }

    /// Returns `true` for rate-limit-class failures: HTTP 429 or a provider-reported limit.
    ///
    /// These are the only errors that rotate the credential pool.
    #[must_use]
    pub fn is_rate_limit(&self) -> bool {
        match self {
            Self::HttpError(429, _) => true,
            Self::HttpError(_, body) => is_rate_limit_message(body),
            Self::RpcError(..) => self.rpc_category() == Some(RpcErrorCategory::RateLimit),
            _ => false,
        }
    }

    /// Returns a static string representation for metrics labels.
    #[must_use]
    pub fn as_metric_str(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionFailed(_) => "connection_failed",
            Self::HttpError(429, _) => "http_rate_limit",
            Self::HttpError(_, _) => "http_error",
            Self::RpcError(..) => self.rpc_category().map_or("rpc_error", |c| c.as_str()),
            Self::Network(_) => "network_error",
            Self::InvalidResponse(_) => "invalid_response",
            Self::NotFound(_) => "not_found",
            Self::InvalidRequest(_) => "invalid_request",
            Self::NoCredentials => "no_credentials",
        }
    }
}
