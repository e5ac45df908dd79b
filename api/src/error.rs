use reqwest::StatusCode;
use url::Url;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("API request failed with {}: {}", status_code, message)]
    Api {
        status_code: StatusCode,
        message: String,
    },

    #[error("Invalid endpoint `{}`", endpoint)]
    BadEndpoint { endpoint: Url },

    #[error("Bad token: {}", token)]
    BadToken { token: String },

    #[error("Expected a screen name, got: {}", identifier)]
    BadScreenName { identifier: String },

    #[error("Expected a numeric user id, got: {}", identifier)]
    BadUserId { identifier: String },

    #[error("Cannot find user with screen name `{}`", screen_name)]
    UnknownUser { screen_name: String },

    #[error(
        "Cannot look up {} users in one request, the API accepts at most {}",
        requested,
        limit
    )]
    BatchTooLarge { requested: usize, limit: usize },

    #[error("Invalid pipeline option: {}", message)]
    BadPipelineOption { message: String },

    #[error("Could not parse JSON response.")]
    BadJsonResponse(#[source] reqwest::Error),

    #[error("Failed to initialise the HTTP client")]
    BuildHttpClient(#[source] reqwest::Error),

    #[error("HTTP request error: {}", message)]
    ReqwestError {
        message: String,
        source: reqwest::Error,
    },

    #[error("The operation was cancelled")]
    Cancelled,
}

impl Error {
    /// Whether the remote rejected the request because the caller exceeded its quota.
    pub fn is_throttled(&self) -> bool {
        matches!(
            self,
            Error::Api {
                status_code: StatusCode::TOO_MANY_REQUESTS,
                ..
            }
        )
    }
}
