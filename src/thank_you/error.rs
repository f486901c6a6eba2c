//! Error types for payment status lookups.

use reqwest::StatusCode;
use thiserror::Error;
use url::Url;

/// Failure of a single payment status lookup. Never surfaced to the donor:
/// the reconciler logs it and leaves the outcome unresolved.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup returned status {0}")]
    Status(StatusCode),

    #[error("response body has no payment details")]
    EmptyBody,

    #[error("client secret is not a payment intent secret")]
    MalformedSecret,

    #[error("base url {0} cannot carry a path")]
    InvalidBase(Url),
}
