//! Places a payment reference can be resolved.

use std::future::Future;

use reqwest::header::CACHE_CONTROL;
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::error::LookupError;
use super::params::RemotePayment;
use crate::config::append_segments;

/// Resolve a payment reference into its status and amount.
pub trait PaymentStatusSource {
    fn fetch(
        &self,
        reference: &str,
    ) -> impl Future<Output = Result<RemotePayment, LookupError>> + Send;
}

fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, LookupError> {
    append_segments(base, segments).ok_or_else(|| LookupError::InvalidBase(base.clone()))
}

async fn read_payment(response: reqwest::Response) -> Result<RemotePayment, LookupError> {
    let status = response.status();
    if !status.is_success() {
        return Err(LookupError::Status(status));
    }
    let body: Value = response.json().await?;
    RemotePayment::from_json(&body).ok_or(LookupError::EmptyBody)
}

/// Retrieves a payment intent from the provider with its client secret and
/// the publishable key, as the provider's browser library does.
#[derive(Debug, Clone)]
pub struct ClientSecretRetriever {
    http: reqwest::Client,
    api_base: Url,
    publishable_key: String,
}

impl ClientSecretRetriever {
    pub fn new(http: reqwest::Client, api_base: Url, publishable_key: impl Into<String>) -> Self {
        Self {
            http,
            api_base,
            publishable_key: publishable_key.into(),
        }
    }

    /// `pi_123_secret_abc` belongs to intent `pi_123`.
    fn intent_id(client_secret: &str) -> Result<&str, LookupError> {
        match client_secret.split_once("_secret_") {
            Some((id, secret)) if id.starts_with("pi_") && !secret.is_empty() => Ok(id),
            _ => Err(LookupError::MalformedSecret),
        }
    }
}

impl PaymentStatusSource for ClientSecretRetriever {
    async fn fetch(&self, client_secret: &str) -> Result<RemotePayment, LookupError> {
        let id = Self::intent_id(client_secret)?;
        let url = endpoint(&self.api_base, &["v1", "payment_intents", id])?;
        debug!(%url, "retrieving payment intent with client secret");

        let response = self
            .http
            .get(url)
            .query(&[("client_secret", client_secret)])
            .bearer_auth(&self.publishable_key)
            .send()
            .await?;
        read_payment(response).await
    }
}

/// Our own status endpoint: `GET {base}/api/stripe/payment-intents/{id}`.
#[derive(Debug, Clone)]
pub struct StatusEndpoint {
    http: reqwest::Client,
    base: Url,
}

impl StatusEndpoint {
    pub fn new(http: reqwest::Client, base: Url) -> Self {
        Self { http, base }
    }
}

impl PaymentStatusSource for StatusEndpoint {
    async fn fetch(&self, id: &str) -> Result<RemotePayment, LookupError> {
        let url = endpoint(&self.base, &["api", "stripe", "payment-intents", id])?;
        debug!(%url, "looking up payment status");

        let response = self
            .http
            .get(url)
            .header(CACHE_CONTROL, "no-store")
            .send()
            .await?;
        read_payment(response).await
    }
}
