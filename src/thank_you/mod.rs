//! Thank-you page reconciliation.
//!
//! Turns the thank-you route's parameters into a confirmation. Values our own
//! navigation supplied are used as-is; a bare payment reference is resolved
//! remotely, first through the provider with the client secret, then through
//! our status endpoint. Lookups are attempted once and failures only logged.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::Config;

mod error;
pub use error::LookupError;

mod params;
pub use params::{NavigationParams, PaymentReference, RemotePayment, ThankYouOutcome, ThankYouParams};

mod source;
pub use source::{ClientSecretRetriever, PaymentStatusSource, StatusEndpoint};

/// Resolves payment references. `C` is the client-secret path, only present
/// when a publishable key is configured; `S` is the status endpoint.
#[derive(Debug)]
pub struct Reconciler<C, S> {
    client: Option<C>,
    server: S,
}

impl Reconciler<ClientSecretRetriever, StatusEndpoint> {
    pub fn from_config(config: &Config, http: reqwest::Client) -> Self {
        let client = config.publishable_key.as_ref().map(|key| {
            ClientSecretRetriever::new(http.clone(), config.stripe_api_base.clone(), key.clone())
        });
        let server = StatusEndpoint::new(http, config.site_base_url.clone());
        Self::new(client, server)
    }
}

impl<C, S> Reconciler<C, S>
where
    C: PaymentStatusSource,
    S: PaymentStatusSource,
{
    pub fn new(client: Option<C>, server: S) -> Self {
        Self { client, server }
    }

    /// Look a payment reference up:
    /// - Try the client secret through the provider when a key is configured
    /// - Otherwise, or on failure, ask the status endpoint for the id
    ///
    /// Sources are tried one after the other, never concurrently.
    pub async fn lookup(&self, reference: &PaymentReference) -> Option<RemotePayment> {
        if let Some(secret) = &reference.client_secret {
            match &self.client {
                Some(client) => match client.fetch(secret).await {
                    Ok(payment) => return Some(payment),
                    Err(e) => warn!(reason = %e, "client-side payment retrieval failed"),
                },
                None => debug!("no publishable key configured, skipping client-side retrieval"),
            }
        }

        let id = reference.id.as_deref()?;
        match self.server.fetch(id).await {
            Ok(payment) => Some(payment),
            Err(e) => {
                warn!(payment_intent = id, reason = %e, "payment status lookup failed");
                None
            }
        }
    }

    /// Resolve the page outcome in one go. Always returns a resolved outcome.
    pub async fn resolve(&self, params: &ThankYouParams) -> ThankYouOutcome {
        let outcome = ThankYouOutcome::pending(params);
        if outcome.resolved {
            return outcome;
        }
        let remote = self.lookup(&params.reference).await;
        outcome.resolve_with(remote)
    }
}

/// A mounted thank-you page.
///
/// The lookup runs in the background; dropping the view (or calling
/// [`unmount`](Self::unmount)) makes a late result be discarded.
#[derive(Debug)]
pub struct ThankYouView {
    outcome: watch::Receiver<ThankYouOutcome>,
    /// Background lookup; yields whether its result was applied.
    lookup: Option<JoinHandle<bool>>,
}

impl ThankYouView {
    /// Mount the page, starting the lookup when one is needed.
    /// Must be called from within a tokio runtime.
    pub fn mount<C, S>(params: ThankYouParams, reconciler: Arc<Reconciler<C, S>>) -> Self
    where
        C: PaymentStatusSource + Send + Sync + 'static,
        S: PaymentStatusSource + Send + Sync + 'static,
    {
        let pending = ThankYouOutcome::pending(&params);
        let (sender, outcome) = watch::channel(pending.clone());

        let lookup = (!pending.resolved).then(|| {
            tokio::spawn(async move {
                let remote = reconciler.lookup(&params.reference).await;
                publish(&sender, pending.resolve_with(remote))
            })
        });

        Self { outcome, lookup }
    }

    /// Current outcome, possibly still pending.
    pub fn outcome(&self) -> ThankYouOutcome {
        self.outcome.borrow().clone()
    }

    /// Wait until the outcome is resolved.
    pub async fn resolved(&mut self) -> ThankYouOutcome {
        let waited = self
            .outcome
            .wait_for(|outcome| outcome.resolved)
            .await
            .map(|outcome| outcome.clone());
        match waited {
            Ok(outcome) => outcome,
            // lookup task is gone without publishing
            Err(_) => {
                if let Some(lookup) = self.lookup.take() {
                    if let Err(e) = lookup.await {
                        warn!(reason = %e, "payment lookup task failed");
                    }
                }
                self.outcome.borrow().clone()
            }
        }
    }

    pub fn unmount(self) {}
}

/// Apply a lookup result unless the view has been torn down.
/// Returns whether the result was applied.
fn publish(sender: &watch::Sender<ThankYouOutcome>, outcome: ThankYouOutcome) -> bool {
    if sender.is_closed() {
        debug!("thank-you view torn down, discarding payment lookup result");
        return false;
    }
    info!(
        amount = outcome.amount().as_deref().unwrap_or("-"),
        status = outcome.payment_status().unwrap_or("-"),
        "payment details resolved"
    );
    sender.send_replace(outcome);
    true
}
