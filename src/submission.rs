//! Client for the site's form submission endpoint.
//!
//! Registration forms post their fields, together with a `formType`
//! discriminator and the `pagePath` they were sent from, to
//! `{site}/api/submit`. The page then redirects to `{pagePath}?submitted=1`
//! or `?submitted=0`.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{error, info};
use url::Url;

use crate::config::{Config, append_segments};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("a submission is already in flight")]
    AlreadySubmitting,

    #[error("base url {0} cannot carry a path")]
    InvalidBase(Url),
}

/// A filled-in form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormSubmission {
    pub form_type: String,
    pub page_path: String,
    pub fields: Vec<(String, String)>,
}

impl FormSubmission {
    pub fn new(form_type: impl Into<String>, page_path: impl Into<String>) -> Self {
        Self {
            form_type: form_type.into(),
            page_path: page_path.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Body pairs in submission order: discriminator, page path, then fields.
    fn body(&self) -> Vec<(&str, &str)> {
        let mut body = vec![
            ("formType", self.form_type.as_str()),
            ("pagePath", self.page_path.as_str()),
        ];
        body.extend(
            self.fields
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );
        body
    }
}

/// How the endpoint answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Rejected,
}

impl SubmissionOutcome {
    /// Confirmation route for the page the form lives on.
    pub fn redirect_target(&self, page_path: &str) -> String {
        let flag = match self {
            SubmissionOutcome::Accepted => 1,
            SubmissionOutcome::Rejected => 0,
        };
        format!("{page_path}?submitted={flag}")
    }
}

#[derive(Debug)]
pub struct FormSubmitter {
    http: reqwest::Client,
    endpoint: Url,
    submitting: AtomicBool,
}

impl FormSubmitter {
    pub fn new(http: reqwest::Client, endpoint: Url) -> Self {
        Self {
            http,
            endpoint,
            submitting: AtomicBool::new(false),
        }
    }

    /// Submitter posting to `{SITE_BASE_URL}/api/submit`.
    pub fn from_config(config: &Config, http: reqwest::Client) -> Result<Self, SubmitError> {
        let endpoint = append_segments(&config.site_base_url, &["api", "submit"])
            .ok_or_else(|| SubmitError::InvalidBase(config.site_base_url.clone()))?;
        Ok(Self::new(http, endpoint))
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Post the form. Transport errors and non-success statuses are both a
    /// rejection; only a concurrent second submit is an error.
    pub async fn submit(&self, form: &FormSubmission) -> Result<SubmissionOutcome, SubmitError> {
        if self.submitting.swap(true, Ordering::AcqRel) {
            return Err(SubmitError::AlreadySubmitting);
        }
        let in_flight = InFlight(&self.submitting);

        let result = self
            .http
            .post(self.endpoint.clone())
            .form(&form.body())
            .send()
            .await;
        drop(in_flight);

        let outcome = match result {
            Ok(response) if response.status().is_success() => SubmissionOutcome::Accepted,
            Ok(response) => {
                error!(form_type = %form.form_type, status = %response.status(), "form submission rejected");
                SubmissionOutcome::Rejected
            }
            Err(e) => {
                error!(form_type = %form.form_type, reason = %e, "form submission error");
                SubmissionOutcome::Rejected
            }
        };
        info!(form_type = %form.form_type, page = %form.page_path, ?outcome, "form submitted");
        Ok(outcome)
    }
}

/// Clears the submitting flag when dropped, including when the submit
/// future is cancelled mid-request.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
