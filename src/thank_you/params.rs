//! Thank-you page inputs and the outcome shown to the donor.

use std::fmt;

use serde_json::Value;
use url::Url;
use url::form_urlencoded;

use crate::Amount;

/// Values our own navigation put on the thank-you route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationParams {
    /// Shown verbatim, it is never reformatted
    pub amount: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub campaign: Option<String>,
    pub monthly: bool,
}

/// Payment provider reference added to the route after a redirect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentReference {
    /// `payment_intent_client_secret`
    pub client_secret: Option<String>,
    /// `payment_intent`
    pub id: Option<String>,
}

impl PaymentReference {
    pub fn is_present(&self) -> bool {
        self.client_secret.is_some() || self.id.is_some()
    }
}

/// Everything the thank-you route was given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ThankYouParams {
    pub navigation: NavigationParams,
    pub reference: PaymentReference,
}

impl ThankYouParams {
    /// Parse a query string, with or without the leading `?`.
    /// Empty values count as absent and the first occurrence of a key wins.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut params = ThankYouParams::default();
        let mut monthly = None;

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "amount" => &mut params.navigation.amount,
                "firstName" => &mut params.navigation.first_name,
                "lastName" => &mut params.navigation.last_name,
                "email" => &mut params.navigation.email,
                "campaign" => &mut params.navigation.campaign,
                "payment_intent_client_secret" => &mut params.reference.client_secret,
                "payment_intent" => &mut params.reference.id,
                "monthly" => {
                    monthly.get_or_insert(value == "true");
                    continue;
                }
                _ => continue,
            };
            if slot.is_none() && !value.is_empty() {
                *slot = Some(value.into_owned());
            }
        }

        params.navigation.monthly = monthly.unwrap_or(false);
        params
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    /// Remote lookup only happens for a payment reference without a local amount.
    pub fn needs_lookup(&self) -> bool {
        self.reference.is_present() && self.navigation.amount.is_none()
    }
}

/// Payment details retrieved from the provider or our status endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemotePayment {
    pub status: String,
    pub amount: Option<Amount>,
}

impl RemotePayment {
    /// Read a payment intent body. `amount` is in minor units and only used
    /// when it is a number; a missing status is empty.
    pub fn from_json(body: &Value) -> Option<Self> {
        let body = body.as_object()?;
        let status = body
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let amount = body.get("amount").and_then(|amount| match amount.as_i64() {
            Some(minor) => Some(Amount::from_minor_units(minor)),
            None => amount.as_f64().map(|minor| Amount::from_float(minor / 100.0)),
        });
        Some(Self { status, amount })
    }
}

/// What the thank-you page shows. Built on entry, updated at most once by
/// the payment lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThankYouOutcome {
    pub navigation: NavigationParams,
    pub has_reference: bool,
    pub remote: Option<RemotePayment>,
    pub resolved: bool,
}

impl ThankYouOutcome {
    /// Outcome on page entry. Already resolved when no lookup is needed.
    pub fn pending(params: &ThankYouParams) -> Self {
        Self {
            navigation: params.navigation.clone(),
            has_reference: params.reference.is_present(),
            remote: None,
            resolved: !params.needs_lookup(),
        }
    }

    /// Apply the lookup result and mark the outcome complete.
    pub fn resolve_with(mut self, remote: Option<RemotePayment>) -> Self {
        self.remote = remote;
        self.resolved = true;
        self
    }

    /// Navigation amount as given, else the remote amount with two decimals.
    pub fn amount(&self) -> Option<String> {
        if let Some(amount) = &self.navigation.amount {
            return Some(amount.clone());
        }
        self.remote
            .as_ref()
            .and_then(|remote| remote.amount)
            .map(|amount| amount.to_string())
    }

    pub fn payment_status(&self) -> Option<&str> {
        self.remote
            .as_ref()
            .map(|remote| remote.status.as_str())
            .filter(|status| !status.is_empty())
    }

    pub fn message(&self) -> String {
        let mut message = String::from("We appreciate your generous ");
        if self.navigation.monthly {
            message.push_str("monthly ");
        }
        message.push_str("donation");
        if let Some(amount) = self.amount() {
            message.push_str(&format!(" of ${amount}"));
        }
        if let Some(campaign) = &self.navigation.campaign {
            message.push_str(&format!(" to {campaign}"));
        }
        message.push('.');

        if self.navigation.amount.is_none() && self.has_reference {
            if !self.resolved {
                message.push_str(" Finalizing your payment details...");
            } else if self.amount().is_none() {
                message.push_str(" Payment details loaded.");
            }
        }
        message
    }

    pub fn donor_line(&self) -> Option<String> {
        let first = self.navigation.first_name.as_deref().unwrap_or_default();
        let last = self.navigation.last_name.as_deref().unwrap_or_default();
        if first.is_empty() && last.is_empty() {
            return None;
        }
        Some(format!("Donor: {}", format!("{first} {last}").trim()))
    }

    pub fn receipt_line(&self) -> Option<String> {
        self.navigation
            .email
            .as_ref()
            .map(|email| format!("A receipt will be sent to {email}."))
    }
}

impl fmt::Display for ThankYouOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Thank you!")?;
        writeln!(f, "{}", self.message())?;
        if let Some(donor) = self.donor_line() {
            writeln!(f, "{donor}")?;
        }
        if let Some(receipt) = self.receipt_line() {
            writeln!(f, "{receipt}")?;
        }
        Ok(())
    }
}
