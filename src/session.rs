//! Replay of recorded modal sessions from csv.
//!
//! Rows are `event,amount,campaign,monthly`; the final modal state is written
//! back as csv.

use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::Amount;
use crate::modal::{DonationModal, Key, ModalEvent};

/// Errors that can occur when reading session rows
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to open session: {0}")]
    Open(#[source] csv::Error),

    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: unrecognized event '{event}'")]
    UnrecognizedEvent { line: usize, event: String },

    #[error("line {line}: {event} missing {field}")]
    MissingValue {
        line: usize,
        event: String,
        field: &'static str,
    },

    #[error("line {line}: {event} has invalid {field} '{value}'")]
    InvalidValue {
        line: usize,
        event: String,
        field: &'static str,
        value: String,
    },
}

#[derive(Debug, Deserialize)]
struct InputRow {
    event: String,
    amount: Option<String>,
    campaign: Option<String>,
    monthly: Option<String>,
}

#[derive(Debug, Serialize)]
struct OutputRow<'a> {
    open: bool,
    step: String,
    amount: String,
    monthly: bool,
    campaign: &'a str,
    error: &'a str,
    payment_url: &'a str,
}

impl InputRow {
    fn amount(&self, line: usize) -> Result<Option<Amount>, SessionError> {
        let Some(value) = &self.amount else {
            return Ok(None);
        };
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .map(|v| Some(Amount::from_float(v)))
            .ok_or_else(|| SessionError::InvalidValue {
                line,
                event: self.event.clone(),
                field: "amount",
                value: value.clone(),
            })
    }

    fn into_event(self, line: usize) -> Result<ModalEvent, SessionError> {
        let missing = |field| SessionError::MissingValue {
            line,
            event: self.event.clone(),
            field,
        };
        let event = match self.event.as_str() {
            "open" => ModalEvent::Open {
                amount: self.amount(line)?,
                campaign: self.campaign.clone(),
            },
            "close" => ModalEvent::Close,
            "preset" => ModalEvent::SelectPreset(self.amount(line)?.ok_or_else(|| missing("amount"))?),
            "custom" => ModalEvent::SetCustomAmount(self.amount.clone().unwrap_or_default()),
            "frequency" => match self.monthly.as_deref() {
                Some("true") => ModalEvent::SetFrequency { monthly: true },
                Some("false") => ModalEvent::SetFrequency { monthly: false },
                Some(other) => {
                    return Err(SessionError::InvalidValue {
                        line,
                        event: self.event.clone(),
                        field: "monthly",
                        value: other.to_string(),
                    });
                }
                None => return Err(missing("monthly")),
            },
            "advance" => ModalEvent::Advance,
            "retreat" => ModalEvent::Retreat,
            "escape" => ModalEvent::KeyPressed(Key::Escape),
            other => {
                return Err(SessionError::UnrecognizedEvent {
                    line,
                    event: other.to_string(),
                });
            }
        };
        Ok(event)
    }
}

/// Read modal events from a csv file
pub fn read_session(
    path: impl AsRef<Path>,
) -> Result<impl Iterator<Item = Result<ModalEvent, SessionError>>, SessionError> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(SessionError::Open)?;

    Ok(reader
        .into_deserialize::<InputRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| SessionError::Parse { line, source })?;
            row.into_event(line)
        }))
}

/// Write the modal state as a single csv row with header
pub fn write_state(writer: impl io::Write, modal: &DonationModal) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_writer(writer);
    let intent = modal.intent();
    let row = OutputRow {
        open: modal.is_open(),
        step: modal.step().to_string(),
        amount: intent.amount.to_string(),
        monthly: intent.is_monthly,
        campaign: intent.campaign.as_deref().unwrap_or_default(),
        error: modal.error().unwrap_or_default(),
        payment_url: modal.payment_url().map(|url| url.as_str()).unwrap_or_default(),
    };
    writer.serialize(&row)?;
    writer.flush()?;
    Ok(())
}
