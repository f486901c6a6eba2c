//! Donation modal controller.
//!
//! Owns the two-step donation sequence: choosing an amount and frequency,
//! then paying through the hosted widget. Also supports an async stream of
//! modal events.

use tokio_stream::{Stream, StreamExt};
use tracing::info;
use url::Url;

use crate::Amount;
use crate::model::{DEFAULT_PRESET, DonationIntent, ModalStep};

mod error;
pub use error::{AMOUNT_ERROR_MESSAGE, ModalError};

mod widget;
pub use widget::{DEFAULT_REFERRER_URL, DEFAULT_WIDGET_PAGE_URL, DEFAULT_WIDGET_URL, WidgetConfig};

/// A keyboard key delivered while the modal is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Key {
    Escape,
    Other(String),
}

/// An interaction with the donation modal.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalEvent {
    /// Open with a preset amount (50 when absent) and optional campaign label.
    Open {
        amount: Option<Amount>,
        campaign: Option<String>,
    },
    Close,
    SelectPreset(Amount),
    /// Raw text of the custom amount field.
    SetCustomAmount(String),
    SetFrequency { monthly: bool },
    Advance,
    Retreat,
    KeyPressed(Key),
}

impl ModalEvent {
    pub fn name(&self) -> &'static str {
        match self {
            ModalEvent::Open { .. } => "open",
            ModalEvent::Close => "close",
            ModalEvent::SelectPreset(_) => "preset",
            ModalEvent::SetCustomAmount(_) => "custom",
            ModalEvent::SetFrequency { .. } => "frequency",
            ModalEvent::Advance => "advance",
            ModalEvent::Retreat => "retreat",
            ModalEvent::KeyPressed(_) => "key",
        }
    }
}

/// The donation modal state holder.
///
/// Constructed once and passed by reference to whatever needs to open it.
#[derive(Debug)]
pub struct DonationModal {
    widget: WidgetConfig,
    is_open: bool,
    step: ModalStep,
    /// Preset supplied by the last `open`, used by the custom field display
    preset: Amount,
    intent: DonationIntent,
    error: Option<&'static str>,
    /// Built once when entering the payment step
    payment_url: Option<Url>,
}

/// Public API
impl DonationModal {
    pub fn new(widget: WidgetConfig) -> Self {
        Self {
            widget,
            is_open: false,
            step: ModalStep::Amount,
            preset: DEFAULT_PRESET,
            intent: DonationIntent::default(),
            error: None,
            payment_url: None,
        }
    }

    /// Run the modal with the given event stream
    pub async fn run(&mut self, mut stream: impl Stream<Item = ModalEvent> + Unpin) {
        while let Some(event) = stream.next().await {
            // a rejected interaction leaves the modal usable, so the result is only logged
            let _ = self.apply(event);
        }
    }

    /// Apply a single event on top of the current modal state
    pub fn apply(&mut self, event: ModalEvent) -> Result<(), ModalError> {
        let name = event.name();
        let result = match event {
            ModalEvent::Open { amount, campaign } => {
                self.open(amount.unwrap_or(DEFAULT_PRESET), campaign.as_deref());
                Ok(())
            }
            ModalEvent::Close => {
                self.close();
                Ok(())
            }
            ModalEvent::SelectPreset(value) => self.select_preset_amount(value),
            ModalEvent::SetCustomAmount(input) => self.set_custom_amount(&input),
            ModalEvent::SetFrequency { monthly } => self.set_frequency(monthly),
            ModalEvent::Advance => self.advance(),
            ModalEvent::Retreat => self.retreat(),
            ModalEvent::KeyPressed(key) => self.handle_key(&key),
        };
        self.log_result(name, &result);
        result
    }

    /// Show the modal with a fresh intent, always starting on the amount step.
    /// Opening an already open modal overwrites its intent.
    pub fn open(&mut self, preset: Amount, campaign: Option<&str>) {
        self.preset = preset;
        self.intent = DonationIntent::new(preset, campaign);
        self.step = ModalStep::Amount;
        self.error = None;
        self.payment_url = None;
        self.is_open = true;
    }

    /// Hide the modal. The intent stays readable until the next `open`; the
    /// hosted widget, if loaded, is simply abandoned.
    pub fn close(&mut self) {
        self.is_open = false;
        self.payment_url = None;
    }

    pub fn select_preset_amount(&mut self, value: Amount) -> Result<(), ModalError> {
        self.ensure_editable()?;
        self.intent.amount = value;
        Ok(())
    }

    /// Update the amount from the custom field's raw text; unparseable text is zero.
    pub fn set_custom_amount(&mut self, input: &str) -> Result<(), ModalError> {
        self.ensure_editable()?;
        self.intent.amount = Amount::parse_lenient(input);
        Ok(())
    }

    pub fn set_frequency(&mut self, monthly: bool) -> Result<(), ModalError> {
        self.ensure_editable()?;
        self.intent.is_monthly = monthly;
        Ok(())
    }

    /// Move to the payment step:
    /// - Ensure the modal is open and on the amount step
    /// - Validate the amount, keeping a displayable error on failure
    /// - Freeze the intent and build the widget URL
    pub fn advance(&mut self) -> Result<(), ModalError> {
        self.ensure_on_step(ModalStep::Amount, "advance")?;

        if self.intent.amount < Amount::MINIMUM {
            self.error = Some(AMOUNT_ERROR_MESSAGE);
            return Err(ModalError::AmountBelowMinimum(self.intent.amount));
        }

        self.error = None;
        self.payment_url = Some(self.widget.payment_url(&self.intent));
        self.step = ModalStep::Payment;
        Ok(())
    }

    /// Return to the amount step, keeping the intent as it was.
    pub fn retreat(&mut self) -> Result<(), ModalError> {
        self.ensure_on_step(ModalStep::Payment, "retreat")?;
        self.payment_url = None;
        self.step = ModalStep::Amount;
        Ok(())
    }

    /// Escape closes the modal from any step; other keys are ignored.
    pub fn handle_key(&mut self, key: &Key) -> Result<(), ModalError> {
        if !self.is_open {
            return Err(ModalError::Closed);
        }
        if *key == Key::Escape {
            self.close();
        }
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.is_open
    }

    pub fn step(&self) -> ModalStep {
        self.step
    }

    pub fn intent(&self) -> &DonationIntent {
        &self.intent
    }

    /// Validation message to show under the amount field
    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    /// Widget URL, present only while on the payment step
    pub fn payment_url(&self) -> Option<&Url> {
        self.payment_url.as_ref()
    }

    /// Whether a preset button should be highlighted
    pub fn is_selected_preset(&self, value: Amount) -> bool {
        self.intent.amount == value
    }

    /// Text of the custom amount field: empty while the amount equals the
    /// preset the modal was opened with.
    pub fn custom_amount_display(&self) -> String {
        if self.intent.amount == self.preset {
            String::new()
        } else {
            self.intent.amount.to_query_value()
        }
    }
}

/// Private API
impl DonationModal {
    /// Small helper to log `apply` results
    fn log_result(&self, event: &str, result: &Result<(), ModalError>) {
        match result {
            Ok(()) => {
                info!(
                    open = self.is_open,
                    step = %self.step,
                    amount = %self.intent.amount,
                    monthly = self.intent.is_monthly,
                    "{event} applied"
                );
            }
            Err(e) => {
                info!(
                    open = self.is_open,
                    step = %self.step,
                    reason = %e,
                    "{event} skipped"
                );
            }
        }
    }

    /// Intent can only change while open and on the amount step
    fn ensure_editable(&self) -> Result<(), ModalError> {
        if !self.is_open {
            return Err(ModalError::Closed);
        }
        if self.step == ModalStep::Payment {
            return Err(ModalError::IntentFrozen);
        }
        Ok(())
    }

    fn ensure_on_step(&self, step: ModalStep, event: &'static str) -> Result<(), ModalError> {
        if !self.is_open {
            return Err(ModalError::Closed);
        }
        if self.step != step {
            return Err(ModalError::InvalidTransition {
                step: self.step,
                event,
            });
        }
        Ok(())
    }
}

impl Default for DonationModal {
    fn default() -> Self {
        Self::new(WidgetConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // test utils

    fn dollars(value: i64) -> Amount {
        Amount::from_major_units(value)
    }

    fn opened(amount: i64) -> DonationModal {
        let mut modal = DonationModal::default();
        modal.open(dollars(amount), None);
        modal
    }

    #[test]
    fn new_modal_is_closed() {
        let modal = DonationModal::default();
        assert!(!modal.is_open());
        assert_eq!(modal.step(), ModalStep::Amount);
        assert!(modal.payment_url().is_none());
    }

    // Open / close

    #[test]
    fn open_sets_intent_and_step() {
        let mut modal = DonationModal::default();
        modal.open(dollars(100), Some("Crazy Socks"));

        assert!(modal.is_open());
        assert_eq!(modal.step(), ModalStep::Amount);
        assert_eq!(modal.intent().amount, dollars(100));
        assert_eq!(modal.intent().campaign.as_deref(), Some("Crazy Socks"));
        assert!(!modal.intent().is_monthly);
    }

    #[test]
    fn open_event_defaults_to_fifty() {
        let mut modal = DonationModal::default();
        modal
            .apply(ModalEvent::Open {
                amount: None,
                campaign: None,
            })
            .unwrap();
        assert_eq!(modal.intent().amount, dollars(50));
    }

    #[test]
    fn open_while_open_overwrites_intent() {
        let mut modal = opened(50);
        modal.set_frequency(true).unwrap();
        modal.open(dollars(250), Some("Camp"));

        assert_eq!(modal.intent().amount, dollars(250));
        assert_eq!(modal.intent().campaign.as_deref(), Some("Camp"));
        assert!(!modal.intent().is_monthly);
    }

    #[test]
    fn close_keeps_intent_readable() {
        let mut modal = opened(50);
        modal.select_preset_amount(dollars(500)).unwrap();
        modal.close();

        assert!(!modal.is_open());
        assert_eq!(modal.intent().amount, dollars(500));
    }

    #[test]
    fn reopen_after_payment_resets_step() {
        let mut modal = opened(50);
        modal.advance().unwrap();
        modal.close();
        modal.open(dollars(25), None);

        assert_eq!(modal.step(), ModalStep::Amount);
        assert!(modal.payment_url().is_none());
        assert_eq!(modal.error(), None);
    }

    // Amount step

    #[test]
    fn preset_and_custom_write_the_same_field() {
        let mut modal = opened(50);
        modal.select_preset_amount(dollars(100)).unwrap();
        assert!(modal.is_selected_preset(dollars(100)));

        modal.set_custom_amount("42.5").unwrap();
        assert_eq!(modal.intent().amount, Amount::from_minor_units(4250));
        assert!(!modal.is_selected_preset(dollars(100)));
    }

    #[test]
    fn custom_field_is_empty_at_opening_preset() {
        let mut modal = opened(50);
        assert_eq!(modal.custom_amount_display(), "");

        modal.select_preset_amount(dollars(100)).unwrap();
        assert_eq!(modal.custom_amount_display(), "100");

        modal.set_custom_amount("50").unwrap();
        assert_eq!(modal.custom_amount_display(), "");
    }

    #[test]
    fn huge_negative_custom_amount_is_rejected() {
        let mut modal = opened(50);
        modal
            .apply(ModalEvent::SetCustomAmount("-99999999999999999999999".into()))
            .unwrap();
        assert_eq!(modal.custom_amount_display(), "-92233720368547758.08");

        assert!(matches!(
            modal.apply(ModalEvent::Advance),
            Err(ModalError::AmountBelowMinimum(_))
        ));
        assert_eq!(modal.error(), Some(AMOUNT_ERROR_MESSAGE));
    }

    #[test]
    fn edits_on_closed_modal_fail() {
        let mut modal = DonationModal::default();
        assert_eq!(
            modal.select_preset_amount(dollars(25)),
            Err(ModalError::Closed)
        );
        assert_eq!(modal.set_frequency(true), Err(ModalError::Closed));
        assert_eq!(modal.advance(), Err(ModalError::Closed));
    }

    // Advance

    #[test]
    fn advance_below_minimum_stays_on_amount() {
        for input in ["0", "0.99", "-5", "", "abc"] {
            let mut modal = opened(50);
            modal.set_custom_amount(input).unwrap();

            let result = modal.advance();
            assert!(matches!(result, Err(ModalError::AmountBelowMinimum(_))));
            assert_eq!(modal.step(), ModalStep::Amount);
            assert_eq!(modal.error(), Some(AMOUNT_ERROR_MESSAGE));
            assert!(modal.payment_url().is_none());
        }
    }

    #[test]
    fn advance_at_or_above_minimum_moves_to_payment() {
        for input in ["1", "1.00", "12.34", "1000"] {
            let mut modal = opened(50);
            modal.set_custom_amount(input).unwrap();

            modal.advance().unwrap();
            assert_eq!(modal.step(), ModalStep::Payment);
            assert!(modal.payment_url().is_some());
        }
    }

    #[test]
    fn advance_clears_previous_error() {
        let mut modal = opened(50);
        modal.set_custom_amount("0").unwrap();
        let _ = modal.advance();
        modal.set_custom_amount("5").unwrap();
        modal.advance().unwrap();
        assert_eq!(modal.error(), None);
    }

    #[test]
    fn advance_from_payment_fails() {
        let mut modal = opened(50);
        modal.advance().unwrap();
        assert_eq!(
            modal.advance(),
            Err(ModalError::InvalidTransition {
                step: ModalStep::Payment,
                event: "advance"
            })
        );
    }

    #[test]
    fn payment_url_carries_amount() {
        let mut modal = opened(50);
        modal.set_custom_amount("75").unwrap();
        modal.set_frequency(true).unwrap();
        modal.advance().unwrap();

        let url = modal.payment_url().unwrap();
        assert!(url.as_str().contains("override_amount=75&"));
        assert!(url.as_str().contains("recurring=false"));
    }

    // Payment step

    #[test]
    fn intent_is_frozen_during_payment() {
        let mut modal = opened(50);
        modal.advance().unwrap();

        assert_eq!(
            modal.select_preset_amount(dollars(1000)),
            Err(ModalError::IntentFrozen)
        );
        assert_eq!(modal.set_custom_amount("3"), Err(ModalError::IntentFrozen));
        assert_eq!(modal.set_frequency(true), Err(ModalError::IntentFrozen));
        assert_eq!(modal.intent().amount, dollars(50));
    }

    #[test]
    fn advance_then_retreat_preserves_intent() {
        let mut modal = opened(50);
        modal.select_preset_amount(dollars(250)).unwrap();
        modal.set_frequency(true).unwrap();
        let before = modal.intent().clone();

        modal.advance().unwrap();
        modal.retreat().unwrap();

        assert_eq!(modal.step(), ModalStep::Amount);
        assert_eq!(modal.intent(), &before);
        assert!(modal.payment_url().is_none());
    }

    #[test]
    fn retreat_from_amount_fails() {
        let mut modal = opened(50);
        assert_eq!(
            modal.retreat(),
            Err(ModalError::InvalidTransition {
                step: ModalStep::Amount,
                event: "retreat"
            })
        );
    }

    // Keyboard

    #[test]
    fn escape_closes_from_amount_step() {
        let mut modal = opened(50);
        modal.handle_key(&Key::Escape).unwrap();
        assert!(!modal.is_open());
    }

    #[test]
    fn escape_closes_from_payment_step() {
        let mut modal = opened(50);
        modal.advance().unwrap();
        modal.handle_key(&Key::Escape).unwrap();
        assert!(!modal.is_open());
        assert!(modal.payment_url().is_none());
    }

    #[test]
    fn other_keys_are_ignored() {
        let mut modal = opened(50);
        modal.handle_key(&Key::Other("Enter".into())).unwrap();
        assert!(modal.is_open());
    }

    #[test]
    fn keys_on_closed_modal_are_skipped() {
        let mut modal = DonationModal::default();
        assert_eq!(modal.handle_key(&Key::Escape), Err(ModalError::Closed));
    }

    //  Async run()

    #[tokio::test]
    async fn run_processes_all_events() {
        let mut modal = DonationModal::default();
        let events = vec![
            ModalEvent::Open {
                amount: Some(dollars(100)),
                campaign: Some("Crazy Socks".into()),
            },
            ModalEvent::SelectPreset(dollars(250)),
            ModalEvent::Advance,
        ];

        modal.run(tokio_stream::iter(events)).await;

        assert_eq!(modal.step(), ModalStep::Payment);
        assert_eq!(modal.intent().amount, dollars(250));
    }

    #[tokio::test]
    async fn run_skips_rejected_events_and_continues() {
        let mut modal = DonationModal::default();
        let events = vec![
            ModalEvent::Advance, // closed, skipped
            ModalEvent::Open {
                amount: None,
                campaign: None,
            },
            ModalEvent::SetCustomAmount("0".into()),
            ModalEvent::Advance, // below minimum, skipped
            ModalEvent::SetCustomAmount("20".into()),
            ModalEvent::Advance,
        ];

        modal.run(tokio_stream::iter(events)).await;

        assert_eq!(modal.step(), ModalStep::Payment);
        assert_eq!(modal.intent().amount, dollars(20));
    }
}
