use url::Url;

use crate::model::DonationIntent;

pub const DEFAULT_WIDGET_URL: &str =
    "https://secure.givelively.org/donate/koenig-childhood-cancer-foundation";
pub const DEFAULT_WIDGET_PAGE_URL: &str = "https://thekccf.org/donate/";
pub const DEFAULT_REFERRER_URL: &str = "https://thekccf.org/";

/// Where the hosted payment widget lives and the metadata it is given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WidgetConfig {
    pub base_url: Url,
    pub widget_page_url: Url,
    pub referrer_url: Url,
    /// Send `recurring=true` for monthly intents. Off unless explicitly enabled.
    pub recurring_follows_frequency: bool,
}

impl WidgetConfig {
    /// Build the embedded widget URL for a frozen intent.
    pub fn payment_url(&self, intent: &DonationIntent) -> Url {
        let recurring = self.recurring_follows_frequency && intent.is_monthly;

        let mut url = self.base_url.clone();
        url.set_query(None);
        url.query_pairs_mut()
            .append_pair("recurring", if recurring { "true" } else { "false" })
            .append_pair("override_amount", &intent.amount.to_query_value())
            .append_pair("dedication_name", "")
            .append_pair("dedication_email", "")
            .append_pair("dedication_type", "")
            .append_pair("widget_type", "simple_donation")
            .append_pair("widget_url", self.widget_page_url.as_str())
            .append_pair("referrer_url", self.referrer_url.as_str())
            .append_pair("isWixEmbedded", "false");
        url
    }
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse(DEFAULT_WIDGET_URL).expect("default widget url is valid"),
            widget_page_url: Url::parse(DEFAULT_WIDGET_PAGE_URL)
                .expect("default widget page url is valid"),
            referrer_url: Url::parse(DEFAULT_REFERRER_URL).expect("default referrer url is valid"),
            recurring_follows_frequency: false,
        }
    }
}
