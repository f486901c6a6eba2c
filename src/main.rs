use std::env;
use std::io::{self, Write};
use std::process;
use std::sync::Arc;

use donation_flow::config::Config;
use donation_flow::modal::DonationModal;
use donation_flow::session::{read_session, write_state};
use donation_flow::thank_you::{Reconciler, ThankYouParams, ThankYouView};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;
use url::Url;

const USAGE: &str =
    "usage: donation-flow session <events.csv> | donation-flow thank-you <url-or-query>";

#[tokio::main]
async fn main() {
    // a missing .env file is fine; loaded first so it can set RUST_LOG
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let mut args = env::args().skip(1);
    let (Some(command), Some(target)) = (args.next(), args.next()) else {
        eprintln!("{USAGE}");
        process::exit(2);
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            process::exit(2);
        }
    };

    match command.as_str() {
        "session" => run_session(target, config).await,
        "thank-you" => run_thank_you(&target, &config).await,
        _ => {
            eprintln!("{USAGE}");
            process::exit(2);
        }
    }
}

async fn run_session(path: String, config: Config) {
    if !path.ends_with(".csv") {
        warn!(path, "session file seems to not be a csv file");
    }

    let events = match read_session(path.clone()) {
        Ok(events) => events,
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    };

    let mut modal = DonationModal::new(config.widget);
    let (event_sender, event_receiver) = tokio::sync::mpsc::channel(16);

    tokio::spawn(async move {
        for result in events {
            match result {
                Ok(event) => {
                    if event_sender.send(event).await.is_err() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("{e}");
                }
            }
        }
    });

    modal.run(ReceiverStream::new(event_receiver)).await;

    if let Err(e) = write_state(io::stdout().lock(), &modal) {
        error!("failed to write session state: {e}");
        process::exit(1);
    }
}

async fn run_thank_you(target: &str, config: &Config) {
    let params = match Url::parse(target) {
        Ok(url) => ThankYouParams::from_url(&url),
        Err(_) => ThankYouParams::from_query(target),
    };

    let reconciler = Arc::new(Reconciler::from_config(config, reqwest::Client::new()));
    let mut view = ThankYouView::mount(params, reconciler);
    let outcome = view.resolved().await;

    let mut stdout = io::stdout().lock();
    if let Err(e) = write!(stdout, "{outcome}") {
        error!("failed to write confirmation: {e}");
        process::exit(1);
    }
}
