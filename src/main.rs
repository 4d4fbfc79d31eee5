use std::io;
use std::process::ExitCode;

use consign_pricing::config::{Command, Config, USAGE};
use consign_pricing::csv::{
    CsvError, read_events, read_line_items, write_quote, write_sellers, write_summary,
};
use consign_pricing::{Cart, Flow, Ledger};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio_stream::wrappers::ReceiverStream;
use tracing::level_filters::LevelFilter;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Csv(#[from] CsvError),

    #[error("csv reader task failed: {0}")]
    Reader(#[from] JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(io::stderr)
        .init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    if config.path.extension().is_none_or(|ext| ext != "csv") {
        warn!(path = %config.path.display(), "input file seems to not be a csv file");
    }

    let result = match config.command {
        Command::Quote(flow) => quote(flow, &config).await,
        Command::Sellers => match run_ledger(&config).await {
            Ok(ledger) => {
                write_sellers(ledger.sellers(), io::stdout().lock()).map_err(RunError::from)
            }
            Err(e) => Err(e),
        },
        Command::Summary => match run_ledger(&config).await {
            Ok(ledger) => {
                write_summary(ledger.summary(), io::stdout().lock()).map_err(RunError::from)
            }
            Err(e) => Err(e),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

/// Price the line items of the input file and print the quote
async fn quote(flow: Flow, config: &Config) -> Result<(), RunError> {
    let items = read_line_items(config.path.clone())?;
    let (sender, receiver) = mpsc::channel(16);
    let reader = tokio::spawn(forward(items, sender));

    let mut cart = Cart::new(flow, config.session.fee_rule(flow));
    cart.set_discount(config.discount);
    cart.fill(ReceiverStream::new(receiver)).await;
    join_reader(reader).await?;

    write_quote(&cart.quote(), io::stdout().lock())?;
    Ok(())
}

/// Feed every event of the input file to a fresh ledger
async fn run_ledger(config: &Config) -> Result<Ledger, RunError> {
    let events = read_events(config.path.clone())?;
    let (sender, receiver) = mpsc::channel(16);
    let reader = tokio::spawn(forward(events, sender));

    let mut ledger = Ledger::new(config.session);
    ledger.run(ReceiverStream::new(receiver)).await;
    join_reader(reader).await?;
    Ok(ledger)
}

/// Wait for the reader task. A reader that panicked has dropped its sender
/// early, so whatever was consumed is incomplete.
async fn join_reader(reader: JoinHandle<()>) -> Result<(), RunError> {
    reader.await?;
    Ok(())
}

/// Send parsed rows to the consumer, warning about the ones that failed
async fn forward<T: Send + 'static>(
    rows: impl Iterator<Item = Result<T, CsvError>> + Send + 'static,
    sender: mpsc::Sender<T>,
) {
    for result in rows {
        match result {
            Ok(row) => {
                if sender.send(row).await.is_err() {
                    break;
                }
            }
            Err(e) => {
                warn!("{e}");
            }
        }
    }
}
