use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Parser, Subcommand};
use sentix_ai::config::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use sentix_ai::{ClientConfig, GeminiClient};
use sentix_core::export::DEFAULT_EXPORT_FILE;
use sentix_core::{HistoryQuery, SentimentLabel, from_csv, to_csv};
use sentix_pipeline::{Analyzer, DEFAULT_MIN_CHARS};
use sentix_store::HistoryStore;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

mod display;
mod session;

/// Length of the dashboard trend. The trend is the tail of the
/// most-recent-first history, so it shows the oldest entries.
const TREND_WINDOW: usize = 10;

#[derive(Parser)]
#[command(name = "sentix", version)]
#[command(about = "Customer feedback sentiment analysis")]
struct Cli {
    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Model used for classification
    #[arg(long, env = "SENTIX_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// Base URL of the generative language API
    #[arg(long, env = "SENTIX_ENDPOINT", default_value = DEFAULT_ENDPOINT, global = true)]
    endpoint: String,

    /// Give up on a classification after this many seconds
    #[arg(long, default_value_t = 60, global = true)]
    timeout_secs: u64,

    /// Minimum characters of feedback text, after trimming
    #[arg(long, default_value_t = DEFAULT_MIN_CHARS, global = true)]
    min_chars: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one piece of feedback
    Analyze {
        /// Feedback text; multiple words are joined with spaces
        #[arg(required = true)]
        text: Vec<String>,

        /// Print the record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Read feedback line by line from stdin
    Session {
        /// Start from a previous CSV export instead of the sample records
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// Summary, label distribution and confidence trend
    Dashboard {
        #[arg(long)]
        from: Option<PathBuf>,
    },

    /// List history entries
    Log {
        #[command(flatten)]
        filter: Filter,
    },

    /// Write history entries as CSV
    Export {
        #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
        out: PathBuf,

        #[command(flatten)]
        filter: Filter,
    },
}

#[derive(clap::Args)]
struct Filter {
    /// Only records with this label (Positive, Neutral, Negative)
    #[arg(long)]
    label: Option<SentimentLabel>,

    /// Case-insensitive text search
    #[arg(long, default_value = "")]
    search: String,

    /// Read history from a previous CSV export instead of the sample records
    #[arg(long)]
    from: Option<PathBuf>,
}

impl Filter {
    fn query(&self) -> HistoryQuery {
        HistoryQuery::new()
            .with_label(self.label)
            .with_term(self.search.as_str())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("sentix v{}", env!("CARGO_PKG_VERSION"));

    match &cli.command {
        Commands::Analyze { text, json } => {
            let analyzer = build_analyzer(&cli)?;
            let mut store = HistoryStore::seeded(Utc::now())?;
            let cancel = cancel_on_ctrl_c();

            let record = analyzer
                .submit(&text.join(" "), &mut store, &cancel)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;

            if *json {
                println!("{}", serde_json::to_string_pretty(&record)?);
            } else {
                display::print_record_card(&record);
            }
            Ok(())
        }
        Commands::Session { from } => {
            let analyzer = build_analyzer(&cli)?;
            let store = load_history(from.as_deref())?;
            let input = tokio::io::BufReader::new(tokio::io::stdin());
            let store = session::run(analyzer, store, input).await?;
            println!("Session closed with {} records.", store.len());
            Ok(())
        }
        Commands::Dashboard { from } => {
            let store = load_history(from.as_deref())?;
            let stats = store.stats();
            display::print_stats(&stats);
            println!();
            display::print_distribution(&stats);
            println!();
            let trend: Vec<_> = store.suffix(TREND_WINDOW).collect();
            display::print_trend(&trend);
            Ok(())
        }
        Commands::Log { filter } => {
            let store = load_history(filter.from.as_deref())?;
            display::print_log(&store.search(&filter.query()));
            Ok(())
        }
        Commands::Export { out, filter } => {
            let store = load_history(filter.from.as_deref())?;
            let records = store.search(&filter.query());
            std::fs::write(out, to_csv(records.iter().copied()))
                .with_context(|| format!("writing {}", out.display()))?;
            info!(path = %out.display(), records = records.len(), "history exported");
            println!("Exported {} records to {}", records.len(), out.display());
            Ok(())
        }
    }
}

fn build_analyzer(cli: &Cli) -> Result<Analyzer<GeminiClient>> {
    let mut config = ClientConfig::default()
        .with_model(cli.model.as_str())
        .with_endpoint(cli.endpoint.as_str())
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    if let Some(key) = &cli.api_key {
        config = config.with_api_key(key.as_str());
    }
    let client = GeminiClient::new(config).context("building classification client")?;
    Ok(Analyzer::new(client).with_min_chars(cli.min_chars))
}

/// The sample history, or the records of a previous export.
fn load_history(from: Option<&Path>) -> Result<HistoryStore> {
    let Some(path) = from else {
        return Ok(HistoryStore::seeded(Utc::now())?);
    };
    let input =
        std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let records = from_csv(&input).with_context(|| format!("parsing {}", path.display()))?;
    info!(path = %path.display(), records = records.len(), "history loaded");
    HistoryStore::with_records(records).context("loading history")
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            trigger.cancel();
        }
    });
    cancel
}
