//! `pez` command-line tool.
//!
//! Evaluates an `XPath` expression against an HTML document read from a
//! file, a URL, or standard input, and prints the matching nodes.

use std::error::Error as _;
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use pez::{FetchOptions, Pipeline, Query};

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// pez -- evaluate XPath expressions against HTML documents.
#[derive(Parser, Debug)]
#[command(name = "pez", version, about, long_about = None)]
struct Cli {
    /// Namespace declarations, as a space-separated list of `prefix=uri`
    /// pairs.
    #[arg(short = 'N', value_name = "LIST")]
    namespaces: Option<String>,

    /// Log more (repeat for more detail). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Give up on URL sources after this many seconds.
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// The XPath 1.0 expression to evaluate.
    #[allow(clippy::doc_markdown)]
    #[arg(value_name = "XPATH")]
    expression: String,

    /// File path or URL to read; `-` or nothing reads standard input.
    #[arg(value_name = "SOURCE")]
    source: Option<String>,
}

// ---------------------------------------------------------------------------
// Main entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut query = Query::new(&cli.expression);
    query.namespaces = cli.namespaces;
    query.source = cli.source;

    let options = FetchOptions::default().timeout(cli.timeout.map(Duration::from_secs));
    let pipeline = Pipeline::new(options);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    match pipeline.run(&query, io::stdin().lock(), &mut out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let _ = out.flush();
            report(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

/// Writes `Error: <message>` and each underlying cause to stderr.
fn report(error: &pez::Error) {
    let mut stderr = io::stderr().lock();
    let _ = writeln!(stderr, "Error: {error}");
    let mut source = error.source();
    while let Some(cause) = source {
        let _ = writeln!(stderr, "  caused by: {cause}");
        source = cause.source();
    }
}
