use clap::{ArgAction, Parser};
use lambda_flow::WireResponse;
use lambda_flow::infrastructure::completion;
use lambda_flow::interfaces::invoke::{EventReader, pipeline};
use miette::{IntoDiagnostic, Result};
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Inbound event JSON file (`-` reads from stdin)
    event: PathBuf,

    /// Execution context JSON file. Defaults to an empty object.
    #[arg(long)]
    context: Option<PathBuf>,

    /// Header the sample chain requires before answering.
    #[arg(long, env = "LAMBDA_FLOW_AUTH_HEADER", default_value = "authorization")]
    auth_header: String,

    /// Pretty-print the wire response
    #[arg(long)]
    pretty: bool,

    /// Increase log verbosity (ignored when RUST_LOG is set)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let event = EventReader::open(&cli.event)
        .and_then(EventReader::read)
        .into_diagnostic()?;
    let context: Value = match &cli.context {
        Some(path) => EventReader::open(path)
            .and_then(EventReader::read)
            .into_diagnostic()?,
        None => json!({}),
    };

    let (callback, receiver) = completion::channel::<WireResponse>();
    let mut flow = pipeline::build(event, context, &cli.auth_header, callback);
    let status = flow.execute();
    info!(?status, "flow finished");
    // A stalled chain drops its callback here, which the receiver reports.
    drop(flow);

    let response = completion::wait(receiver).await.into_diagnostic()?;
    let rendered = if cli.pretty {
        serde_json::to_string_pretty(&response)
    } else {
        serde_json::to_string(&response)
    }
    .into_diagnostic()?;
    println!("{}", rendered);

    Ok(())
}
