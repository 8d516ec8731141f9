use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use entsoe_client::{EntsoeClient, EntsoeConfig};
use mailer::LoggingTransport;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dataflow::{
    CredentialsProvider, EnvCredentials, EnvUserDirectory, JsonFileDirectory, Pipeline, PipelineConfig,
    UserDirectory,
};

#[derive(Debug, Parser)]
#[command(name = "dataflow")]
#[command(about = "Turn a generation forecast event into a capacity utilization newsletter")]
struct Args {
    /// Event file (envelope with the forecast document). Reads stdin when absent.
    #[arg(long)]
    event_file: Option<PathBuf>,

    /// JSON file with an array of {"name", "email"} recipients.
    /// Falls back to NEWSLETTER_RECIPIENTS env.
    #[arg(long)]
    recipients: Option<PathBuf>,

    /// Log the newsletters instead of sending them
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let raw_event = match &args.event_file {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let directory: Arc<dyn UserDirectory> = match args.recipients {
        Some(path) => Arc::new(JsonFileDirectory::new(path)),
        None => Arc::new(EnvUserDirectory::default()),
    };
    let config = PipelineConfig::from_env()?;
    let credentials = EnvCredentials;

    let pipeline = if args.dry_run {
        let api_key = credentials.entsoe_api_key().await?;
        let client = EntsoeClient::new(EntsoeConfig::from_env(api_key)?)?;
        Pipeline::new(Arc::new(client), directory, Arc::new(LoggingTransport), config)
    } else {
        Pipeline::from_credentials(&credentials, directory, config).await?
    };

    let summary = pipeline.run(&raw_event).await?;

    info!(
        region = %summary.region,
        generation_type = %summary.report.title,
        degraded = summary.report.is_degraded(),
        delivered = summary.dispatch.delivered.len(),
        failed = summary.dispatch.failed.len(),
        "Run complete"
    );
    println!("{}", summary.report.chart_text());

    Ok(())
}
