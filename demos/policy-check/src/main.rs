//! Evaluates a JSON payload against governance policies from the command line.
//!
//! ```text
//! echo '{"email": "a@b.com"}' | policy-check --policy templates/policies --action send
//! ```
//!
//! With the signing key variable set (`WARDEN_SIGNING_KEY` unless the config
//! says otherwise) a signed receipt is stored and verified as well.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use warden::config::{ConfigError, GovernanceConfig};
use warden::policy::{EvaluationRequest, PolicyLoader};
use warden::primitives::Payload;
use warden::telemetry::tracing_support;

#[derive(Debug, Parser)]
#[command(
    name = "policy-check",
    version,
    about = "Evaluate a JSON payload against governance policies"
)]
struct Cli {
    /// Governance config file (YAML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Extra policy file or directory. May be repeated.
    #[arg(long = "policy")]
    policies: Vec<PathBuf>,

    /// JSON object to evaluate, or `-` for stdin.
    #[arg(long, default_value = "-")]
    payload: String,

    /// Agent identifier recorded on the request.
    #[arg(long, default_value = "cli-agent")]
    agent: String,

    /// Action name recorded on the request.
    #[arg(long, default_value = "check")]
    action: String,

    /// Force PII auto-redaction for this evaluation.
    #[arg(long)]
    force_redaction: bool,

    /// Store receipts as files under this directory.
    #[arg(long)]
    receipt_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GovernanceConfig::from_path(path)?,
        None => GovernanceConfig::default(),
    };
    if cli.receipt_dir.is_some() {
        config.receipts.store_dir.clone_from(&cli.receipt_dir);
    }
    tracing_support::init(&config.telemetry)?;

    let engine = config.build_engine()?;
    for path in &cli.policies {
        for policy in PolicyLoader::load_path(path)? {
            engine.add_policy(policy);
        }
    }
    engine.start();

    let payload = read_payload(&cli.payload)?;
    let request = EvaluationRequest::new(cli.agent.as_str(), cli.action.as_str()).with_payload(payload);
    let result = if cli.force_redaction {
        engine.evaluate_with_redaction(&request)
    } else {
        engine.evaluate(&request)
    };
    println!("{}", serde_json::to_string_pretty(&result)?);

    match config.receipt_generator() {
        Ok(generator) => {
            let receipt = generator.create_receipt(&result, &request, &engine.policy_names());
            let store = config.receipt_store().await?;
            store.save(&receipt).await?;
            let stored = store.require(&receipt.receipt_id).await?;
            info!(
                receipt_id = %stored.receipt_id,
                verified = generator.verify(&stored),
                "receipt stored"
            );
            println!("{}", serde_json::to_string_pretty(&stored)?);
        }
        Err(ConfigError::MissingSigningKey { var }) => {
            warn!(var = var.as_str(), "no signing key set; receipt skipped");
        }
        Err(err) => return Err(err.into()),
    }

    engine.stop();
    Ok(if result.decision().is_deny() {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    })
}

fn read_payload(source: &str) -> Result<Payload> {
    let text = if source == "-" {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .context("failed to read payload from stdin")?;
        buffer
    } else {
        std::fs::read_to_string(source).with_context(|| format!("failed to read {source}"))?
    };

    serde_json::from_str(&text).context("payload must be a JSON object")
}
