use std::sync::Arc;

use clap::Args;
use serde_json::{json, Map, Value};

use crate::cli::OutputFormat;
use crate::config;
use crate::email::providers::{
    build_http_client, BulkMailVerifierClient, TruelistClient, VerificationProvider,
};
use crate::email::VerificationOrchestrator;

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(required = true, help = "Email addresses to verify")]
    pub emails: Vec<String>,
}

/// Runs the same orchestrator the server uses, wired straight from the
/// environment. Missing provider credentials surface as an error here, not
/// as an empty result.
pub async fn handle(args: VerifyArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let cfg = config::config();
    let client = build_http_client(cfg.providers.http_timeout_secs)?;

    let provider: Arc<dyn VerificationProvider> = match cfg.providers.verifier.as_str() {
        "bulkmailverifier" => Arc::new(BulkMailVerifierClient::new(client, &cfg.providers)),
        _ => Arc::new(TruelistClient::new(client, &cfg.providers)),
    };
    let provider_name = provider.name();

    let orchestrator = VerificationOrchestrator::new(provider, None, cfg.finder.clone());
    let results = orchestrator.verify_many(&args.emails).await?;

    match output_format {
        OutputFormat::Json => {
            let mut by_email = Map::new();
            for (email, status) in &results {
                by_email.insert(email.clone(), Value::String(status.to_string()));
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "provider": provider_name,
                    "total": results.len(),
                    "results": by_email,
                }))?
            );
        }
        OutputFormat::Text => {
            for (email, status) in &results {
                println!("{:<10}  {}", status.to_string(), email);
            }
        }
    }

    Ok(())
}
