use clap::Args;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::email::patterns::generate_candidates;

#[derive(Args)]
pub struct PatternsArgs {
    #[arg(help = "First name")]
    pub first_name: String,

    #[arg(help = "Last name")]
    pub last_name: Option<String>,

    #[arg(long, help = "Email domain, e.g. example.com")]
    pub domain: String,

    #[arg(long, default_value_t = 20, help = "Maximum number of candidates")]
    pub count: usize,
}

pub async fn handle(args: PatternsArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let last_name = args.last_name.unwrap_or_default();
    let candidates = generate_candidates(&args.first_name, &last_name, &args.domain, args.count);

    match output_format {
        OutputFormat::Json => {
            let emails: Vec<&str> = candidates.iter().map(|c| c.email.as_str()).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "count": emails.len(),
                    "candidates": emails,
                }))?
            );
        }
        OutputFormat::Text => {
            if candidates.is_empty() {
                println!("No candidates (a first name and a domain are required)");
            }
            for candidate in &candidates {
                println!("{:>3}  {}", candidate.priority, candidate.email);
            }
        }
    }

    Ok(())
}
