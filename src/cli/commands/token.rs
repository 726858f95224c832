use clap::Args;
use serde_json::json;
use uuid::Uuid;

use crate::access::Role;
use crate::auth::{generate_jwt, Claims};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Args)]
pub struct TokenArgs {
    #[arg(help = "Email claim")]
    pub email: String,

    #[arg(
        long,
        default_value = "free_user",
        help = "Role claim (public, free_user, pro_user, admin, super_admin)"
    )]
    pub role: Role,

    #[arg(long, help = "User id claim; random when omitted")]
    pub user_id: Option<Uuid>,
}

/// Signs with the JWT_SECRET from the environment, so the token is accepted
/// by a server running against the same secret. The user does not have to
/// exist until the token is presented.
pub async fn handle(args: TokenArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let user_id = args.user_id.unwrap_or_else(Uuid::new_v4);
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    let token = generate_jwt(Claims::new(user_id, args.email.clone(), args.role))?;

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    "token": token,
                    "user_id": user_id,
                    "email": args.email,
                    "role": args.role,
                    "expires_in": expires_in,
                }))?
            );
        }
        OutputFormat::Text => {
            println!("user_id:    {}", user_id);
            println!("role:       {}", args.role);
            println!("expires_in: {}s", expires_in);
            println!("{}", token);
        }
    }

    Ok(())
}
