use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

pub fn handle(user_id: i64, email: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let claims = Claims::new(email, user_id);
    let token = generate_jwt(&claims)?;

    match output_format {
        OutputFormat::Text => println!("{}", token),
        OutputFormat::Json => output_success(
            &output_format,
            "Token created",
            Some(json!({ "token": token, "expires_at": claims.exp })),
        )?,
    }
    Ok(())
}
