use crate::api::{self, ApiConfig};
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

#[derive(Debug)]
pub struct Args {
    pub dsn: SecretString,
    pub api: ApiConfig,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the database is unreachable or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server config: {:?}", args.api);

    api::new(args.dsn, args.api).await
}
