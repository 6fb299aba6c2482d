use crate::api;
use crate::cli::{actions::Action, globals::GlobalArgs};
use anyhow::{Context, Result};
use url::Url;

/// Handle the server action
///
/// # Errors
///
/// Returns an error if the DSN is malformed or the server fails to start.
pub async fn handle(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Server { port, dsn } => {
            // Surface a malformed DSN here instead of from inside the pool
            let dsn = Url::parse(&dsn).context("invalid database DSN")?;

            api::new(port, dsn.as_str(), globals).await?;
        }
    }

    Ok(())
}
