use std::time::Duration;

/// SurrealDB connection options
#[derive(Clone, Debug)]
pub struct SurrealOpts {
    pub endpoint: String,
    pub username: String,
    pub password: String,
    pub namespace: String,
    pub database: String,
}

/// Default number of connection retry attempts
const DEFAULT_RETRY_ATTEMPTS: u32 = 5;
/// Default delay between retry attempts in seconds
const DEFAULT_RETRY_DELAY_SECS: u64 = 2;

pub async fn surreal_connect(
    opts: &SurrealOpts,
) -> anyhow::Result<surrealdb::Surreal<surrealdb::engine::any::Any>> {
    surreal_connect_with_retries(opts, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_DELAY_SECS).await
}

/// Connect to SurrealDB, retrying up to `max_retries` times with
/// `retry_delay_secs` between attempts so a server that is still starting
/// up does not fail the pass.
pub async fn surreal_connect_with_retries(
    opts: &SurrealOpts,
    max_retries: u32,
    retry_delay_secs: u64,
) -> anyhow::Result<surrealdb::Surreal<surrealdb::engine::any::Any>> {
    // Convert http:// to ws:// for WebSocket connection
    let endpoint = opts
        .endpoint
        .replace("http://", "ws://")
        .replace("https://", "wss://");

    tracing::debug!(
        "Connecting to SurrealDB at {} (namespace: {}, database: {})",
        endpoint,
        opts.namespace,
        opts.database
    );

    let attempts = max_retries.max(1);
    let mut attempt = 1;
    loop {
        match try_connect(&endpoint, opts).await {
            Ok(surreal) => {
                if attempt > 1 {
                    tracing::info!(
                        "Successfully connected to SurrealDB after {} attempts",
                        attempt
                    );
                }
                return Ok(surreal);
            }
            Err(e) if attempt < attempts => {
                tracing::warn!(
                    "Failed to connect to SurrealDB at '{}' (attempt {}/{}): {}. Retrying in {}s...",
                    endpoint,
                    attempt,
                    attempts,
                    e,
                    retry_delay_secs
                );
                tokio::time::sleep(Duration::from_secs(retry_delay_secs)).await;
                attempt += 1;
            }
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to connect to SurrealDB at '{}' after {} attempts. Last error: {}",
                    endpoint,
                    attempts,
                    e
                ));
            }
        }
    }
}

/// Attempt a single connection to SurrealDB.
async fn try_connect(
    endpoint: &str,
    opts: &SurrealOpts,
) -> anyhow::Result<surrealdb::Surreal<surrealdb::engine::any::Any>> {
    let surreal = surrealdb::engine::any::connect(endpoint)
        .await
        .map_err(|e| anyhow::anyhow!("SurrealDB connection to '{endpoint}' failed: {e}"))?;

    // Embedded in-memory engines have no root user to sign in as.
    if !endpoint.starts_with("mem://") {
        let username = &opts.username;
        surreal
            .signin(surrealdb::opt::auth::Root {
                username,
                password: &opts.password,
            })
            .await
            .map_err(|e| {
                anyhow::anyhow!("SurrealDB authentication failed (user: '{username}'): {e}")
            })?;
    }

    let (ns, db) = (&opts.namespace, &opts.database);
    surreal.use_ns(ns).use_db(db).await.map_err(|e| {
        anyhow::anyhow!("SurrealDB failed to select namespace '{ns}' / database '{db}': {e}")
    })?;

    Ok(surreal)
}
