//! HTTP client pool for maintaining persistent connections per base URL.
//!
//! Every downstream microservice and the LLM endpoint get their own
//! `reqwest::Client`, so connections, DNS lookups and TLS sessions are reused
//! across tool calls instead of being rebuilt per request.
//!
//! Clients are keyed by `(base_url, timeout)` so a service configured with a
//! different request timeout never shares a client with one that is not.

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

lazy_static! {
    /// Global HTTP client pool, lazily initialized on first access.
    static ref HTTP_CLIENT_POOL: Mutex<HashMap<(String, u64), reqwest::Client>> =
        Mutex::new(HashMap::new());
}

/// Request timeout used when callers do not pick one.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Get or create a shared HTTP client for the given base URL.
///
/// # Arguments
/// * `base_url` - The base URL for which to get/create an HTTP client
/// * `timeout_secs` - Whole-request timeout applied by the client
///
/// # Returns
/// A cloned `reqwest::Client`; clones share the same connection pool.
pub fn get_or_create_client(base_url: &str, timeout_secs: u64) -> reqwest::Client {
    let key = (base_url.to_string(), timeout_secs);
    // A poisoned pool still holds valid clients.
    let mut pool = match HTTP_CLIENT_POOL.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };

    if let Some(client) = pool.get(&key) {
        return client.clone();
    }

    let client = create_pooled_client(timeout_secs);
    pool.insert(key, client.clone());
    client
}

/// Number of distinct clients currently pooled.
pub fn pooled_client_count() -> usize {
    HTTP_CLIENT_POOL.lock().map(|pool| pool.len()).unwrap_or(0)
}

/// Creates a new reqwest client with connection pooling settings.
///
/// - `pool_idle_timeout(90s)`: keeps idle connections alive
/// - `pool_max_idle_per_host(10)`
/// - `tcp_keepalive(60s)`
/// - `connect_timeout(10s)` plus the whole-request `timeout`
fn create_pooled_client(timeout_secs: u64) -> reqwest::Client {
    let builder = reqwest::ClientBuilder::new()
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .pool_max_idle_per_host(10)
        .tcp_keepalive(Some(Duration::from_secs(60)))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(timeout_secs));

    match builder.build() {
        Ok(client) => client,
        Err(e) => {
            log::error!(
                "chatgate::http_client_pool: failed to build tuned HTTP client ({}), using defaults",
                e
            );
            reqwest::Client::new()
        }
    }
}
