use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const CLIENT_USER_AGENT: &str = concat!("f1_terminal/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();
static TIMEOUT: OnceCell<Duration> = OnceCell::new();

/// Sets the request timeout. Only the first call wins, and only if it happens
/// before the client is first used.
pub fn configure_timeout(timeout: Duration) {
    let _ = TIMEOUT.set(timeout);
}

pub fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        let timeout = TIMEOUT
            .get()
            .copied()
            .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS));
        Client::builder()
            .timeout(timeout)
            .user_agent(CLIENT_USER_AGENT)
            .build()
            .context("failed to build http client")
    })
}
