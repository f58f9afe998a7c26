//! Outbound HTTP transport for control-plane traffic: metasync delivery,
//! keepalive pings, and remote-bucket HEAD lookups. Grounded on
//! `hafiz-cluster/src/transport.rs` (`ClusterTransport`, exponential-backoff
//! `send_with_retry`/`send_once` pair); generalized from per-object fetch/
//! upload calls to the generic `(url, json-body) -> json-response` shape
//! the control plane needs.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::error::{ClusterError, ClusterResult};

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(100),
        }
    }
}

/// Wraps a pooled `reqwest::Client` with the bounded per-recipient retry
/// discipline metasync and keepalive both need (§4.1, §4.1 "Failure
/// semantics", §5 "Retry policy").
pub struct Transport {
    client: Client,
    config: TransportConfig,
}

impl Transport {
    pub fn new(config: TransportConfig) -> ClusterResult<Self> {
        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// POST `body` to `url`, retrying up to `config.max_retries` times with
    /// exponential backoff. Used for metasync delivery and vote/prepare
    /// messages — the two legs spec §4.1/§7 calls out as per-recipient
    /// retried.
    pub async fn post_with_retry<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> ClusterResult<T> {
        let mut last_error = None;
        let mut delay = self.config.retry_base_delay;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                debug!(attempt, url, "retrying control-plane POST");
                tokio::time::sleep(delay).await;
                delay *= 2;
            }
            match self.post_once::<B, T>(url, body).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    warn!(attempt, url, error = %e, "control-plane POST failed");
                    last_error = Some(e);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| ClusterError::Transport("no attempts made".into())))
    }

    /// Single POST attempt, no retry — used when the caller has its own
    /// retry envelope (e.g. `with_retry` polling a peer for `ic-bundle`).
    pub async fn post_once<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> ClusterResult<T> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    /// POST that decodes the body regardless of status code, returning the
    /// status alongside it. Needed for metasync/vote calls, where a 409
    /// conflict still carries a meaningful JSON body (the recipient's own
    /// cluster-info, §4.1 "Recipients that themselves claim primary respond
    /// with HTTP conflict and a self-description of their own cluster
    /// info").
    pub async fn post_with_status<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> ClusterResult<(u16, T)> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let parsed = response
            .json()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        Ok((status, parsed))
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> ClusterResult<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ClusterResult<T> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClusterError::Transport(format!(
                "request failed with status {status}: {body}"
            )));
        }
        response
            .json()
            .await
            .map_err(|e| ClusterError::Transport(e.to_string()))
    }

    /// Liveness probe (§4.1 "Keepalive"); returns elapsed round-trip time.
    pub async fn ping(&self, url: &str) -> ClusterResult<Duration> {
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        match response {
            Ok(r) if r.status().is_success() => Ok(start.elapsed()),
            Ok(r) => Err(ClusterError::NodeUnreachable(format!(
                "ping failed with status {}",
                r.status()
            ))),
            Err(e) => Err(ClusterError::NodeUnreachable(e.to_string())),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport").field("config", &self.config).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_config_default_matches_cplane_timeouts() {
        let config = TransportConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
    }
}
