//! Thin HTTP wrapper over the gateway's `/v1/*` surface (§6.1), replacing
//! the teacher's `aws-sdk-s3`-based `s3_client.rs` — this client talks the
//! control plane's own JSON API directly rather than an S3-SigV4 surface,
//! since the S3 façade itself is explicitly out of CLI scope (§1, §6.4).

use anyhow::Result;
use reqwest::{Method, RequestBuilder, Response};

use crate::config::Config;

pub struct GatewayClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl GatewayClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: config.endpoint.trim_end_matches('/').to_string(),
            token: config.token.clone(),
        }
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut req = self.http.request(method, format!("{}{path}", self.base));
        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }
        req
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.request(Method::GET, path).send().await?)
    }

    pub async fn head(&self, path: &str) -> Result<Response> {
        Ok(self.request(Method::HEAD, path).send().await?)
    }

    pub async fn post(&self, path: &str) -> Result<Response> {
        Ok(self.request(Method::POST, path).send().await?)
    }

    pub async fn post_json<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response> {
        Ok(self.request(Method::POST, path).json(body).send().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        Ok(self.request(Method::DELETE, path).send().await?)
    }
}

/// §6.4 "non-zero otherwise mirrors HTTP error status": success collapses
/// to 0, any other response's exit code is its HTTP status verbatim (the
/// shell truncates to a byte, same as any other process exit code).
pub fn exit_code_for_status(status: reqwest::StatusCode) -> i32 {
    if status.is_success() || status.is_redirection() {
        0
    } else {
        status.as_u16() as i32
    }
}
