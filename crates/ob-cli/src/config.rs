//! Client configuration: just the gateway endpoint and an optional bearer
//! token (§6.1 `auth.rs`'s `extract_bearer_token` is the only credential
//! surface this store recognizes — there is no SigV4/access-key concept
//! here, since the auth manager proper is an explicit Non-goal, §1).

#[derive(Debug, Clone)]
pub struct Config {
    pub endpoint: String,
    pub token: Option<String>,
}

impl Config {
    pub fn load(endpoint_override: Option<String>, token_override: Option<String>) -> Self {
        let endpoint = endpoint_override
            .or_else(|| std::env::var("AIS_ENDPOINT").ok())
            .unwrap_or_else(|| "http://127.0.0.1:51080".to_string());
        let token = token_override.or_else(|| std::env::var("AIS_TOKEN").ok());
        Self { endpoint, token }
    }
}
