//! Bucket identity (§3 "Bucket identity") grounded on
//! `original_source/cmn/bck.go` (`Ns`, `Bck`, `Uname`/`MakeUname`/`Validate`).

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Closed provider enumeration (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ais,
    Aws,
    Gcp,
    Azure,
    Hdfs,
    Http,
}

impl Provider {
    /// Aliases the original normalizes (`s3`→`aws`, `gs`→`gcp`, `az`→`azure`)
    /// plus the empty-string-defaults-to-ais rule used by the router's
    /// "easy URL" prefixes (§6.1) and by bucket-ref parsing (§4.3 step 2).
    pub fn normalize(raw: &str) -> Result<Self> {
        Ok(match raw {
            "" | "ais" => Provider::Ais,
            "aws" | "s3" => Provider::Aws,
            "gcp" | "gs" => Provider::Gcp,
            "azure" | "az" => Provider::Azure,
            "hdfs" => Provider::Hdfs,
            "http" | "https" => Provider::Http,
            other => return Err(Error::InvalidArgument(format!("unknown provider {other:?}"))),
        })
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Ais => "ais",
            Provider::Aws => "aws",
            Provider::Gcp => "gcp",
            Provider::Azure => "azure",
            Provider::Hdfs => "hdfs",
            Provider::Http => "http",
        }
    }

    pub fn is_remote(&self) -> bool {
        !matches!(self, Provider::Ais)
    }

    pub fn is_cloud(&self) -> bool {
        matches!(self, Provider::Aws | Provider::Gcp | Provider::Azure)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Namespace: global, or `(uuid, name)` identifying a remote AIS cluster
/// plus an optional sub-namespace (§3). `"@#"` is the global sentinel used
/// by `Ns::Uname` in the original.
const NS_GLOBAL_UNAME: &str = "@#";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ns {
    pub uuid: String,
    pub name: String,
}

impl Ns {
    pub fn global() -> Self {
        Self::default()
    }

    pub fn remote(uuid: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uuid: uuid.into(),
            name: name.into(),
        }
    }

    pub fn is_global(&self) -> bool {
        self.uuid.is_empty() && self.name.is_empty()
    }

    /// `@{uuid}#{name}`, or the `"@#"` sentinel for the global namespace.
    pub fn uname(&self) -> String {
        if self.is_global() {
            return NS_GLOBAL_UNAME.to_string();
        }
        format!("@{}#{}", self.uuid, self.name)
    }

    pub fn validate(&self) -> Result<()> {
        if self.uuid.is_empty() && !self.name.is_empty() {
            return Err(Error::InvalidArgument(
                "namespace name without uuid".into(),
            ));
        }
        Ok(())
    }
}

/// Bucket identity (§3): `(provider, namespace, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bck {
    pub name: String,
    pub provider: Provider,
    pub ns: Ns,
}

impl Bck {
    pub fn new(name: impl Into<String>, provider: Provider, ns: Ns) -> Self {
        Self {
            name: name.into(),
            provider,
            ns,
        }
    }

    pub fn ais(name: impl Into<String>) -> Self {
        Self::new(name, Provider::Ais, Ns::global())
    }

    /// Bucket names must be non-empty, non-`.`, and alphanumeric plus
    /// dot/dash/underscore (§3). The original restricts remote-provider
    /// names to dot/dash only; this is the ais-bucket rule, the one the
    /// router applies before BMD lookup.
    pub fn validate_name(name: &str) -> Result<()> {
        if name.is_empty() || name == "." {
            return Err(Error::InvalidBucketName(name.to_string()));
        }
        if !name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
        {
            return Err(Error::InvalidBucketName(name.to_string()));
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Self::validate_name(&self.name)?;
        self.ns.validate()
    }

    pub fn is_ais(&self) -> bool {
        matches!(self.provider, Provider::Ais)
    }

    pub fn is_remote(&self) -> bool {
        self.provider.is_remote()
    }

    pub fn is_cloud(&self) -> bool {
        self.provider.is_cloud()
    }

    pub fn is_http(&self) -> bool {
        matches!(self.provider, Provider::Http)
    }

    pub fn is_hdfs(&self) -> bool {
        matches!(self.provider, Provider::Hdfs)
    }

    /// `provider/ns_uname/name` — the bucket's canonical unique name,
    /// joined with `/` (the original joins with `filepath.Separator`; this
    /// store has no on-disk layout concern so `/` is used uniformly).
    pub fn uname(&self) -> String {
        format!("{}/{}/{}", self.provider, self.ns.uname(), self.name)
    }

    /// `(bucket_uname, object_name)` — the HRW key for object placement.
    pub fn make_object_uname(&self, object_name: &str) -> String {
        format!("{}/{}", self.uname(), object_name)
    }

    /// `provider://name` when global, `provider://uuid#name/bucket` when
    /// namespaced — matches `Bck.String()` in the original.
    pub fn display_string(&self) -> String {
        if self.ns.is_global() {
            format!("{}://{}", self.provider, self.name)
        } else {
            format!(
                "{}://{}#{}/{}",
                self.provider, self.ns.uuid, self.ns.name, self.name
            )
        }
    }
}

impl fmt::Display for Bck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_string())
    }
}

/// Bucket-level properties (§3 BMD: "properties include provider, access
/// mask, versioning, mirroring copies, EC ..., backend bucket pointer,
/// created-at, BID, renamed marker").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BucketProps {
    pub provider: Provider,
    pub access_mask: u64,
    pub versioning_enabled: bool,
    pub mirror_copies: u32,
    pub ec_data: u32,
    pub ec_parity: u32,
    pub ec_min_obj_size: u64,
    /// Pointer to the backend bucket when this entry is a remote-bucket
    /// linkage created via `AddRemoteBck` (§4.5).
    pub backend_bck: Option<Box<Bck>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Bucket id, monotonically assigned at creation; stable across renames.
    pub bid: u64,
    pub renamed: Option<String>,
    /// Present only for `http` buckets (§4.5): the original URL the bucket
    /// was discovered from.
    pub orig_url_bck: Option<String>,
}

impl BucketProps {
    pub fn new_ais(bid: u64) -> Self {
        Self {
            provider: Provider::Ais,
            access_mask: u64::MAX,
            versioning_enabled: true,
            mirror_copies: 1,
            ec_data: 0,
            ec_parity: 0,
            ec_min_obj_size: 0,
            backend_bck: None,
            created_at: chrono::Utc::now(),
            bid,
            renamed: None,
            orig_url_bck: None,
        }
    }

    /// Conservative defaults used when a HEAD against a remote bucket
    /// fails with 401/403 but the caller opted into `tryHeadRemB` (§4.5,
    /// `original_source/ais/prxtrybck.go::_lookup`).
    pub fn default_remote(provider: Provider, bid: u64) -> Self {
        Self {
            versioning_enabled: false,
            ..Self::new_ais(bid).with_provider(provider)
        }
    }

    fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_ns_uname_is_sentinel() {
        assert_eq!(Ns::global().uname(), "@#");
    }

    #[test]
    fn remote_ns_uname_shape() {
        let ns = Ns::remote("U1", "sub");
        assert_eq!(ns.uname(), "@U1#sub");
    }

    #[test]
    fn bucket_uname_joins_provider_ns_name() {
        let bck = Bck::ais("b1");
        assert_eq!(bck.uname(), "ais/@#/b1");
    }

    #[test]
    fn object_uname_appends_object_name() {
        let bck = Bck::ais("b1");
        assert_eq!(bck.make_object_uname("obj.jpg"), "ais/@#/b1/obj.jpg");
    }

    #[test]
    fn validate_name_rejects_dot_and_empty() {
        assert!(Bck::validate_name("").is_err());
        assert!(Bck::validate_name(".").is_err());
        assert!(Bck::validate_name("valid_bucket-1.2").is_ok());
    }

    #[test]
    fn provider_normalize_aliases() {
        assert_eq!(Provider::normalize("").unwrap(), Provider::Ais);
        assert_eq!(Provider::normalize("s3").unwrap(), Provider::Aws);
        assert_eq!(Provider::normalize("gs").unwrap(), Provider::Gcp);
        assert_eq!(Provider::normalize("az").unwrap(), Provider::Azure);
        assert!(Provider::normalize("bogus").is_err());
    }
}
