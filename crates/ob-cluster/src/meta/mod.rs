//! The generic receive-apply shape shared by Smap/BMD/RMD (§9 "Pointer-graph
//! -like receivers"): parse → lock → validate uuid/version → swap pointer
//! under lock → persist → run hooks. The teacher has no direct analog for
//! this (its metadata was leader-replica config, not versioned cluster
//! docs), so this module is new, built in the idiom of `ob-cluster`'s other
//! typed-state modules: a trait for the invariant, a generic store for the
//! mechanics, one file per concrete kind.

pub mod bmd;
pub mod rmd;
pub mod smap;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{ClusterError, ClusterResult};

/// A versioned cluster-metadata document (§4.1 "Each metadata kind exposes:
/// `version()`, `validateUUID(other)` ...").
pub trait VersionedMeta: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn version(&self) -> u64;
    fn uuid(&self) -> &str;
}

/// Hook run after a successful swap, given the old and new document (§4.1
/// "run post-apply hooks"). Registered at construction, not at call site, so
/// the receive path itself stays generic.
pub type PostApplyHook<T> = Box<dyn Fn(&T, &T) + Send + Sync>;

/// Generic holder for one metadata kind: in-memory pointer behind a lock,
/// on-disk persistence path, and the post-apply hooks for that kind.
pub struct MetaStore<T: VersionedMeta> {
    inner: RwLock<Arc<T>>,
    path: PathBuf,
    hooks: Vec<PostApplyHook<T>>,
}

impl<T: VersionedMeta> MetaStore<T> {
    pub fn new(initial: T, path: impl Into<PathBuf>) -> Self {
        Self {
            inner: RwLock::new(Arc::new(initial)),
            path: path.into(),
            hooks: Vec::new(),
        }
    }

    pub fn with_hook(mut self, hook: PostApplyHook<T>) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Readers snapshot an immutable `Arc` and release the lock immediately
    /// (§5 "readers snapshot an immutable pointer and release the lock").
    pub fn current(&self) -> Arc<T> {
        self.inner.read().clone()
    }

    /// Loads a persisted copy from disk, if present, falling back to
    /// `default` otherwise (first boot, §6.2).
    pub fn load_or_default(path: impl AsRef<Path>, default: T) -> ClusterResult<T> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(default);
        }
        let bytes = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&bytes)?)
    }

    /// Applies the §4.1 receive rule and returns the new snapshot on
    /// success. `is_primary` governs step 1 (reject vs. log-and-override on
    /// uuid mismatch).
    pub fn receive(&self, new: T, is_primary: bool) -> ClusterResult<Arc<T>> {
        let current = self.current();

        if !current.uuid().is_empty() && current.uuid() != new.uuid() {
            if is_primary {
                return Err(ClusterError::UuidMismatch {
                    expected: current.uuid().to_string(),
                    got: new.uuid().to_string(),
                });
            }
            warn!(
                local_uuid = current.uuid(),
                incoming_uuid = new.uuid(),
                "cluster uuid mismatch on non-primary, overriding to heal partition"
            );
        }

        if new.version() <= current.version() {
            return Err(ClusterError::Downgrade {
                local: current.version(),
                incoming: new.version(),
            });
        }

        self.persist(&new)?;
        let new_arc = Arc::new(new);
        {
            let mut guard = self.inner.write();
            *guard = new_arc.clone();
        }
        for hook in &self.hooks {
            hook(&current, &new_arc);
        }
        Ok(new_arc)
    }

    fn persist(&self, value: &T) -> ClusterResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Dummy {
        uuid: String,
        version: u64,
    }

    impl VersionedMeta for Dummy {
        fn version(&self) -> u64 {
            self.version
        }
        fn uuid(&self) -> &str {
            &self.uuid
        }
    }

    #[test]
    fn receive_rejects_equal_or_lower_version() {
        let dir = std::env::temp_dir().join(format!("obstore-meta-test-{}", std::process::id()));
        let store = MetaStore::new(
            Dummy {
                uuid: "U1".into(),
                version: 5,
            },
            dir.join("dummy.json"),
        );
        let err = store
            .receive(
                Dummy {
                    uuid: "U1".into(),
                    version: 5,
                },
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ClusterError::Downgrade { .. }));
    }

    #[test]
    fn receive_runs_hooks_with_old_and_new() {
        let dir = std::env::temp_dir().join(format!("obstore-meta-test-hook-{}", std::process::id()));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        let store = MetaStore::new(
            Dummy {
                uuid: "U1".into(),
                version: 1,
            },
            dir.join("dummy.json"),
        )
        .with_hook(Box::new(move |_old, _new| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        }));
        store
            .receive(
                Dummy {
                    uuid: "U1".into(),
                    version: 2,
                },
                true,
            )
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn non_primary_overrides_uuid_mismatch_instead_of_rejecting() {
        let dir = std::env::temp_dir().join(format!("obstore-meta-test-uuid-{}", std::process::id()));
        let store = MetaStore::new(
            Dummy {
                uuid: "U1".into(),
                version: 1,
            },
            dir.join("dummy.json"),
        );
        let applied = store
            .receive(
                Dummy {
                    uuid: "U2".into(),
                    version: 2,
                },
                false,
            )
            .unwrap();
        assert_eq!(applied.uuid, "U2");
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn primary_rejects_uuid_mismatch() {
        let dir = std::env::temp_dir().join(format!("obstore-meta-test-uuid-primary-{}", std::process::id()));
        let store = MetaStore::new(
            Dummy {
                uuid: "U1".into(),
                version: 1,
            },
            dir.join("dummy.json"),
        );
        let err = store
            .receive(
                Dummy {
                    uuid: "U2".into(),
                    version: 2,
                },
                true,
            )
            .unwrap_err();
        assert!(matches!(err, ClusterError::UuidMismatch { .. }));
    }
}
