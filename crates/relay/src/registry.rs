use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tidalcast_rtmp::messages::DataMessage;
use tidalcast_rtmp::session::{MessageHandle, PublishSink, PublishSinkError};

use crate::error::RegistryError;
use crate::source::Source;

/// Process-scoped map of `"{app}/{stream}"` to its [`Source`], guarded by a
/// single reader/writer lock (4.4.1): lookup is read-locked, creation and
/// removal are write-locked.
///
/// Constructed explicitly (not lazily behind a `OnceLock`) so tests can
/// build their own instance rather than share hidden global state (9's
/// "process-wide registry" design note).
#[derive(Default, Clone)]
pub struct Registry {
    streams: Arc<RwLock<HashMap<String, Arc<Source>>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Joins `app`/`stream` into the registry key, normalized with a leading
    /// slash (3's `Request::streamUrl()`) so an HTTP request path like
    /// `/live/123` can be used verbatim as a lookup key.
    fn key(app: &str, stream: &str) -> String {
        format!("/{app}/{stream}")
    }

    /// Creates a new source for `key`, failing with [`RegistryError::Busy`]
    /// if a publisher already holds that name.
    pub fn create(&self, key: &str) -> Result<Arc<Source>, RegistryError> {
        let mut streams = self.streams.write();
        if streams.contains_key(key) {
            return Err(RegistryError::Busy(key.to_owned()));
        }
        let source = Source::new(key.to_owned());
        streams.insert(key.to_owned(), Arc::clone(&source));
        Ok(source)
    }

    /// Looks up a source by key, for consumer attach.
    pub fn get(&self, key: &str) -> Option<Arc<Source>> {
        self.streams.read().get(key).cloned()
    }

    /// Removes a source by key, on publisher disconnect. A no-op if the
    /// source was already removed (e.g. replaced by a newer publish after
    /// this one's teardown raced the registry).
    pub fn remove(&self, key: &str) {
        self.streams.write().remove(key);
    }

    pub fn len(&self) -> usize {
        self.streams.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.read().is_empty()
    }
}

impl PublishSink for Registry {
    fn publish(&self, app: &str, stream: &str) -> Result<Arc<dyn MessageHandle>, PublishSinkError> {
        let key = Self::key(app, stream);
        let source = self.create(&key).map_err(|RegistryError::Busy(key)| PublishSinkError::Busy(key))?;
        Ok(Arc::new(RegistryHandle {
            registry: self.clone(),
            key,
            source,
        }))
    }
}

/// One publish in progress: forwards data messages straight to the
/// [`Source`], and on disconnect tears the source down and removes it from
/// the registry so the name becomes available again.
struct RegistryHandle {
    registry: Registry,
    key: String,
    source: Arc<Source>,
}

impl MessageHandle for RegistryHandle {
    fn handle_message(&self, msg: Arc<DataMessage>) {
        self.source.handle_message(msg);
    }

    fn disconnect(&self) {
        self.source.close();
        self.registry.remove(&self.key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_then_create_again_is_busy() {
        let registry = Registry::new();
        registry.create("live/s1").unwrap();
        assert!(matches!(registry.create("live/s1"), Err(RegistryError::Busy(_))));
    }

    #[test]
    fn get_missing_key_is_none() {
        let registry = Registry::new();
        assert!(registry.get("live/missing").is_none());
    }

    #[test]
    fn publish_then_disconnect_removes_from_registry() {
        let registry = Registry::new();
        let handle = PublishSink::publish(&registry, "live", "s1").unwrap();
        assert_eq!(registry.len(), 1);

        handle.disconnect();
        assert!(registry.is_empty());
    }

    #[test]
    fn publish_busy_surfaces_as_publish_sink_error() {
        let registry = Registry::new();
        let _handle = PublishSink::publish(&registry, "live", "s1").unwrap();
        let err = PublishSink::publish(&registry, "live", "s1").unwrap_err();
        assert!(matches!(err, PublishSinkError::Busy(_)));
    }
}
