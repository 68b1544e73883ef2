//! In-process change-observer registry.
//!
//! # Responsibility
//! - Keep observers registered against resource paths.
//! - Fan out "path changed" signals emitted after successful mutations.
//!
//! # Invariants
//! - A change on path `P` reaches observers registered on `P`, on any path
//!   below `P`, and on ancestors of `P` that asked for descendant changes.
//! - Observers run synchronously on the notifying thread, after the registry
//!   lock has been released, so they may register or unregister freely.

use crate::provider::ResourceUri;
use log::debug;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

/// Registration token returned by [`ChangeRegistry::register`].
pub type ObserverId = Uuid;

/// Receiver of change notifications.
pub trait ChangeObserver: Send + Sync {
    fn on_change(&self, uri: &ResourceUri);
}

impl<F> ChangeObserver for F
where
    F: Fn(&ResourceUri) + Send + Sync,
{
    fn on_change(&self, uri: &ResourceUri) {
        self(uri)
    }
}

struct Registration {
    uri: ResourceUri,
    notify_for_descendants: bool,
    observer: Arc<dyn ChangeObserver>,
}

impl Registration {
    fn wants(&self, changed: &ResourceUri) -> bool {
        self.uri == *changed
            || changed.is_ancestor_of(&self.uri)
            || (self.notify_for_descendants && self.uri.is_ancestor_of(changed))
    }
}

/// Thread-safe observer registry shared by the dispatcher and its callers.
#[derive(Default)]
pub struct ChangeRegistry {
    registrations: RwLock<BTreeMap<ObserverId, Registration>>,
}

impl ChangeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` for changes on `uri`.
    pub fn register(
        &self,
        uri: ResourceUri,
        notify_for_descendants: bool,
        observer: Arc<dyn ChangeObserver>,
    ) -> ObserverId {
        let id = Uuid::new_v4();
        debug!("event=observer_register module=notify status=ok uri={uri}");
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(
                id,
                Registration {
                    uri,
                    notify_for_descendants,
                    observer,
                },
            );
        id
    }

    /// Removes one registration. Returns `false` when `id` was unknown.
    pub fn unregister(&self, id: ObserverId) -> bool {
        self.registrations
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }

    /// Notifies every matching observer that `uri` changed.
    ///
    /// Returns how many observers were called.
    pub fn notify_change(&self, uri: &ResourceUri) -> usize {
        let targets: Vec<Arc<dyn ChangeObserver>> = self
            .registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|registration| registration.wants(uri))
            .map(|registration| Arc::clone(&registration.observer))
            .collect();

        for observer in &targets {
            observer.on_change(uri);
        }
        debug!(
            "event=change_notify module=notify status=ok uri={uri} observers={}",
            targets.len()
        );
        targets.len()
    }

    pub fn len(&self) -> usize {
        self.registrations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
