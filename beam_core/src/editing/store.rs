//! Versioned holder of the current model snapshot.
//!
//! Every committed command replaces the snapshot and bumps the version;
//! subscribers (renderers, CLI echo) are called with the new snapshot.
//! Rejected commands leave snapshot and version untouched.

use std::fmt;

use tracing::{debug, warn};

use crate::errors::CalcResult;
use crate::model::StructuralModel;

use super::EditCommand;

/// Callback invoked after every committed change
pub type Subscriber = Box<dyn FnMut(&StructuralModel, u64)>;

#[derive(Default)]
pub struct ModelStore {
    model: StructuralModel,
    version: u64,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for ModelStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelStore")
            .field("model", &self.model)
            .field("version", &self.version)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot (e.g. a model file)
    pub fn with_model(model: StructuralModel) -> Self {
        Self {
            model,
            ..Self::default()
        }
    }

    pub fn model(&self) -> &StructuralModel {
        &self.model
    }

    /// Monotonic change counter, starts at 0
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn subscribe<F>(&mut self, subscriber: F)
    where
        F: FnMut(&StructuralModel, u64) + 'static,
    {
        self.subscribers.push(Box::new(subscriber));
    }

    /// Apply a command; on success commit the new snapshot and notify.
    ///
    /// Returns the new version.
    pub fn apply(&mut self, command: &EditCommand) -> CalcResult<u64> {
        match command.apply(&self.model) {
            Ok(next) => {
                self.commit(next);
                debug!(op = command.name(), version = self.version, "edit committed");
                Ok(self.version)
            }
            Err(e) => {
                warn!(op = command.name(), code = e.error_code(), "edit rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Replace the snapshot wholesale (file load) and notify.
    pub fn replace(&mut self, model: StructuralModel) -> u64 {
        self.commit(model);
        self.version
    }

    fn commit(&mut self, model: StructuralModel) {
        self.model = model;
        self.version += 1;
        for subscriber in self.subscribers.iter_mut() {
            subscriber(&self.model, self.version);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_commit_bumps_version_and_notifies() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut store = ModelStore::new();
        store.subscribe(move |model, version| {
            sink.borrow_mut().push((version, model.pillars.len()));
        });

        store.apply(&EditCommand::AddPillar { width: 20.0, position: -160.0 }).unwrap();
        let version = store.apply(&EditCommand::AddPillar { width: 20.0, position: 160.0 }).unwrap();

        assert_eq!(version, 2);
        assert_eq!(*seen.borrow(), vec![(1, 1), (2, 2)]);
    }

    #[test]
    fn test_rejection_keeps_version() {
        let calls = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&calls);

        let mut store = ModelStore::new();
        store.subscribe(move |_, _| *counter.borrow_mut() += 1);

        let err = store
            .apply(&EditCommand::AddPointLoad { position: 0.0, magnitude: -1.0 })
            .unwrap_err();
        assert_eq!(err.error_code(), "EMPTY_STRUCTURE");
        assert_eq!(store.version(), 0);
        assert_eq!(*calls.borrow(), 0);
    }

    #[test]
    fn test_replace_counts_as_change() {
        let mut store = ModelStore::new();
        let model = StructuralModel::new().add_pillar(20.0, 0.0).unwrap();
        assert_eq!(store.replace(model.clone()), 1);
        assert_eq!(store.model(), &model);
    }
}
