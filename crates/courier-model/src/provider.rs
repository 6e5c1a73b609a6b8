//! Lazy, memoized descriptor resolution.
//!
//! Schemas may be self- or mutually-referential (a struct holding a list of
//! itself). Container and field descriptors therefore hold a
//! [`DescriptorProvider`] instead of a direct descriptor reference: a
//! zero-argument resolver that is run at most once and caches its result.
//!
//! A provider whose resolution re-enters itself is a definition defect, not a
//! runtime condition. The cell carries an explicit `Resolving` sentinel so a
//! re-entrant resolve is reported as [`DefinitionError::CyclicReference`]
//! instead of recursing forever.

use std::sync::{Arc, Mutex};

use crate::descriptor::TypeDescriptor;
use crate::error::DefinitionError;

type Thunk = Box<dyn FnOnce() -> Result<TypeDescriptor, DefinitionError> + Send>;

enum State {
    Pending(Thunk),
    /// Resolution in flight. Observing this from `resolve` means a cycle.
    /// A failed thunk also leaves the cell here; definition defects are
    /// not recovered.
    Resolving,
    Ready(TypeDescriptor),
}

/// A memoized lazy resolver for one [`TypeDescriptor`].
///
/// Cheap to clone; clones share the same cell, so resolution still happens
/// at most once.
#[derive(Clone)]
pub struct DescriptorProvider {
    label: Arc<str>,
    cell: Arc<Mutex<State>>,
}

impl DescriptorProvider {
    /// Provider for an already-known descriptor. Resolution never fails.
    pub fn fixed(descriptor: TypeDescriptor) -> Self {
        Self {
            label: Arc::from(descriptor.name().as_str()),
            cell: Arc::new(Mutex::new(State::Ready(descriptor))),
        }
    }

    /// Provider that runs `thunk` on first resolution and caches the result.
    ///
    /// `label` names the reference in cycle diagnostics.
    pub fn lazy<F>(label: &str, thunk: F) -> Self
    where
        F: FnOnce() -> Result<TypeDescriptor, DefinitionError> + Send + 'static,
    {
        Self {
            label: Arc::from(label),
            cell: Arc::new(Mutex::new(State::Pending(Box::new(thunk)))),
        }
    }

    /// Resolve the descriptor, running the thunk on first call.
    pub fn resolve(&self) -> Result<TypeDescriptor, DefinitionError> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, State::Resolving) {
            State::Ready(descriptor) => {
                *state = State::Ready(descriptor.clone());
                Ok(descriptor)
            }
            State::Resolving => Err(DefinitionError::CyclicReference {
                context: self.label.to_string(),
            }),
            State::Pending(thunk) => {
                // Run the thunk with the lock released so a same-thread
                // re-entrant resolve observes `Resolving` instead of
                // deadlocking.
                drop(state);
                let descriptor = thunk()?;
                *self.lock() = State::Ready(descriptor.clone());
                Ok(descriptor)
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.cell.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl std::fmt::Debug for DescriptorProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.lock() {
            State::Pending(_) => "pending",
            State::Resolving => "resolving",
            State::Ready(_) => "ready",
        };
        f.debug_struct("DescriptorProvider")
            .field("label", &self.label)
            .field("state", &state)
            .finish()
    }
}
