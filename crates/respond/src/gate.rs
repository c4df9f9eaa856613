//! Guarded access to the current template set.
//!
//! Readers take a snapshot (`Arc<TemplateSet>`) and execute against it without
//! holding any lock, so a reload never blocks a render already in progress and
//! never tears the set out from under it. The lock only serializes the swap.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::RenderError;
use crate::template::TemplateSet;

pub(crate) enum ReloadGate {
    /// Reloads through `&self` are allowed and serialized by the lock.
    Locked(RwLock<Arc<TemplateSet>>),
    /// The set is only replaced through exclusive ownership.
    Unlocked(Arc<TemplateSet>),
}

impl ReloadGate {
    pub(crate) fn new(set: TemplateSet, locking: bool) -> Self {
        let set = Arc::new(set);
        if locking {
            Self::Locked(RwLock::new(set))
        } else {
            Self::Unlocked(set)
        }
    }

    pub(crate) fn is_locking(&self) -> bool {
        matches!(self, Self::Locked(_))
    }

    /// The installed set.
    pub(crate) fn current(&self) -> Arc<TemplateSet> {
        match self {
            Self::Locked(lock) => Arc::clone(&lock.read().unwrap_or_else(PoisonError::into_inner)),
            Self::Unlocked(set) => Arc::clone(set),
        }
    }

    /// Builds a replacement under the write lock and installs it.
    ///
    /// On failure the installed set is kept. Returns the set that is
    /// installed when the lock is released.
    pub(crate) fn reload<F>(&self, build: F) -> Result<Arc<TemplateSet>, RenderError>
    where
        F: FnOnce() -> Result<TemplateSet, RenderError>,
    {
        match self {
            Self::Locked(lock) => {
                let mut installed = lock.write().unwrap_or_else(PoisonError::into_inner);
                let fresh = Arc::new(build()?);
                *installed = Arc::clone(&fresh);
                Ok(fresh)
            }
            Self::Unlocked(_) => Err(RenderError::LockingDisabled),
        }
    }

    /// Builds a replacement and installs it. Works in either mode.
    pub(crate) fn reload_mut<F>(&mut self, build: F) -> Result<(), RenderError>
    where
        F: FnOnce() -> Result<TemplateSet, RenderError>,
    {
        let fresh = Arc::new(build()?);
        match self {
            Self::Locked(lock) => {
                *lock.get_mut().unwrap_or_else(PoisonError::into_inner) = fresh;
            }
            Self::Unlocked(set) => *set = fresh,
        }
        Ok(())
    }
}
