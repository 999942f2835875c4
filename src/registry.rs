use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use compact_str::CompactString;
use thiserror::Error;
use crate::participant::Participant;

// displays as the error line sent back to the client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("error: name cannot be empty")]
    NameEmpty,
    #[error("error: name [{0}] is already taken")]
    NameTaken(CompactString),
    #[error("error: user [{0}] is not online")]
    Offline(CompactString),
}

/// Who is online, keyed by display name. No guard is held across an await.
#[derive(Clone, Default)]
#[repr(transparent)]
pub struct Registry(Arc<RwLock<HashMap<CompactString, Arc<Participant>>>>);

impl Registry {
    pub fn new() -> Self {
        Self(Arc::new(RwLock::new(HashMap::with_capacity(32))))
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<CompactString, Arc<Participant>>> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<CompactString, Arc<Participant>>> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn join(&self, participant: Arc<Participant>) -> Result<(), RegistryError> {
        let name = participant.name();
        let mut guard = self.write();
        if guard.contains_key(&name) {
            return Err(RegistryError::NameTaken(name));
        }
        guard.insert(name, participant);
        Ok(())
    }

    /// No-op if `participant` is gone or its name now belongs to someone else.
    pub fn leave(&self, participant: &Arc<Participant>) -> bool {
        let mut guard = self.write();
        // name only changes under this lock, so it can't move underneath us
        let name = participant.name();
        match guard.get(&name) {
            Some(entry) if Arc::ptr_eq(entry, participant) => {
                guard.remove(&name);
                true
            }
            _ => false,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<Participant>> {
        self.read().get(name).cloned()
    }

    /// One critical section, so two renames racing for a name can't both win.
    pub fn rename(&self, old: &str, new: &str) -> Result<(), RegistryError> {
        if new.is_empty() {
            return Err(RegistryError::NameEmpty);
        }
        let mut guard = self.write();
        if guard.contains_key(new) {
            return Err(RegistryError::NameTaken(new.into()));
        }
        let participant = guard
            .remove(old)
            .ok_or_else(|| RegistryError::Offline(old.into()))?;
        let new = CompactString::from(new);
        participant.set_name(new.clone());
        guard.insert(new, participant);
        Ok(())
    }

    pub fn names(&self) -> Vec<CompactString> {
        let mut names: Vec<_> = self.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn participants(&self) -> Vec<Arc<Participant>> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}
