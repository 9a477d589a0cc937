//! Shared in-memory selection state plus the session bookkeeping around it.
//!
//! All state mutations go through [`SelectionStore::commit`], which applies
//! the change under the lock and then persists whatever actually changed.
//! Nothing is awaited while the lock is held.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use charpick_domain::{AnimeCache, SelectionSet, SelectionState, StateChange, UserId};

use super::persistence::SelectionPersistence;

/// Where the session stands with respect to identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    /// Identity not known yet. No store is read or written.
    AuthUnresolved,
    Anonymous,
    Identified(UserId),
}

impl SessionPhase {
    pub fn user(&self) -> Option<&UserId> {
        match self {
            Self::Identified(user) => Some(user),
            Self::AuthUnresolved | Self::Anonymous => None,
        }
    }
}

/// A field value tagged with the revision it was taken at.
#[derive(Debug, Clone)]
pub(crate) struct Revisioned<T> {
    pub revision: u64,
    pub value: T,
}

/// Field snapshots to write after a mutation or a load.
#[derive(Debug, Default)]
pub(crate) struct PendingSave {
    /// Remote target. `None` writes the local store only.
    pub user: Option<UserId>,
    pub selection: Option<Revisioned<SelectionSet>>,
    pub cache: Option<Revisioned<AnimeCache>>,
}

/// Result of handing a loaded state back to the store.
#[derive(Debug)]
pub(crate) enum LoadCommit {
    /// A newer load started meanwhile; the state was dropped.
    Stale,
    Applied(Option<PendingSave>),
}

#[derive(Debug)]
struct Inner {
    state: SelectionState,
    phase: SessionPhase,
    loading: bool,
    generation: u64,
    selection_revision: u64,
    cache_revision: u64,
}

impl Inner {
    fn snapshot_fields(&mut self, change: StateChange, user: Option<UserId>) -> PendingSave {
        let mut pending = PendingSave {
            user,
            ..PendingSave::default()
        };
        if change.selection {
            self.selection_revision += 1;
            pending.selection = Some(Revisioned {
                revision: self.selection_revision,
                value: self.state.selection().clone(),
            });
        }
        if change.cache {
            self.cache_revision += 1;
            pending.cache = Some(Revisioned {
                revision: self.cache_revision,
                value: self.state.cache().clone(),
            });
        }
        pending
    }
}

pub(crate) struct SelectionStore {
    inner: RwLock<Inner>,
    persistence: Arc<SelectionPersistence>,
}

impl SelectionStore {
    pub fn new(persistence: SelectionPersistence) -> Self {
        Self {
            inner: RwLock::new(Inner {
                state: SelectionState::new(),
                phase: SessionPhase::AuthUnresolved,
                loading: true,
                generation: 0,
                selection_revision: 0,
                cache_revision: 0,
            }),
            persistence: Arc::new(persistence),
        }
    }

    fn inner(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn inner_mut(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn persistence(&self) -> &Arc<SelectionPersistence> {
        &self.persistence
    }

    pub fn read<R>(&self, f: impl FnOnce(&SelectionState) -> R) -> R {
        f(&self.inner().state)
    }

    pub fn snapshot(&self) -> SelectionState {
        self.read(SelectionState::clone)
    }

    /// True until the load for the current identity has completed.
    pub fn is_loading(&self) -> bool {
        self.inner().loading
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner().phase.clone()
    }

    /// Apply `f` and report what to persist.
    ///
    /// The in-memory change always lands. Nothing is persisted while a load
    /// is pending, since the load replaces the state anyway.
    pub fn mutate(&self, f: impl FnOnce(&mut SelectionState) -> StateChange) -> Option<PendingSave> {
        let mut inner = self.inner_mut();
        let change = f(&mut inner.state);
        if !change.any() || inner.loading {
            return None;
        }
        let user = inner.phase.user().cloned();
        Some(inner.snapshot_fields(change, user))
    }

    /// [`mutate`](Self::mutate), then write the changed fields. Returns once
    /// the local writes land; remote writes continue in the background.
    pub async fn commit(&self, f: impl FnOnce(&mut SelectionState) -> StateChange) {
        if let Some(pending) = self.mutate(f) {
            self.persistence.save(pending).await;
        }
    }

    /// Identity went back to unknown: block persistence until it resolves.
    pub fn enter_unresolved(&self) {
        let mut inner = self.inner_mut();
        inner.phase = SessionPhase::AuthUnresolved;
        inner.loading = true;
        inner.generation += 1;
    }

    /// Start loading for `phase`. Returns the generation the result must
    /// be committed with.
    pub fn begin_load(&self, phase: SessionPhase) -> u64 {
        let mut inner = self.inner_mut();
        inner.phase = phase;
        inner.loading = true;
        inner.generation += 1;
        inner.generation
    }

    /// Replace the state with a loaded one unless a newer load superseded it.
    ///
    /// With `mirror_local`, both fields come back as a local-only save taken
    /// at fresh revisions, so they order before any later mutation's writes.
    pub fn finish_load(
        &self,
        generation: u64,
        state: SelectionState,
        mirror_local: bool,
    ) -> LoadCommit {
        let mut inner = self.inner_mut();
        if inner.generation != generation {
            return LoadCommit::Stale;
        }
        inner.state = state;
        inner.loading = false;
        let mirror = mirror_local.then(|| {
            inner.snapshot_fields(
                StateChange {
                    selection: true,
                    cache: true,
                },
                None,
            )
        });
        LoadCommit::Applied(mirror)
    }
}
