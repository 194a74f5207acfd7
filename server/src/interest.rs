use std::collections::HashSet;

use tern_shared::{ConnectionId, NetworkId};

/// Per-entity override of the interest predicate
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Ask the interest management
    #[default]
    Default,
    /// Nobody but the owner observes the entity
    ForceHidden,
    /// Every ready connection observes the entity
    ForceShown,
}

/// Decides which connections observe which entities.
///
/// Only the visibility rule lives here. The server owns the observer sets
/// and does the diffing.
pub trait InterestManagement {
    /// Should `connection` observe `entity`? Asked when a connection becomes
    /// ready, for every spawned entity.
    fn on_check_observer(&mut self, entity: NetworkId, connection: ConnectionId) -> bool;

    /// Fills `new_observers` with the `candidates` (all ready connections)
    /// that should observe `entity`
    fn on_rebuild_observers(
        &mut self,
        entity: NetworkId,
        candidates: &[ConnectionId],
        new_observers: &mut HashSet<ConnectionId>,
    ) {
        for connection in candidates {
            if self.on_check_observer(entity, *connection) {
                new_observers.insert(*connection);
            }
        }
    }

    /// Host mode only: show or hide `entity` for the in-process client. Hidden
    /// entities stay spawned on the host.
    fn set_host_visibility(&mut self, _entity: NetworkId, _visible: bool) {}
}

/// Everyone observes everything
#[derive(Clone, Copy, Debug, Default)]
pub struct AllVisible;

impl InterestManagement for AllVisible {
    fn on_check_observer(&mut self, _entity: NetworkId, _connection: ConnectionId) -> bool {
        true
    }
}

/// Visibility decided by a closure
pub struct PredicateInterest<F> {
    predicate: F,
}

impl<F> PredicateInterest<F>
where
    F: FnMut(NetworkId, ConnectionId) -> bool,
{
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<F> InterestManagement for PredicateInterest<F>
where
    F: FnMut(NetworkId, ConnectionId) -> bool,
{
    fn on_check_observer(&mut self, entity: NetworkId, connection: ConnectionId) -> bool {
        (self.predicate)(entity, connection)
    }
}

/// Outcome of comparing an entity's observers against a freshly computed set
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ObserverDiff {
    /// Connections that start observing
    pub added: Vec<ConnectionId>,
    /// Connections that stop observing
    pub removed: Vec<ConnectionId>,
    /// Observer set after the rebuild
    pub observers: HashSet<ConnectionId>,
    pub changed: bool,
}

/// Diffs `old` observers against `new_observers`.
///
/// Only ready connections are ever added; not ready ones may still be
/// removed. With `initialize` every ready connection in `new_observers`
/// counts as a change, even if it was already observing. Results are sorted
/// by connection id.
pub fn diff_observers(
    old: &HashSet<ConnectionId>,
    new_observers: &HashSet<ConnectionId>,
    is_ready: impl Fn(ConnectionId) -> bool,
    initialize: bool,
) -> ObserverDiff {
    let mut changed = false;

    let mut added = Vec::new();
    for connection in new_observers {
        if !is_ready(*connection) {
            continue;
        }
        if initialize || !old.contains(connection) {
            changed = true;
            if !old.contains(connection) {
                added.push(*connection);
            }
        }
    }

    let mut removed: Vec<ConnectionId> = old
        .iter()
        .filter(|connection| !new_observers.contains(connection))
        .copied()
        .collect();
    if !removed.is_empty() {
        changed = true;
    }

    added.sort();
    removed.sort();

    let observers = if changed {
        new_observers
            .iter()
            .filter(|connection| is_ready(**connection))
            .copied()
            .collect()
    } else {
        old.clone()
    };

    ObserverDiff {
        added,
        removed,
        observers,
        changed,
    }
}
