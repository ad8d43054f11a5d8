//! Waiting queue and active-pairing table.
//!
//! [`PairingRegistry`] is the single source of truth for who is waiting and
//! who is paired with whom. All state lives behind one
//! [`parking_lot::RwLock`]: mutations take the write lock for the whole
//! operation, lookups and counters take the read lock. Nothing in here
//! blocks on I/O, so the lock is never held across an `.await`.
//!
//! A connection is always in exactly one of three states: idle (unknown to
//! the registry), waiting, or paired. Each pairing is stored once and
//! indexed from both members.

use std::collections::{HashMap, VecDeque};

use parking_lot::{RwLock, RwLockWriteGuard};

use super::ConnectionId;
use super::pairing::{Pairing, WaitingEntry};

/// Result of [`PairingRegistry::enroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOutcome {
    /// No eligible partner was queued; the caller is now waiting.
    Waiting,
    /// The caller was paired with the longest-waiting connection, which is
    /// carried here. The caller is the initiator, the partner the receiver.
    PairedWith(ConnectionId),
}

/// Live counters, read under a single lock acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryCounts {
    /// Connections in the waiting queue.
    pub waiting: usize,
    /// Active pairings; each pairing counts once.
    pub active_sessions: usize,
}

type SessionKey = u64;

#[derive(Debug, Default)]
struct RegistryState {
    /// Insertion-ordered; the front is the longest-waiting connection.
    waiting: VecDeque<WaitingEntry>,
    sessions: HashMap<SessionKey, Pairing>,
    /// Connection -> key of the pairing it belongs to.
    membership: HashMap<ConnectionId, SessionKey>,
    next_key: SessionKey,
}

impl RegistryState {
    fn enroll(&mut self, id: ConnectionId) -> MatchOutcome {
        let _ = self.disband(id);

        let candidate = self
            .waiting
            .iter()
            .position(|entry| entry.connection_id != id)
            .and_then(|pos| self.waiting.remove(pos));

        let Some(entry) = candidate else {
            self.waiting.push_back(WaitingEntry::new(id));
            return MatchOutcome::Waiting;
        };

        let partner = entry.connection_id;
        let key = self.next_key;
        self.next_key = self.next_key.wrapping_add(1);
        self.sessions.insert(key, Pairing::new(id, partner));
        self.membership.insert(id, key);
        self.membership.insert(partner, key);
        MatchOutcome::PairedWith(partner)
    }

    fn disband(&mut self, id: ConnectionId) -> Option<ConnectionId> {
        self.waiting.retain(|entry| entry.connection_id != id);

        let key = self.membership.remove(&id)?;
        let pairing = self.sessions.remove(&key)?;
        let partner = pairing.other(id)?;
        self.membership.remove(&partner);
        Some(partner)
    }

    fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        let key = self.membership.get(&id)?;
        self.sessions.get(key)?.other(id)
    }

    fn pairing_of(&self, id: ConnectionId) -> Option<&Pairing> {
        let key = self.membership.get(&id)?;
        self.sessions.get(key)
    }

    fn waiting_entry(&self, id: ConnectionId) -> Option<&WaitingEntry> {
        self.waiting.iter().find(|entry| entry.connection_id == id)
    }

    fn is_waiting(&self, id: ConnectionId) -> bool {
        self.waiting_entry(id).is_some()
    }

    fn counts(&self) -> RegistryCounts {
        RegistryCounts {
            waiting: self.waiting.len(),
            active_sessions: self.sessions.len(),
        }
    }
}

/// Central matchmaking state: the waiting queue and the pairing table.
///
/// Constructed explicitly and shared through an `Arc`; independent
/// instances never observe each other.
///
/// # Concurrency
///
/// - `enroll` / `disband` are atomic with respect to each other.
/// - Lookups and counters may run concurrently.
/// - [`PairingRegistry::transaction`] hands out the write guard so a caller
///   can combine a mutation with follow-up work that must not interleave
///   with another mutation.
#[derive(Debug, Default)]
pub struct PairingRegistry {
    state: RwLock<RegistryState>,
}

impl PairingRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens an exclusive transaction over the registry.
    ///
    /// Other mutations and lookups wait until the returned guard is dropped.
    /// Do not hold it across an `.await`.
    #[must_use]
    pub fn transaction(&self) -> RegistryTxn<'_> {
        RegistryTxn {
            state: self.state.write(),
        }
    }

    /// Enrolls `id` for matching. See [`RegistryTxn::enroll`].
    pub fn enroll(&self, id: ConnectionId) -> MatchOutcome {
        self.transaction().enroll(id)
    }

    /// Removes `id` from the registry. See [`RegistryTxn::disband`].
    pub fn disband(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.transaction().disband(id)
    }

    /// Returns the current partner of `id`, if paired.
    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.state.read().partner_of(id)
    }

    /// Returns a copy of the pairing `id` belongs to, if any.
    #[must_use]
    pub fn pairing_of(&self, id: ConnectionId) -> Option<Pairing> {
        self.state.read().pairing_of(id).cloned()
    }

    /// Returns `true` if `id` is in the waiting queue.
    #[must_use]
    pub fn is_waiting(&self, id: ConnectionId) -> bool {
        self.state.read().is_waiting(id)
    }

    /// Returns a copy of the queue entry for `id`, if waiting.
    #[must_use]
    pub fn waiting_entry(&self, id: ConnectionId) -> Option<WaitingEntry> {
        self.state.read().waiting_entry(id).cloned()
    }

    /// Number of connections currently waiting.
    #[must_use]
    pub fn waiting_count(&self) -> usize {
        self.state.read().waiting.len()
    }

    /// Number of active pairings (whole sessions, not members).
    #[must_use]
    pub fn active_session_count(&self) -> usize {
        self.state.read().sessions.len()
    }

    /// Both counters from one consistent view.
    #[must_use]
    pub fn counts(&self) -> RegistryCounts {
        self.state.read().counts()
    }
}

/// Exclusive access to the registry for a sequence of operations.
///
/// Obtained from [`PairingRegistry::transaction`]; releases the lock on drop.
#[derive(Debug)]
pub struct RegistryTxn<'a> {
    state: RwLockWriteGuard<'a, RegistryState>,
}

impl RegistryTxn<'_> {
    /// Enrolls `id` for matching.
    ///
    /// Any prior state of `id` is cleared first, so enrolling twice is
    /// harmless. If another connection is waiting, the earliest one is
    /// removed from the queue and paired with `id`; otherwise `id` joins
    /// the back of the queue. A connection is never paired with itself.
    pub fn enroll(&mut self, id: ConnectionId) -> MatchOutcome {
        self.state.enroll(id)
    }

    /// Removes `id` from the waiting queue and from its pairing.
    ///
    /// Returns the former partner when a pairing was torn down. Calling
    /// this for an unknown connection is a no-op returning `None`.
    pub fn disband(&mut self, id: ConnectionId) -> Option<ConnectionId> {
        self.state.disband(id)
    }

    /// Returns the current partner of `id`, if paired.
    #[must_use]
    pub fn partner_of(&self, id: ConnectionId) -> Option<ConnectionId> {
        self.state.partner_of(id)
    }

    /// Returns `true` if `id` is in the waiting queue.
    #[must_use]
    pub fn is_waiting(&self, id: ConnectionId) -> bool {
        self.state.is_waiting(id)
    }
}

#[cfg(test)]
#[allow(clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    /// Checks I1-I3 against the raw state.
    fn assert_invariants(registry: &PairingRegistry) {
        let state = registry.state.read();

        let mut seen = HashSet::new();
        for entry in &state.waiting {
            assert!(seen.insert(entry.connection_id), "duplicate waiting entry");
            assert!(
                !state.membership.contains_key(&entry.connection_id),
                "waiting connection is also paired"
            );
        }

        assert_eq!(state.membership.len(), state.sessions.len() * 2);
        for (key, pairing) in &state.sessions {
            let (a, b) = pairing.members();
            assert_ne!(a, b, "self pairing");
            assert_eq!(state.membership.get(&a), Some(key));
            assert_eq!(state.membership.get(&b), Some(key));
        }
        for id in state.membership.keys() {
            let Some(partner) = state.partner_of(*id) else {
                panic!("dangling membership");
            };
            assert_eq!(state.partner_of(partner), Some(*id), "asymmetric pairing");
        }
    }

    /// Straightforward reference queue used as an oracle.
    #[derive(Default)]
    struct Model {
        waiting: Vec<ConnectionId>,
        pairs: HashMap<ConnectionId, ConnectionId>,
    }

    impl Model {
        fn disband(&mut self, id: ConnectionId) -> Option<ConnectionId> {
            self.waiting.retain(|w| *w != id);
            let partner = self.pairs.remove(&id)?;
            self.pairs.remove(&partner);
            Some(partner)
        }

        fn enroll(&mut self, id: ConnectionId) -> MatchOutcome {
            let _ = self.disband(id);
            if let Some(pos) = self.waiting.iter().position(|w| *w != id) {
                let partner = self.waiting.remove(pos);
                self.pairs.insert(id, partner);
                self.pairs.insert(partner, id);
                MatchOutcome::PairedWith(partner)
            } else {
                self.waiting.push(id);
                MatchOutcome::Waiting
            }
        }
    }

    #[test]
    fn first_enroll_waits() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();

        assert_eq!(registry.enroll(a), MatchOutcome::Waiting);
        assert_eq!(registry.waiting_count(), 1);
        assert_eq!(registry.active_session_count(), 0);
        assert!(registry.is_waiting(a));
        assert!(registry.waiting_entry(a).is_some_and(|entry| entry.connection_id == a));
    }

    #[test]
    fn second_enroll_pairs_with_waiter() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        let _ = registry.enroll(a);
        assert_eq!(registry.enroll(b), MatchOutcome::PairedWith(a));
        assert_eq!(registry.partner_of(a), Some(b));
        assert_eq!(registry.partner_of(b), Some(a));
        assert_eq!(
            registry.counts(),
            RegistryCounts {
                waiting: 0,
                active_sessions: 1
            }
        );

        let Some(pairing) = registry.pairing_of(a) else {
            panic!("expected pairing");
        };
        assert_eq!(pairing.initiator, b);
        assert_eq!(pairing.receiver, a);
        assert_invariants(&registry);
    }

    #[test]
    fn disband_returns_partner_and_clears_both_sides() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let _ = registry.enroll(a);
        let _ = registry.enroll(b);

        assert_eq!(registry.disband(a), Some(b));
        assert_eq!(registry.partner_of(b), None);
        assert_eq!(registry.partner_of(a), None);
        assert_eq!(registry.active_session_count(), 0);
        assert_eq!(registry.waiting_count(), 0);
        assert_invariants(&registry);
    }

    #[test]
    fn disband_unknown_is_noop() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();
        let _ = registry.enroll(a);

        assert_eq!(registry.disband(ConnectionId::new()), None);
        assert_eq!(registry.waiting_count(), 1);
        assert_invariants(&registry);
    }

    #[test]
    fn disband_waiting_removes_from_queue() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();
        let _ = registry.enroll(a);

        assert_eq!(registry.disband(a), None);
        assert_eq!(registry.waiting_count(), 0);
        assert!(!registry.is_waiting(a));
    }

    #[test]
    fn double_enroll_does_not_self_match() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();

        assert_eq!(registry.enroll(a), MatchOutcome::Waiting);
        assert_eq!(registry.enroll(a), MatchOutcome::Waiting);
        assert_eq!(registry.waiting_count(), 1);
        assert_eq!(registry.partner_of(a), None);
        assert_invariants(&registry);
    }

    #[test]
    fn re_enroll_while_paired_breaks_old_pairing() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let _ = registry.enroll(a);
        let _ = registry.enroll(b);

        // b asks again: its pairing with a is gone and b waits alone.
        assert_eq!(registry.enroll(b), MatchOutcome::Waiting);
        assert_eq!(registry.partner_of(a), None);
        assert!(!registry.is_waiting(a));
        assert!(registry.is_waiting(b));
        assert_invariants(&registry);
    }

    #[test]
    fn longest_waiter_is_matched_first() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        let c = ConnectionId::new();
        let d = ConnectionId::new();

        let _ = registry.enroll(a);
        let _ = registry.enroll(b);
        let _ = registry.enroll(c);
        // a/b paired, c waiting. Tearing down a/b leaves both idle.
        let _ = registry.disband(b);
        assert_eq!(registry.enroll(d), MatchOutcome::PairedWith(c));
        assert_eq!(registry.enroll(a), MatchOutcome::Waiting);
        assert_eq!(registry.enroll(b), MatchOutcome::PairedWith(a));
        assert_invariants(&registry);
    }

    #[test]
    fn transaction_combines_operations_atomically() {
        let registry = PairingRegistry::new();
        let a = ConnectionId::new();
        let b = ConnectionId::new();

        {
            let mut txn = registry.transaction();
            assert_eq!(txn.enroll(a), MatchOutcome::Waiting);
            assert!(txn.is_waiting(a));
            assert_eq!(txn.enroll(b), MatchOutcome::PairedWith(a));
            assert_eq!(txn.partner_of(a), Some(b));
        }
        assert_eq!(registry.active_session_count(), 1);
    }

    #[test]
    fn random_interleavings_preserve_invariants() {
        let mut rng = StdRng::seed_from_u64(0x5eed);

        for _round in 0..50 {
            let registry = PairingRegistry::new();
            let mut model = Model::default();
            let ids: Vec<ConnectionId> = (0..8).map(|_| ConnectionId::new()).collect();

            for _step in 0..200 {
                let id = ids[rng.random_range(0..ids.len())];
                if rng.random_bool(0.6) {
                    assert_eq!(registry.enroll(id), model.enroll(id));
                } else {
                    assert_eq!(registry.disband(id), model.disband(id));
                }
                assert_invariants(&registry);
                assert_eq!(registry.waiting_count(), model.waiting.len());
                assert_eq!(registry.active_session_count(), model.pairs.len() / 2);
                for id in &ids {
                    assert_eq!(registry.partner_of(*id), model.pairs.get(id).copied());
                }
            }
        }
    }

    #[test]
    fn concurrent_callers_preserve_invariants() {
        let registry = PairingRegistry::new();

        std::thread::scope(|scope| {
            for worker in 0..8u64 {
                let registry = &registry;
                scope.spawn(move || {
                    let mut rng = StdRng::seed_from_u64(worker);
                    let own: Vec<ConnectionId> = (0..4).map(|_| ConnectionId::new()).collect();
                    for _ in 0..500 {
                        let id = own[rng.random_range(0..own.len())];
                        match rng.random_range(0..3) {
                            0 | 1 => {
                                let _ = registry.enroll(id);
                            }
                            _ => {
                                let _ = registry.disband(id);
                            }
                        }
                    }
                });
            }
        });

        assert_invariants(&registry);
        assert!(registry.waiting_count() <= 1);
    }
}
