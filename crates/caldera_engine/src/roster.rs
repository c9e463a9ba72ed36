//! # Player Roster
//!
//! Alive and spectating players of the running session. A player is in at
//! most one of the two sets.

use std::collections::BTreeSet;

use caldera_core::PlayerId;

/// Result of an elimination.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Elimination {
    /// The player was not alive; nothing changed.
    NotAlive,
    /// More than one player is still alive.
    Continue(usize),
    /// Exactly one player is left.
    Winner(PlayerId),
    /// Nobody is left.
    NoSurvivors,
}

/// Alive / spectator partition.
#[derive(Clone, Debug, Default)]
pub struct Roster {
    alive: BTreeSet<PlayerId>,
    spectators: BTreeSet<PlayerId>,
}

impl Roster {
    /// Creates an empty roster.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the roster with `players`, all alive.
    pub fn begin(&mut self, players: impl IntoIterator<Item = PlayerId>) {
        self.spectators.clear();
        self.alive = players.into_iter().collect();
    }

    /// Moves an alive player to the spectators and reports what is left.
    pub fn eliminate(&mut self, player: PlayerId) -> Elimination {
        if !self.alive.remove(&player) {
            return Elimination::NotAlive;
        }
        self.spectators.insert(player);
        self.outcome()
    }

    /// Win condition over the current alive set.
    #[must_use]
    pub fn outcome(&self) -> Elimination {
        match self.alive.len() {
            0 => Elimination::NoSurvivors,
            1 => self
                .alive
                .first()
                .map_or(Elimination::NoSurvivors, |p| Elimination::Winner(*p)),
            n => Elimination::Continue(n),
        }
    }

    /// Adds a spectator. Returns false if the player is already in the
    /// roster.
    pub fn add_spectator(&mut self, player: PlayerId) -> bool {
        if self.contains(player) {
            return false;
        }
        self.spectators.insert(player)
    }

    /// Removes a player from either set.
    pub fn remove(&mut self, player: PlayerId) -> bool {
        self.alive.remove(&player) | self.spectators.remove(&player)
    }

    /// Returns true if the player is alive or spectating.
    #[must_use]
    pub fn contains(&self, player: PlayerId) -> bool {
        self.alive.contains(&player) || self.spectators.contains(&player)
    }

    /// Returns true if the player is alive.
    #[must_use]
    pub fn is_alive(&self, player: PlayerId) -> bool {
        self.alive.contains(&player)
    }

    /// Players alive.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Spectators.
    #[must_use]
    pub fn spectator_count(&self) -> usize {
        self.spectators.len()
    }

    /// Sorted copy of the alive set.
    #[must_use]
    pub fn alive_ids(&self) -> Vec<PlayerId> {
        self.alive.iter().copied().collect()
    }

    /// Sorted copy of the spectator set.
    #[must_use]
    pub fn spectator_ids(&self) -> Vec<PlayerId> {
        self.spectators.iter().copied().collect()
    }

    /// Everyone in the roster.
    #[must_use]
    pub fn all_ids(&self) -> Vec<PlayerId> {
        self.alive.union(&self.spectators).copied().collect()
    }

    /// Empties both sets.
    pub fn reset(&mut self) {
        self.alive.clear();
        self.spectators.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roster_of(ids: &[u64]) -> Roster {
        let mut roster = Roster::new();
        roster.begin(ids.iter().map(|id| PlayerId(*id)));
        roster
    }

    #[test]
    fn test_elimination_sequence() {
        let mut roster = roster_of(&[1, 2, 3]);
        assert_eq!(roster.eliminate(PlayerId(2)), Elimination::Continue(2));
        assert_eq!(roster.eliminate(PlayerId(2)), Elimination::NotAlive);
        assert_eq!(roster.eliminate(PlayerId(1)), Elimination::Winner(PlayerId(3)));
        assert_eq!(roster.eliminate(PlayerId(3)), Elimination::NoSurvivors);
        assert_eq!(roster.spectator_ids(), vec![PlayerId(1), PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_spectator_rules() {
        let mut roster = roster_of(&[1]);
        assert!(!roster.add_spectator(PlayerId(1)));
        assert!(roster.add_spectator(PlayerId(9)));
        assert!(!roster.add_spectator(PlayerId(9)));
        assert_eq!(roster.spectator_count(), 1);
        assert!(roster.remove(PlayerId(9)));
        assert!(!roster.contains(PlayerId(9)));
    }

    #[derive(Clone, Debug)]
    enum Op {
        Eliminate(u64),
        Spectate(u64),
        Remove(u64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0u64..12).prop_map(Op::Eliminate),
            (0u64..12).prop_map(Op::Spectate),
            (0u64..12).prop_map(Op::Remove),
        ]
    }

    proptest! {
        #[test]
        fn prop_sets_stay_disjoint(
            initial in proptest::collection::btree_set(0u64..12, 0..8),
            ops in proptest::collection::vec(op(), 0..64),
        ) {
            let mut roster = Roster::new();
            roster.begin(initial.iter().map(|id| PlayerId(*id)));

            for op in ops {
                match op {
                    Op::Eliminate(id) => { roster.eliminate(PlayerId(id)); }
                    Op::Spectate(id) => { roster.add_spectator(PlayerId(id)); }
                    Op::Remove(id) => { roster.remove(PlayerId(id)); }
                }

                let alive: BTreeSet<_> = roster.alive_ids().into_iter().collect();
                let spectators: BTreeSet<_> = roster.spectator_ids().into_iter().collect();
                prop_assert!(alive.is_disjoint(&spectators));
                prop_assert_eq!(roster.all_ids().len(), alive.len() + spectators.len());
            }
        }
    }
}
