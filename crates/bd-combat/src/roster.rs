//! Per-battle combatant storage.

use crate::combatant::{Combatant, CombatantId, Team};

/// Owns every enlisted combatant, indexed by [`CombatantId`].
///
/// Ids are handed out sequentially, so id order is join order.
#[derive(Debug, Clone)]
pub struct Roster<C> {
    members: Vec<C>,
}

impl<C> Default for Roster<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Roster<C> {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    /// Add a combatant and return its id.
    pub fn push(&mut self, combatant: C) -> CombatantId {
        let id = CombatantId(self.members.len() as u32);
        self.members.push(combatant);
        id
    }

    /// Look up a combatant.
    pub fn get(&self, id: CombatantId) -> Option<&C> {
        self.members.get(id.0 as usize)
    }

    /// Look up a combatant mutably.
    pub fn get_mut(&mut self, id: CombatantId) -> Option<&mut C> {
        self.members.get_mut(id.0 as usize)
    }

    /// Iterate `(id, combatant)` in join order.
    pub fn iter(&self) -> impl Iterator<Item = (CombatantId, &C)> {
        self.members
            .iter()
            .enumerate()
            .map(|(i, c)| (CombatantId(i as u32), c))
    }

    /// Number of enlisted combatants, alive or not.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if nobody is enlisted.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Give back the combatants in join order.
    pub fn into_inner(self) -> Vec<C> {
        self.members
    }
}

impl<C: Combatant> Roster<C> {
    /// Living members of `team`, in join order.
    pub fn alive_on(&self, team: Team) -> Vec<CombatantId> {
        self.iter()
            .filter(|(_, c)| c.team() == team && c.is_alive())
            .map(|(id, _)| id)
            .collect()
    }

    /// Whether `id` is enlisted and alive.
    pub fn is_alive(&self, id: CombatantId) -> bool {
        self.get(id).is_some_and(|c| c.is_alive())
    }

    /// Team of `id`, if enlisted.
    pub fn team_of(&self, id: CombatantId) -> Option<Team> {
        self.get(id).map(|c| c.team())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combatant::{StatBlock, Unit};

    fn unit(name: &str, team: Team, hp: i32) -> Unit {
        Unit::new(name, team, StatBlock::new(10, 5, 1, 0)).with_hp(hp)
    }

    #[test]
    fn ids_follow_join_order() {
        let mut roster = Roster::new();
        let a = roster.push(unit("A", Team::Friends, 10));
        let b = roster.push(unit("B", Team::Foes, 10));
        assert_eq!(a, CombatantId(0));
        assert_eq!(b, CombatantId(1));
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get(b).unwrap().name, "B");
        assert!(roster.get(CombatantId(7)).is_none());
    }

    #[test]
    fn alive_on_filters_team_and_hp() {
        let mut roster = Roster::new();
        let a = roster.push(unit("A", Team::Friends, 10));
        roster.push(unit("B", Team::Friends, 0));
        let c = roster.push(unit("C", Team::Foes, 3));
        assert_eq!(roster.alive_on(Team::Friends), vec![a]);
        assert_eq!(roster.alive_on(Team::Foes), vec![c]);
        assert!(!roster.is_alive(CombatantId(1)));
        assert_eq!(roster.team_of(c), Some(Team::Foes));
    }

    #[test]
    fn empty_roster() {
        let roster: Roster<Unit> = Roster::default();
        assert!(roster.is_empty());
        assert!(roster.alive_on(Team::Friends).is_empty());
        assert!(roster.into_inner().is_empty());
    }
}
