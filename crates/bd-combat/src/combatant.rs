//! Combatant identity, teams, and the capability surface the battle core
//! consumes.
//!
//! The core never inspects a combatant for optional fields: everything it
//! needs is on the [`Combatant`] trait. [`Unit`] is the stock
//! implementation, loadable from encounter data.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::buff::BuffKind;
use crate::damage::DamageType;
use crate::status::StatusKind;

/// Stable per-battle identifier, handed out in enlist order.
///
/// Ordering on ids is join order, which is what initiative ties break on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CombatantId(pub u32);

impl fmt::Display for CombatantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The two sides of an encounter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    /// The player's side.
    Friends,
    /// The opposing side.
    Foes,
}

impl Team {
    /// The side this team fights against.
    pub fn opponent(self) -> Self {
        match self {
            Self::Friends => Self::Foes,
            Self::Foes => Self::Friends,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Friends => write!(f, "friends"),
            Self::Foes => write!(f, "foes"),
        }
    }
}

/// What the battle core needs from anything that fights.
pub trait Combatant {
    /// Display name.
    fn name(&self) -> &str;

    /// Current hit points.
    fn hp(&self) -> i32;

    /// Maximum hit points. Must be positive.
    fn max_hp(&self) -> i32;

    /// Overwrite current hit points. Callers pass values already clamped
    /// to `[0, max_hp]`.
    fn set_hp(&mut self, hp: i32);

    /// Initiative speed; higher acts first.
    fn speed(&self) -> i32;

    /// Which side this combatant fights on.
    fn team(&self) -> Team;

    /// Type used to look up incoming damage modifiers.
    fn defense_type(&self) -> DamageType {
        DamageType::Physical
    }

    /// Type of this combatant's basic strikes.
    fn attack_type(&self) -> DamageType {
        DamageType::Physical
    }

    /// Raw attack rating for basic strikes.
    fn attack(&self) -> i32 {
        0
    }

    /// Flat reduction applied to incoming basic strikes.
    fn defense(&self) -> i32 {
        0
    }

    /// Statuses applied when the combatant is enlisted.
    fn starting_statuses(&self) -> &[StatusKind] {
        &[]
    }

    /// Buffs applied when the combatant is enlisted.
    fn starting_buffs(&self) -> &[BuffKind] {
        &[]
    }

    /// Whether the combatant can still act and be targeted.
    fn is_alive(&self) -> bool {
        self.hp() > 0
    }
}

/// Base numbers for a [`Unit`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Maximum hit points.
    pub max_hp: i32,
    /// Initiative speed.
    #[serde(default)]
    pub speed: i32,
    /// Basic strike rating.
    #[serde(default)]
    pub attack: i32,
    /// Flat reduction against basic strikes.
    #[serde(default)]
    pub defense: i32,
}

impl StatBlock {
    /// Create a stat block.
    pub fn new(max_hp: i32, speed: i32, attack: i32, defense: i32) -> Self {
        Self {
            max_hp,
            speed,
            attack,
            defense,
        }
    }
}

impl fmt::Display for StatBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[HP {} | SPD {} | ATK {} | DEF {}]",
            self.max_hp, self.speed, self.attack, self.defense
        )
    }
}

/// A data-driven combatant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "UnitRecord")]
pub struct Unit {
    /// Display name.
    pub name: String,
    /// Which side the unit fights on.
    pub team: Team,
    /// Base numbers.
    pub stats: StatBlock,
    /// Current hit points, kept within `[0, stats.max_hp]`.
    hp: i32,
    /// Type used for incoming damage modifiers.
    pub defense_type: DamageType,
    /// Type of basic strikes.
    pub attack_type: DamageType,
    /// Buffs applied on enlist.
    pub starting_buffs: Vec<BuffKind>,
    /// Statuses applied on enlist.
    pub starting_statuses: Vec<StatusKind>,
}

impl Unit {
    /// Create a unit at full health with physical attack and defense types.
    pub fn new(name: impl Into<String>, team: Team, stats: StatBlock) -> Self {
        let hp = stats.max_hp.max(0);
        Self {
            name: name.into(),
            team,
            stats,
            hp,
            defense_type: DamageType::Physical,
            attack_type: DamageType::Physical,
            starting_buffs: Vec::new(),
            starting_statuses: Vec::new(),
        }
    }

    /// Start the unit at a specific hp, clamped to `[0, max_hp]`.
    pub fn with_hp(mut self, hp: i32) -> Self {
        self.hp = hp.clamp(0, self.stats.max_hp.max(0));
        self
    }

    /// Set the defense type.
    pub fn with_defense_type(mut self, ty: DamageType) -> Self {
        self.defense_type = ty;
        self
    }

    /// Set the attack type.
    pub fn with_attack_type(mut self, ty: DamageType) -> Self {
        self.attack_type = ty;
        self
    }

    /// Add a buff applied on enlist.
    pub fn with_starting_buff(mut self, kind: BuffKind) -> Self {
        self.starting_buffs.push(kind);
        self
    }

    /// Add a status applied on enlist.
    pub fn with_starting_status(mut self, kind: StatusKind) -> Self {
        self.starting_statuses.push(kind);
        self
    }

    /// Fraction of health remaining (0.0 to 1.0).
    pub fn health_fraction(&self) -> f64 {
        if self.stats.max_hp <= 0 {
            return 0.0;
        }
        self.hp as f64 / self.stats.max_hp as f64
    }
}

impl Combatant for Unit {
    fn name(&self) -> &str {
        &self.name
    }

    fn hp(&self) -> i32 {
        self.hp
    }

    fn max_hp(&self) -> i32 {
        self.stats.max_hp
    }

    fn set_hp(&mut self, hp: i32) {
        self.hp = hp.clamp(0, self.stats.max_hp.max(0));
    }

    fn speed(&self) -> i32 {
        self.stats.speed
    }

    fn team(&self) -> Team {
        self.team
    }

    fn defense_type(&self) -> DamageType {
        self.defense_type.clone()
    }

    fn attack_type(&self) -> DamageType {
        self.attack_type.clone()
    }

    fn attack(&self) -> i32 {
        self.stats.attack
    }

    fn defense(&self) -> i32 {
        self.stats.defense
    }

    fn starting_statuses(&self) -> &[StatusKind] {
        &self.starting_statuses
    }

    fn starting_buffs(&self) -> &[BuffKind] {
        &self.starting_buffs
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}/{}", self.name, self.team, self.hp, self.stats.max_hp)
    }
}

/// Serialized form of a [`Unit`]; `hp` is optional and defaults to full.
#[derive(Deserialize)]
struct UnitRecord {
    name: String,
    team: Team,
    stats: StatBlock,
    #[serde(default)]
    hp: Option<i32>,
    #[serde(default)]
    defense_type: DamageType,
    #[serde(default)]
    attack_type: DamageType,
    #[serde(default)]
    starting_buffs: Vec<BuffKind>,
    #[serde(default)]
    starting_statuses: Vec<StatusKind>,
}

impl From<UnitRecord> for Unit {
    fn from(record: UnitRecord) -> Self {
        let hp = record.hp.unwrap_or(record.stats.max_hp);
        Unit {
            name: record.name,
            team: record.team,
            stats: record.stats,
            hp: 0,
            defense_type: record.defense_type,
            attack_type: record.attack_type,
            starting_buffs: record.starting_buffs,
            starting_statuses: record.starting_statuses,
        }
        .with_hp(hp)
    }
}
