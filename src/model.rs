//! Normalized evolution data: transition conditions and the parsed chain tree.

use serde::{Deserialize, Serialize};

/// What kind of event causes the evolution, with the fields only that event uses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Trigger {
    LevelUp {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_level: Option<u32>,
    },
    UseItem {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        item: Option<String>,
    },
    Trade {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        trade_species: Option<String>,
    },
    Shed,
    Spin,
    TowerOfDarkness,
    TowerOfWaters,
    ThreeCriticalHits,
    TakeDamage,
    AgileStyleMove,
    StrongStyleMove,
    RecoilDamage,
    Other,
    /// A trigger slug this crate does not know; kept verbatim
    Unrecognized { trigger: String },
}

impl Trigger {
    /// The API slug for this trigger (e.g. "level-up")
    pub fn slug(&self) -> &str {
        match self {
            Trigger::LevelUp { .. } => "level-up",
            Trigger::UseItem { .. } => "use-item",
            Trigger::Trade { .. } => "trade",
            Trigger::Shed => "shed",
            Trigger::Spin => "spin",
            Trigger::TowerOfDarkness => "tower-of-darkness",
            Trigger::TowerOfWaters => "tower-of-waters",
            Trigger::ThreeCriticalHits => "three-critical-hits",
            Trigger::TakeDamage => "take-damage",
            Trigger::AgileStyleMove => "agile-style-move",
            Trigger::StrongStyleMove => "strong-style-move",
            Trigger::RecoilDamage => "recoil-damage",
            Trigger::Other => "other",
            Trigger::Unrecognized { trigger } => trigger,
        }
    }
}

/// Required gender for an evolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

/// Attack compared to Defense, as required by some evolutions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelativeStats {
    AttackHigher,
    Equal,
    DefenseHigher,
}

/// Optional clauses that refine a trigger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Requirements {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub held_item: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_of_day: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_move: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub known_move_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_happiness: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_affection: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_beauty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_physical_stats: Option<RelativeStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_species: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party_type: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub needs_overworld_rain: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub turn_upside_down: bool,
}

/// The structured description of what causes one life stage to become the next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCondition {
    pub trigger: Trigger,
    #[serde(default)]
    pub requirements: Requirements,
}

impl TransitionCondition {
    /// A condition with only a trigger and no extra clauses
    pub fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            requirements: Requirements::default(),
        }
    }

    /// Level-up at the given level
    pub fn level_up(min_level: u32) -> Self {
        Self::new(Trigger::LevelUp {
            min_level: Some(min_level),
        })
    }
}

/// A node of the parsed evolution tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionNode {
    /// Species slug (e.g. "bulbasaur")
    pub name: String,

    /// Numeric species id taken from the reference URL
    pub species_id: u32,

    /// Conditions for evolving into this node; the first one is authoritative for display
    pub conditions: Vec<TransitionCondition>,

    /// Next stages, in source order
    pub children: Vec<EvolutionNode>,
}

impl EvolutionNode {
    /// Number of nodes in this subtree, including itself
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Self::node_count).sum::<usize>()
    }

    /// Number of levels in this subtree (a leaf has depth 1)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Self::depth).max().unwrap_or(0)
    }

    /// The condition shown on the edge leading into this node
    pub fn display_condition(&self) -> Option<&TransitionCondition> {
        self.conditions.first()
    }
}

/// A type slot on a creature (slot 1 is the primary type)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeRef {
    pub slot: u8,
    pub name: String,
}

/// Top-left corner of a laid-out node
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}
