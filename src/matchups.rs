//! Type-effectiveness aggregation for the detail view.
//!
//! Each defending type contributes its damage relations; the attacking types
//! accumulate a power-of-two exponent plus an immunity flag so that products
//! stay exact (2 x 0.5 is 1, and any immunity wins).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::api::types::DamageRelations;

/// The closed set of 18 elemental types
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeName {
    Normal,
    Fire,
    Water,
    Electric,
    Grass,
    Ice,
    Fighting,
    Poison,
    Ground,
    Flying,
    Psychic,
    Bug,
    Rock,
    Ghost,
    Dragon,
    Dark,
    Steel,
    Fairy,
}

impl TypeName {
    pub const ALL: [TypeName; 18] = [
        TypeName::Normal,
        TypeName::Fire,
        TypeName::Water,
        TypeName::Electric,
        TypeName::Grass,
        TypeName::Ice,
        TypeName::Fighting,
        TypeName::Poison,
        TypeName::Ground,
        TypeName::Flying,
        TypeName::Psychic,
        TypeName::Bug,
        TypeName::Rock,
        TypeName::Ghost,
        TypeName::Dragon,
        TypeName::Dark,
        TypeName::Steel,
        TypeName::Fairy,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TypeName::Normal => "normal",
            TypeName::Fire => "fire",
            TypeName::Water => "water",
            TypeName::Electric => "electric",
            TypeName::Grass => "grass",
            TypeName::Ice => "ice",
            TypeName::Fighting => "fighting",
            TypeName::Poison => "poison",
            TypeName::Ground => "ground",
            TypeName::Flying => "flying",
            TypeName::Psychic => "psychic",
            TypeName::Bug => "bug",
            TypeName::Rock => "rock",
            TypeName::Ghost => "ghost",
            TypeName::Dragon => "dragon",
            TypeName::Dark => "dark",
            TypeName::Steel => "steel",
            TypeName::Fairy => "fairy",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown type {0:?}")]
pub struct UnknownType(pub String);

impl FromStr for TypeName {
    type Err = UnknownType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeName::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownType(s.to_string()))
    }
}

/// Damage multiplier bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Multiplier {
    #[serde(rename = "4x")]
    Quadruple,
    #[serde(rename = "2x")]
    Double,
    #[serde(rename = "1x")]
    Neutral,
    #[serde(rename = "0.5x")]
    Half,
    #[serde(rename = "0.25x")]
    Quarter,
    #[serde(rename = "0x")]
    Immune,
}

impl Multiplier {
    /// Non-neutral buckets in display order
    pub const DISPLAY_ORDER: [Multiplier; 5] = [
        Multiplier::Quadruple,
        Multiplier::Double,
        Multiplier::Half,
        Multiplier::Quarter,
        Multiplier::Immune,
    ];

    pub fn value(self) -> f64 {
        match self {
            Multiplier::Quadruple => 4.0,
            Multiplier::Double => 2.0,
            Multiplier::Neutral => 1.0,
            Multiplier::Half => 0.5,
            Multiplier::Quarter => 0.25,
            Multiplier::Immune => 0.0,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Multiplier::Quadruple => "4x",
            Multiplier::Double => "2x",
            Multiplier::Neutral => "1x",
            Multiplier::Half => "0.5x",
            Multiplier::Quarter => "0.25x",
            Multiplier::Immune => "0x",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Factor {
    exponent: i32,
    immune: bool,
}

/// Running product of damage multipliers per attacking type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeMultiplierTable {
    factors: [Factor; 18],
}

impl TypeMultiplierTable {
    /// All types at 1x
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one defending type's relations. Unknown type names are ignored.
    pub fn apply(&mut self, relations: &DamageRelations) {
        for (list, step) in [
            (&relations.double_damage_from, 1),
            (&relations.half_damage_from, -1),
        ] {
            for attacker in list {
                if let Ok(t) = attacker.name.parse::<TypeName>() {
                    self.factors[t.index()].exponent += step;
                }
            }
        }
        for attacker in &relations.no_damage_from {
            if let Ok(t) = attacker.name.parse::<TypeName>() {
                self.factors[t.index()].immune = true;
            }
        }
    }

    /// Exact multiplier for `attacker`
    pub fn multiplier(&self, attacker: TypeName) -> f64 {
        let factor = self.factors[attacker.index()];
        if factor.immune {
            0.0
        } else {
            2f64.powi(factor.exponent)
        }
    }

    /// Bucket for `attacker`; products beyond 4x or 0.25x are clamped
    pub fn bucket(&self, attacker: TypeName) -> Multiplier {
        let factor = self.factors[attacker.index()];
        if factor.immune {
            return Multiplier::Immune;
        }
        if factor.exponent.abs() > 2 {
            warn!(
                attacker = %attacker,
                multiplier = self.multiplier(attacker),
                "clamping damage multiplier"
            );
        }
        match factor.exponent {
            e if e >= 2 => Multiplier::Quadruple,
            1 => Multiplier::Double,
            0 => Multiplier::Neutral,
            -1 => Multiplier::Half,
            _ => Multiplier::Quarter,
        }
    }

    pub fn into_matchups(self) -> Matchups {
        Matchups {
            buckets: TypeName::ALL.into_iter().map(|t| (t, self.bucket(t))).collect(),
        }
    }
}

/// Bucketed matchups of one defender against every attacking type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "MatchupsJson", from = "MatchupsJson")]
pub struct Matchups {
    buckets: BTreeMap<TypeName, Multiplier>,
}

/// Wire shape: the per-type table plus the non-neutral buckets
#[derive(Serialize, Deserialize)]
struct MatchupsJson {
    buckets: BTreeMap<TypeName, Multiplier>,
    #[serde(default)]
    display: BTreeMap<Multiplier, Vec<TypeName>>,
}

impl From<Matchups> for MatchupsJson {
    fn from(matchups: Matchups) -> Self {
        let display = matchups.display_buckets().into_iter().collect();
        Self {
            buckets: matchups.buckets,
            display,
        }
    }
}

impl From<MatchupsJson> for Matchups {
    fn from(json: MatchupsJson) -> Self {
        Self {
            buckets: json.buckets,
        }
    }
}

impl Matchups {
    pub fn multiplier_of(&self, attacker: TypeName) -> Multiplier {
        self.buckets
            .get(&attacker)
            .copied()
            .unwrap_or(Multiplier::Neutral)
    }

    /// Attacking types that land in exactly `multiplier`
    pub fn bucket(&self, multiplier: Multiplier) -> Vec<TypeName> {
        self.buckets
            .iter()
            .filter(|(_, m)| **m == multiplier)
            .map(|(t, _)| *t)
            .collect()
    }

    /// 4x and 2x attackers
    pub fn weaknesses(&self) -> Vec<TypeName> {
        self.matching(|m| matches!(m, Multiplier::Quadruple | Multiplier::Double))
    }

    /// 0.5x and 0.25x attackers
    pub fn resistances(&self) -> Vec<TypeName> {
        self.matching(|m| matches!(m, Multiplier::Half | Multiplier::Quarter))
    }

    pub fn immunities(&self) -> Vec<TypeName> {
        self.bucket(Multiplier::Immune)
    }

    /// Non-empty, non-neutral buckets in the order 4, 2, 0.5, 0.25, 0
    pub fn display_buckets(&self) -> Vec<(Multiplier, Vec<TypeName>)> {
        Multiplier::DISPLAY_ORDER
            .into_iter()
            .map(|m| (m, self.bucket(m)))
            .filter(|(_, types)| !types.is_empty())
            .collect()
    }

    fn matching(&self, keep: impl Fn(Multiplier) -> bool) -> Vec<TypeName> {
        self.buckets
            .iter()
            .filter(|(_, m)| keep(**m))
            .map(|(t, _)| *t)
            .collect()
    }
}

/// Combine the damage relations of a defender's types
pub fn aggregate<'a>(relations: impl IntoIterator<Item = &'a DamageRelations>) -> Matchups {
    let mut table = TypeMultiplierTable::new();
    for r in relations {
        table.apply(r);
    }
    table.into_matchups()
}
