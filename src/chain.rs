//! Chain parser: nested API evolution chain into an [`EvolutionNode`] tree.

use tracing::debug;
use url::Url;

use crate::api::types::{ChainLink, EvolutionChain, NamedResource, RawEvolutionDetail};
use crate::error::{Error, Result};
use crate::model::{
    EvolutionNode, Gender, RelativeStats, Requirements, TransitionCondition, Trigger,
};

/// Deepest chain accepted from upstream. Real chains have at most three stages.
pub const MAX_CHAIN_DEPTH: usize = 64;

/// Parse an evolution chain record into a tree of the same shape
pub fn parse_chain(chain: &EvolutionChain) -> Result<EvolutionNode> {
    let tree = parse_link(&chain.chain, 1)?;
    debug!(
        chain = chain.id,
        nodes = tree.node_count(),
        "parsed evolution chain"
    );
    Ok(tree)
}

fn parse_link(link: &ChainLink, depth: usize) -> Result<EvolutionNode> {
    if depth > MAX_CHAIN_DEPTH {
        return Err(Error::MalformedChain(format!(
            "chain is deeper than {MAX_CHAIN_DEPTH} stages at {:?}",
            link.species.name
        )));
    }

    let children = link
        .evolves_to
        .iter()
        .map(|child| parse_link(child, depth + 1))
        .collect::<Result<Vec<_>>>()?;

    Ok(EvolutionNode {
        name: link.species.name.clone(),
        species_id: extract_id(&link.species.url)?,
        conditions: link
            .evolution_details
            .iter()
            .map(TransitionCondition::from)
            .collect(),
        children,
    })
}

/// Numeric id from the trailing path segment of a reference URL
///
/// `https://pokeapi.co/api/v2/pokemon-species/25/` yields 25.
pub fn extract_id(reference: &str) -> Result<u32> {
    let fail = || Error::IdentifierExtraction(reference.to_string());

    let url = Url::parse(reference).map_err(|_| fail())?;
    let segment = url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .ok_or_else(fail)?;

    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(fail());
    }
    segment.parse().map_err(|_| fail())
}

fn name_of(resource: &Option<NamedResource>) -> Option<String> {
    resource.as_ref().map(|r| r.name.clone())
}

fn trigger_from(detail: &RawEvolutionDetail) -> Trigger {
    let Some(trigger) = &detail.trigger else {
        return Trigger::Unrecognized {
            trigger: "unknown".to_string(),
        };
    };

    match trigger.name.as_str() {
        "level-up" => Trigger::LevelUp {
            min_level: detail.min_level,
        },
        "use-item" => Trigger::UseItem {
            item: name_of(&detail.item),
        },
        "trade" => Trigger::Trade {
            trade_species: name_of(&detail.trade_species),
        },
        "shed" => Trigger::Shed,
        "spin" => Trigger::Spin,
        "tower-of-darkness" => Trigger::TowerOfDarkness,
        "tower-of-waters" => Trigger::TowerOfWaters,
        "three-critical-hits" => Trigger::ThreeCriticalHits,
        "take-damage" => Trigger::TakeDamage,
        "agile-style-move" => Trigger::AgileStyleMove,
        "strong-style-move" => Trigger::StrongStyleMove,
        "recoil-damage" => Trigger::RecoilDamage,
        "other" => Trigger::Other,
        other => Trigger::Unrecognized {
            trigger: other.to_string(),
        },
    }
}

impl From<&RawEvolutionDetail> for TransitionCondition {
    fn from(detail: &RawEvolutionDetail) -> Self {
        let gender = match detail.gender {
            Some(1) => Some(Gender::Female),
            Some(2) => Some(Gender::Male),
            _ => None,
        };
        let relative_physical_stats = match detail.relative_physical_stats {
            Some(1) => Some(RelativeStats::AttackHigher),
            Some(0) => Some(RelativeStats::Equal),
            Some(-1) => Some(RelativeStats::DefenseHigher),
            _ => None,
        };

        TransitionCondition {
            trigger: trigger_from(detail),
            requirements: Requirements {
                held_item: name_of(&detail.held_item),
                time_of_day: detail
                    .time_of_day
                    .as_deref()
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string),
                location: name_of(&detail.location),
                known_move: name_of(&detail.known_move),
                known_move_type: name_of(&detail.known_move_type),
                min_happiness: detail.min_happiness,
                min_affection: detail.min_affection,
                min_beauty: detail.min_beauty,
                gender,
                relative_physical_stats,
                party_species: name_of(&detail.party_species),
                party_type: name_of(&detail.party_type),
                needs_overworld_rain: detail.needs_overworld_rain.unwrap_or(false),
                turn_upside_down: detail.turn_upside_down.unwrap_or(false),
            },
        }
    }
}
