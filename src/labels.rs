//! Edge label formatting for transition conditions.
//!
//! The base phrase comes from the trigger; clauses are appended in a fixed order:
//! level, held item, time of day, location, required move or move type,
//! friendship/affection/beauty thresholds, gender, relative physical stats,
//! party species/type, weather, orientation.

use crate::model::{Gender, RelativeStats, TransitionCondition, Trigger};

/// Human-readable label for a single condition
pub fn format_condition(condition: &TransitionCondition) -> String {
    let mut parts = vec![base_phrase(&condition.trigger)];
    let req = &condition.requirements;

    if let Some(item) = &req.held_item {
        parts.push(format!("w/ {}", humanize(item)));
    }
    if let Some(time) = &req.time_of_day {
        parts.push(format!("({time})"));
    }
    if let Some(location) = &req.location {
        parts.push(format!("@ {}", humanize(location)));
    }
    if let Some(known_move) = &req.known_move {
        parts.push(format!("knowing {}", humanize(known_move)));
    }
    if let Some(move_type) = &req.known_move_type {
        parts.push(format!("knowing {} move", humanize(move_type)));
    }
    if let Some(happiness) = req.min_happiness {
        parts.push(format!("friendship {happiness}+"));
    }
    if let Some(affection) = req.min_affection {
        parts.push(format!("affection {affection}+"));
    }
    if let Some(beauty) = req.min_beauty {
        parts.push(format!("beauty {beauty}+"));
    }
    if let Some(gender) = req.gender {
        parts.push(
            match gender {
                Gender::Female => "(female)",
                Gender::Male => "(male)",
            }
            .to_string(),
        );
    }
    if let Some(stats) = req.relative_physical_stats {
        parts.push(
            match stats {
                RelativeStats::AttackHigher => "Atk > Def",
                RelativeStats::Equal => "Atk = Def",
                RelativeStats::DefenseHigher => "Atk < Def",
            }
            .to_string(),
        );
    }
    if let Some(species) = &req.party_species {
        parts.push(format!("with {} in party", humanize(species)));
    }
    if let Some(party_type) = &req.party_type {
        parts.push(format!("with {}-type in party", humanize(party_type)));
    }
    if req.needs_overworld_rain {
        parts.push("in rain".to_string());
    }
    if req.turn_upside_down {
        parts.push("upside down".to_string());
    }

    parts.join(" ")
}

/// Label for the first listed condition; later alternatives are ignored
pub fn format_first(conditions: &[TransitionCondition]) -> Option<String> {
    conditions.first().map(format_condition)
}

/// Badge glyph shown next to an edge label
pub fn trigger_icon(trigger: &str) -> &'static str {
    match trigger {
        "level-up" => "⬆️",
        "trade" => "🔄",
        "use-item" => "💎",
        "shed" => "🍃",
        _ => "⭐",
    }
}

fn base_phrase(trigger: &Trigger) -> String {
    match trigger {
        Trigger::LevelUp {
            min_level: Some(level),
        } => format!("Lv. {level}"),
        Trigger::LevelUp { min_level: None } => "Level up".to_string(),
        Trigger::UseItem { item: Some(item) } => humanize(item),
        Trigger::UseItem { item: None } => "Use item".to_string(),
        Trigger::Trade {
            trade_species: Some(species),
        } => format!("Trade for {}", humanize(species)),
        Trigger::Trade { trade_species: None } => "Trade".to_string(),
        Trigger::Shed => "Shed".to_string(),
        Trigger::Spin => "Spin".to_string(),
        Trigger::TowerOfDarkness => "Tower of Darkness".to_string(),
        Trigger::TowerOfWaters => "Tower of Waters".to_string(),
        Trigger::ThreeCriticalHits => "3 critical hits".to_string(),
        Trigger::TakeDamage => "Take damage".to_string(),
        Trigger::AgileStyleMove => "Agile style move".to_string(),
        Trigger::StrongStyleMove => "Strong style move".to_string(),
        Trigger::RecoilDamage => "Recoil damage".to_string(),
        Trigger::Other => "Special".to_string(),
        Trigger::Unrecognized { trigger } => trigger.clone(),
    }
}

/// "thunder-stone" -> "thunder stone"
fn humanize(slug: &str) -> String {
    slug.replace('-', " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Requirements;

    fn with(trigger: Trigger, requirements: Requirements) -> TransitionCondition {
        TransitionCondition {
            trigger,
            requirements,
        }
    }

    // ========== Base Phrases ==========

    #[test]
    fn level_up_with_level() {
        let label = format_condition(&TransitionCondition::level_up(16));
        assert!(label.contains("16"));
        insta::assert_snapshot!(label, @"Lv. 16");
    }

    #[test]
    fn level_up_without_level() {
        let condition = TransitionCondition::new(Trigger::LevelUp { min_level: None });
        let label = format_condition(&condition);
        insta::assert_snapshot!(label, @"Level up");
    }

    #[test]
    fn use_item_names_the_item() {
        let condition = TransitionCondition::new(Trigger::UseItem {
            item: Some("thunder-stone".to_string()),
        });
        let label = format_condition(&condition);
        assert!(label.contains("thunder stone"));
        insta::assert_snapshot!(label, @"thunder stone");
    }

    #[test]
    fn trade_with_and_without_partner() {
        let plain = TransitionCondition::new(Trigger::Trade { trade_species: None });
        assert_eq!(format_condition(&plain), "Trade");

        let swap = TransitionCondition::new(Trigger::Trade {
            trade_species: Some("shelmet".to_string()),
        });
        assert_eq!(format_condition(&swap), "Trade for shelmet");
    }

    #[test]
    fn unrecognized_trigger_is_verbatim() {
        let condition = TransitionCondition::new(Trigger::Unrecognized {
            trigger: "gimmighoul-coins".to_string(),
        });
        assert_eq!(format_condition(&condition), "gimmighoul-coins");
    }

    // ========== Clauses ==========

    #[test]
    fn friendship_and_time_of_day() {
        let espeon = with(
            Trigger::LevelUp { min_level: None },
            Requirements {
                min_happiness: Some(160),
                time_of_day: Some("day".to_string()),
                ..Requirements::default()
            },
        );
        insta::assert_snapshot!(format_condition(&espeon), @"Level up (day) friendship 160+");
    }

    #[test]
    fn held_item_trade() {
        let scizor = with(
            Trigger::Trade { trade_species: None },
            Requirements {
                held_item: Some("metal-coat".to_string()),
                ..Requirements::default()
            },
        );
        insta::assert_snapshot!(format_condition(&scizor), @"Trade w/ metal coat");
    }

    #[test]
    fn clauses_follow_fixed_order() {
        let everything = with(
            Trigger::LevelUp { min_level: Some(30) },
            Requirements {
                held_item: Some("oval-stone".to_string()),
                time_of_day: Some("night".to_string()),
                location: Some("mount-coronet".to_string()),
                known_move: Some("double-hit".to_string()),
                known_move_type: Some("fairy".to_string()),
                min_happiness: Some(160),
                min_affection: Some(2),
                min_beauty: Some(171),
                gender: Some(Gender::Male),
                relative_physical_stats: Some(RelativeStats::AttackHigher),
                party_species: Some("remoraid".to_string()),
                party_type: Some("dark".to_string()),
                needs_overworld_rain: true,
                turn_upside_down: true,
            },
        );
        insta::assert_snapshot!(
            format_condition(&everything),
            @"Lv. 30 w/ oval stone (night) @ mount coronet knowing double hit knowing fairy move friendship 160+ affection 2+ beauty 171+ (male) Atk > Def with remoraid in party with dark-type in party in rain upside down"
        );
    }

    #[test]
    fn only_first_condition_is_used() {
        let conditions = vec![
            TransitionCondition::level_up(16),
            TransitionCondition::new(Trigger::Trade { trade_species: None }),
        ];
        assert_eq!(format_first(&conditions).as_deref(), Some("Lv. 16"));
        assert_eq!(format_first(&[]), None);
    }

    #[test]
    fn icons_fall_back_to_star() {
        assert_eq!(trigger_icon("trade"), "🔄");
        assert_eq!(trigger_icon("tower-of-waters"), "⭐");
    }
}
