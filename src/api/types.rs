//! Response shapes of the creature database API.
//!
//! Only the fields this crate reads are modeled; everything else in the
//! responses is ignored during deserialization.

use serde::{Deserialize, Serialize};

/// A `{name, url}` reference to another API resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// A `{url}` reference without a name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResource {
    pub url: String,
}

/// A name in one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedName {
    pub name: String,
    pub language: NamedResource,
}

impl LocalizedName {
    pub fn new(lang: &str, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            language: NamedResource::new(lang, ""),
        }
    }
}

/// First name in `names` whose language matches `lang`
pub fn localized_name<'a>(names: &'a [LocalizedName], lang: &str) -> Option<&'a str> {
    names
        .iter()
        .find(|n| n.language.name == lang)
        .map(|n| n.name.as_str())
}

/// A flavor text entry from the species record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorText {
    pub flavor_text: String,
    pub language: NamedResource,
}

/// One variety (form) of a species
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variety {
    pub is_default: bool,
    pub pokemon: NamedResource,
}

/// `pokemon-species/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Species {
    pub id: u32,
    pub name: String,
    pub names: Vec<LocalizedName>,
    pub varieties: Vec<Variety>,
    pub evolution_chain: Option<ApiResource>,
    pub flavor_text_entries: Vec<FlavorText>,
}

impl Species {
    /// The variety flagged as default, if any
    pub fn default_variety(&self) -> Option<&Variety> {
        self.varieties.iter().find(|v| v.is_default)
    }

    pub fn localized_name(&self, lang: &str) -> Option<&str> {
        localized_name(&self.names, lang)
    }
}

/// Sprite URLs of a creature
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Sprites {
    pub front_default: Option<String>,
    pub front_shiny: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u8,
    #[serde(rename = "type")]
    pub type_: NamedResource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilitySlot {
    pub ability: NamedResource,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub slot: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatSlot {
    pub base_stat: u32,
    pub stat: NamedResource,
}

/// `pokemon/{id|name}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    /// Height in decimetres
    pub height: u32,
    /// Weight in hectograms
    pub weight: u32,
    pub species: NamedResource,
    pub sprites: Sprites,
    pub types: Vec<TypeSlot>,
    pub abilities: Vec<AbilitySlot>,
    pub stats: Vec<StatSlot>,
    pub forms: Vec<NamedResource>,
}

/// `pokemon-form/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PokemonForm {
    pub id: u32,
    pub name: String,
    pub form_names: Vec<LocalizedName>,
}

/// Damage relations of a type, seen from the defending side (`*_from`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DamageRelations {
    pub double_damage_from: Vec<NamedResource>,
    pub half_damage_from: Vec<NamedResource>,
    pub no_damage_from: Vec<NamedResource>,
}

/// `type/{name}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeRecord {
    pub id: u32,
    pub name: String,
    pub names: Vec<LocalizedName>,
    pub damage_relations: DamageRelations,
}

/// `ability/{name}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Ability {
    pub id: u32,
    pub name: String,
    pub names: Vec<LocalizedName>,
}

/// One raw evolution condition. All fields are optional and mostly null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEvolutionDetail {
    pub trigger: Option<NamedResource>,
    pub min_level: Option<u32>,
    pub item: Option<NamedResource>,
    pub held_item: Option<NamedResource>,
    pub time_of_day: Option<String>,
    pub location: Option<NamedResource>,
    pub known_move: Option<NamedResource>,
    pub known_move_type: Option<NamedResource>,
    pub min_happiness: Option<u32>,
    pub min_affection: Option<u32>,
    pub min_beauty: Option<u32>,
    pub gender: Option<u8>,
    pub relative_physical_stats: Option<i8>,
    pub party_species: Option<NamedResource>,
    pub party_type: Option<NamedResource>,
    pub trade_species: Option<NamedResource>,
    pub needs_overworld_rain: Option<bool>,
    pub turn_upside_down: Option<bool>,
}

/// A link of the nested evolution chain
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainLink {
    pub species: NamedResource,
    pub evolution_details: Vec<RawEvolutionDetail>,
    pub evolves_to: Vec<ChainLink>,
}

/// `evolution-chain/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvolutionChain {
    pub id: u32,
    pub chain: ChainLink,
}

/// A paginated list of named resources (e.g. `pokemon-species?limit=N`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamedResourceList {
    pub count: u32,
    pub results: Vec<NamedResource>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_link_ignores_unknown_fields_and_nulls() {
        let json = r#"{
            "species": {"name": "ivysaur", "url": "https://pokeapi.co/api/v2/pokemon-species/2/"},
            "is_baby": false,
            "evolution_details": [{
                "gender": null, "held_item": null, "item": null,
                "min_level": 16, "needs_overworld_rain": false,
                "time_of_day": "",
                "trigger": {
                    "name": "level-up",
                    "url": "https://pokeapi.co/api/v2/evolution-trigger/1/"
                },
                "turn_upside_down": false, "region_id": null
            }],
            "evolves_to": []
        }"#;
        let link: ChainLink = serde_json::from_str(json).unwrap();
        assert_eq!(link.species.name, "ivysaur");
        let detail = &link.evolution_details[0];
        assert_eq!(detail.min_level, Some(16));
        assert_eq!(detail.trigger.as_ref().unwrap().name, "level-up");
        assert_eq!(detail.time_of_day.as_deref(), Some(""));
        assert!(detail.item.is_none());
    }

    #[test]
    fn pokemon_type_slot_reads_type_key() {
        let json = r#"{"id": 1, "name": "bulbasaur", "types": [
            {"slot": 1, "type": {"name": "grass", "url": ""}},
            {"slot": 2, "type": {"name": "poison", "url": ""}}
        ]}"#;
        let pokemon: Pokemon = serde_json::from_str(json).unwrap();
        assert_eq!(pokemon.types[1].type_.name, "poison");
        assert!(pokemon.sprites.front_default.is_none());
    }

    #[test]
    fn localized_name_picks_language() {
        let names = vec![
            LocalizedName::new("ko", "이상해씨"),
            LocalizedName::new("en", "Bulbasaur"),
        ];
        assert_eq!(localized_name(&names, "en"), Some("Bulbasaur"));
        assert_eq!(localized_name(&names, "ko"), Some("이상해씨"));
        assert_eq!(localized_name(&names, "fr"), None);
    }
}
