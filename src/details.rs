//! Detail view for a single species: forms, types, abilities, stats, cry link
//! and type matchups.

use futures_util::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::api::{
    AbilitySlot, LocalizedName, Pokemon, SpeciesSource, StatSlot, TypeRecord, TypeSlot, Variety,
    localized_name,
};
use crate::chain::extract_id;
use crate::config::Config;
use crate::error::Result;
use crate::matchups::{Matchups, aggregate};

/// One variety of a species, named in the display language
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormSummary {
    /// Creature slug (e.g. "raichu-alola")
    pub name: String,
    pub display_name: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeciesDetails {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub forms: Vec<FormSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeBadge {
    pub slot: u8,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AbilityInfo {
    pub name: String,
    pub display_name: String,
    pub is_hidden: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseStat {
    pub name: String,
    pub display_name: String,
    pub value: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PokemonDetails {
    pub id: u32,
    pub name: String,
    pub display_name: String,
    pub image: Option<String>,
    pub shiny_image: Option<String>,
    pub height_m: f64,
    pub weight_kg: f64,
    pub types: Vec<TypeBadge>,
    pub abilities: Vec<AbilityInfo>,
    pub stats: Vec<BaseStat>,
    pub cry_url: String,
    pub matchups: Matchups,
}

pub struct DetailService<'a, S: SpeciesSource + ?Sized> {
    source: &'a S,
    lang: &'a str,
    cry_proxy_url: &'a str,
}

impl<'a, S: SpeciesSource + ?Sized> DetailService<'a, S> {
    pub fn new(source: &'a S, config: &'a Config) -> Self {
        Self {
            source,
            lang: &config.lang,
            cry_proxy_url: &config.cry_proxy_url,
        }
    }

    /// Species header plus every variety, fetched concurrently
    pub async fn species_details(&self, key: &str) -> Result<SpeciesDetails> {
        let species = self.source.species(key).await?;
        let display_name = display(&species.names, self.lang, &species.name);

        let forms = try_join_all(
            species
                .varieties
                .iter()
                .map(|variety| self.form_summary(variety, &species.names)),
        )
        .await?;

        debug!(species = %species.name, forms = forms.len(), "fetched species details");
        Ok(SpeciesDetails {
            id: species.id,
            name: species.name.clone(),
            display_name,
            forms,
        })
    }

    async fn form_summary(
        &self,
        variety: &Variety,
        species_names: &[LocalizedName],
    ) -> Result<FormSummary> {
        let fallback = || display(species_names, self.lang, &variety.pokemon.name);

        let pokemon = self.source.pokemon(&variety.pokemon.name).await?;
        let display_name = match pokemon.forms.first() {
            Some(form_ref) => {
                let form = self.source.pokemon_form(extract_id(&form_ref.url)?).await?;
                localized_name(&form.form_names, self.lang)
                    .filter(|name| !name.trim().is_empty())
                    .map(str::to_string)
                    .unwrap_or_else(fallback)
            }
            None => fallback(),
        };

        Ok(FormSummary {
            name: variety.pokemon.name.clone(),
            display_name,
            is_default: variety.is_default,
        })
    }

    /// Full panel data for one creature
    pub async fn pokemon_details(&self, key: &str) -> Result<PokemonDetails> {
        let pokemon = self.source.pokemon(key).await?;

        let (type_records, abilities, species) = tokio::try_join!(
            try_join_all(pokemon.types.iter().map(|slot| self.type_record(slot))),
            try_join_all(pokemon.abilities.iter().map(|slot| self.ability_info(slot))),
            self.source.species(&pokemon.species.name),
        )?;

        let types = pokemon
            .types
            .iter()
            .zip(&type_records)
            .map(|(slot, record)| TypeBadge {
                slot: slot.slot,
                name: record.name.clone(),
                display_name: display(&record.names, self.lang, &record.name),
            })
            .collect();
        let matchups = aggregate(type_records.iter().map(|r| &r.damage_relations));

        Ok(PokemonDetails {
            id: pokemon.id,
            name: pokemon.name.clone(),
            display_name: display(&species.names, self.lang, &pokemon.name),
            image: pokemon.sprites.front_default.clone(),
            shiny_image: pokemon.sprites.front_shiny.clone(),
            height_m: f64::from(pokemon.height) / 10.0,
            weight_kg: f64::from(pokemon.weight) / 10.0,
            types,
            abilities,
            stats: base_stats(&pokemon),
            cry_url: cry_url(self.cry_proxy_url, pokemon.id),
            matchups,
        })
    }

    async fn type_record(&self, slot: &TypeSlot) -> Result<TypeRecord> {
        self.source.type_record(&slot.type_.name).await
    }

    async fn ability_info(&self, slot: &AbilitySlot) -> Result<AbilityInfo> {
        let ability = self.source.ability(&slot.ability.name).await?;
        Ok(AbilityInfo {
            display_name: display(&ability.names, self.lang, &ability.name),
            name: ability.name,
            is_hidden: slot.is_hidden,
        })
    }
}

/// `{proxy}/api/cries/{id}`
pub fn cry_url(proxy: &str, id: u32) -> String {
    format!("{}/api/cries/{id}", proxy.trim_end_matches('/'))
}

fn display(names: &[LocalizedName], lang: &str, fallback: &str) -> String {
    localized_name(names, lang).unwrap_or(fallback).to_string()
}

fn base_stats(pokemon: &Pokemon) -> Vec<BaseStat> {
    pokemon.stats.iter().map(base_stat).collect()
}

fn base_stat(slot: &StatSlot) -> BaseStat {
    let display_name = match slot.stat.name.as_str() {
        "hp" => "HP".to_string(),
        "attack" => "Attack".to_string(),
        "defense" => "Defense".to_string(),
        "special-attack" => "Sp. Atk".to_string(),
        "special-defense" => "Sp. Def".to_string(),
        "speed" => "Speed".to_string(),
        other => other.replace('-', " "),
    };
    BaseStat {
        name: slot.stat.name.clone(),
        display_name,
        value: slot.base_stat,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{
        Ability, DamageRelations, MemorySource, NamedResource, PokemonForm, Species,
    };
    use crate::matchups::{Multiplier, TypeName};

    fn config() -> Config {
        Config {
            lang: "ko".to_string(),
            cry_proxy_url: "http://localhost:3001/".to_string(),
            ..Config::default()
        }
    }

    fn named(names: &[&str]) -> Vec<NamedResource> {
        names.iter().map(|n| NamedResource::new(*n, "")).collect()
    }

    fn raichu_source() -> MemorySource {
        let species = Species {
            id: 26,
            name: "raichu".to_string(),
            names: vec![LocalizedName::new("ko", "라이츄")],
            varieties: vec![
                Variety {
                    is_default: true,
                    pokemon: NamedResource::new("raichu", ""),
                },
                Variety {
                    is_default: false,
                    pokemon: NamedResource::new("raichu-alola", ""),
                },
            ],
            ..Species::default()
        };
        let alola = Pokemon {
            id: 10100,
            name: "raichu-alola".to_string(),
            forms: vec![NamedResource::new(
                "raichu-alola",
                "https://pokeapi.co/api/v2/pokemon-form/10100/",
            )],
            ..Pokemon::default()
        };
        let raichu = Pokemon {
            id: 26,
            name: "raichu".to_string(),
            height: 8,
            weight: 300,
            species: NamedResource::new("raichu", ""),
            types: vec![TypeSlot {
                slot: 1,
                type_: NamedResource::new("electric", ""),
            }],
            abilities: vec![
                AbilitySlot {
                    ability: NamedResource::new("static", ""),
                    is_hidden: false,
                    slot: 1,
                },
                AbilitySlot {
                    ability: NamedResource::new("lightning-rod", ""),
                    is_hidden: true,
                    slot: 3,
                },
            ],
            stats: vec![
                StatSlot {
                    base_stat: 60,
                    stat: NamedResource::new("hp", ""),
                },
                StatSlot {
                    base_stat: 90,
                    stat: NamedResource::new("special-attack", ""),
                },
            ],
            forms: vec![NamedResource::new(
                "raichu",
                "https://pokeapi.co/api/v2/pokemon-form/26/",
            )],
            ..Pokemon::default()
        };

        MemorySource::new()
            .with_species(species)
            .with_pokemon(raichu)
            .with_pokemon(alola)
            .with_form(PokemonForm {
                id: 26,
                name: "raichu".to_string(),
                form_names: vec![LocalizedName::new("ko", " ")],
            })
            .with_form(PokemonForm {
                id: 10100,
                name: "raichu-alola".to_string(),
                form_names: vec![LocalizedName::new("ko", "알로라의 모습")],
            })
            .with_type(TypeRecord {
                id: 13,
                name: "electric".to_string(),
                names: vec![LocalizedName::new("ko", "전기")],
                damage_relations: DamageRelations {
                    double_damage_from: named(&["ground"]),
                    half_damage_from: named(&["flying", "steel", "electric"]),
                    no_damage_from: Vec::new(),
                },
            })
            .with_ability(Ability {
                id: 9,
                name: "static".to_string(),
                names: vec![LocalizedName::new("ko", "정전기")],
            })
            .with_ability(Ability {
                id: 31,
                name: "lightning-rod".to_string(),
                names: Vec::new(),
            })
    }

    // ========== Species Panel ==========

    #[tokio::test]
    async fn forms_use_localized_form_names_with_fallback() {
        let source = raichu_source();
        let config = config();
        let details = DetailService::new(&source, &config)
            .species_details("raichu")
            .await
            .unwrap();

        assert_eq!(details.display_name, "라이츄");
        assert_eq!(
            details.forms,
            vec![
                FormSummary {
                    name: "raichu".to_string(),
                    display_name: "라이츄".to_string(),
                    is_default: true,
                },
                FormSummary {
                    name: "raichu-alola".to_string(),
                    display_name: "알로라의 모습".to_string(),
                    is_default: false,
                },
            ]
        );
    }

    #[tokio::test]
    async fn failing_variety_fails_the_panel() {
        let source = raichu_source().fail_on("pokemon/raichu-alola");
        let config = config();
        let result = DetailService::new(&source, &config).species_details("raichu").await;
        assert!(result.is_err());
    }

    // ========== Creature Panel ==========

    #[tokio::test]
    async fn pokemon_details_collects_everything() {
        let source = raichu_source();
        let config = config();
        let details = DetailService::new(&source, &config)
            .pokemon_details("raichu")
            .await
            .unwrap();

        assert_eq!(details.display_name, "라이츄");
        assert_eq!(details.height_m, 0.8);
        assert_eq!(details.weight_kg, 30.0);
        assert_eq!(details.cry_url, "http://localhost:3001/api/cries/26");
        assert_eq!(details.types[0].display_name, "전기");

        let abilities: Vec<(&str, bool)> = details
            .abilities
            .iter()
            .map(|a| (a.display_name.as_str(), a.is_hidden))
            .collect();
        assert_eq!(abilities, [("정전기", false), ("lightning-rod", true)]);

        let stats: Vec<&str> = details.stats.iter().map(|s| s.display_name.as_str()).collect();
        assert_eq!(stats, ["HP", "Sp. Atk"]);

        assert_eq!(details.matchups.weaknesses(), vec![TypeName::Ground]);
        assert_eq!(
            details.matchups.multiplier_of(TypeName::Steel),
            Multiplier::Half
        );
    }

    #[tokio::test]
    async fn missing_type_record_fails_details() {
        let source = raichu_source().fail_on("type/electric");
        let config = config();
        let result = DetailService::new(&source, &config).pokemon_details("raichu").await;
        assert!(result.is_err());
    }

    #[test]
    fn cry_url_trims_trailing_slash() {
        assert_eq!(cry_url("http://proxy", 25), "http://proxy/api/cries/25");
        assert_eq!(cry_url("http://proxy/", 25), "http://proxy/api/cries/25");
    }
}
