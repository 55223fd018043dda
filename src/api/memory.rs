//! In-memory [`SpeciesSource`] backed by fixtures, with failure injection.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use reqwest::StatusCode;

use super::SpeciesSource;
use super::types::*;
use crate::error::{Error, Result};

/// Fixture-backed source. Species and creatures are reachable by slug and by id.
#[derive(Debug, Default)]
pub struct MemorySource {
    species: HashMap<String, Species>,
    pokemon: HashMap<String, Pokemon>,
    forms: HashMap<u32, PokemonForm>,
    types: HashMap<String, TypeRecord>,
    abilities: HashMap<String, Ability>,
    chains: HashMap<u32, EvolutionChain>,
    failing: HashSet<String>,
    calls: AtomicUsize,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_species(mut self, species: Species) -> Self {
        self.species.insert(species.id.to_string(), species.clone());
        self.species.insert(species.name.clone(), species);
        self
    }

    pub fn with_pokemon(mut self, pokemon: Pokemon) -> Self {
        self.pokemon.insert(pokemon.id.to_string(), pokemon.clone());
        self.pokemon.insert(pokemon.name.clone(), pokemon);
        self
    }

    pub fn with_form(mut self, form: PokemonForm) -> Self {
        self.forms.insert(form.id, form);
        self
    }

    pub fn with_type(mut self, record: TypeRecord) -> Self {
        self.types.insert(record.name.clone(), record);
        self
    }

    pub fn with_ability(mut self, ability: Ability) -> Self {
        self.abilities.insert(ability.name.clone(), ability);
        self
    }

    pub fn with_chain(mut self, chain: EvolutionChain) -> Self {
        self.chains.insert(chain.id, chain);
        self
    }

    /// Register a species and its default creature in one go.
    ///
    /// The species gets an English name (the slug capitalized), a default
    /// variety pointing at a creature of the same id, default and shiny sprites,
    /// and the given types.
    pub fn with_basic_species(self, id: u32, name: &str, chain_id: u32, types: &[&str]) -> Self {
        let display = capitalize(name);
        let species = Species {
            id,
            name: name.to_string(),
            names: vec![LocalizedName::new("en", display)],
            varieties: vec![Variety {
                is_default: true,
                pokemon: NamedResource::new(
                    name,
                    format!("https://pokeapi.co/api/v2/pokemon/{id}/"),
                ),
            }],
            evolution_chain: Some(ApiResource {
                url: format!("https://pokeapi.co/api/v2/evolution-chain/{chain_id}/"),
            }),
            flavor_text_entries: Vec::new(),
        };
        let pokemon = Pokemon {
            id,
            name: name.to_string(),
            species: NamedResource::new(
                name,
                format!("https://pokeapi.co/api/v2/pokemon-species/{id}/"),
            ),
            sprites: Sprites {
                front_default: Some(format!("https://sprites.test/{id}.png")),
                front_shiny: Some(format!("https://sprites.test/shiny/{id}.png")),
            },
            types: types
                .iter()
                .enumerate()
                .map(|(i, t)| TypeSlot {
                    slot: i as u8 + 1,
                    type_: NamedResource::new(*t, format!("https://pokeapi.co/api/v2/type/{t}/")),
                })
                .collect(),
            forms: vec![NamedResource::new(
                name,
                format!("https://pokeapi.co/api/v2/pokemon-form/{id}/"),
            )],
            ..Pokemon::default()
        };
        self.with_species(species).with_pokemon(pokemon)
    }

    /// Make every lookup of `{kind}/{key}` fail with a 500 (e.g. `"pokemon/ivysaur"`)
    pub fn fail_on(mut self, path: impl Into<String>) -> Self {
        self.failing.insert(path.into());
        self
    }

    /// Number of lookups served so far, failed ones included
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn lookup<K, T>(&self, kind: &str, key: K, map: &HashMap<K, T>) -> Result<T>
    where
        K: std::hash::Hash + Eq + std::fmt::Display,
        T: Clone,
    {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let path = format!("{kind}/{key}");
        if self.failing.contains(&path) {
            return Err(Error::Status {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                url: path,
            });
        }
        map.get(&key).cloned().ok_or(Error::NotFound(path))
    }
}

fn capitalize(slug: &str) -> String {
    let mut chars = slug.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl SpeciesSource for MemorySource {
    async fn species(&self, key: &str) -> Result<Species> {
        self.lookup("pokemon-species", key.to_string(), &self.species)
    }

    async fn pokemon(&self, key: &str) -> Result<Pokemon> {
        self.lookup("pokemon", key.to_string(), &self.pokemon)
    }

    async fn pokemon_form(&self, id: u32) -> Result<PokemonForm> {
        self.lookup("pokemon-form", id, &self.forms)
    }

    async fn type_record(&self, name: &str) -> Result<TypeRecord> {
        self.lookup("type", name.to_string(), &self.types)
    }

    async fn ability(&self, name: &str) -> Result<Ability> {
        self.lookup("ability", name.to_string(), &self.abilities)
    }

    async fn evolution_chain(&self, id: u32) -> Result<EvolutionChain> {
        self.lookup("evolution-chain", id, &self.chains)
    }

    async fn species_index(&self, limit: u32) -> Result<NamedResourceList> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut species: Vec<&Species> = self
            .species
            .iter()
            .filter(|(key, s)| **key == s.name)
            .map(|(_, s)| s)
            .collect();
        species.sort_by_key(|s| s.id);
        let results: Vec<NamedResource> = species
            .iter()
            .take(limit as usize)
            .map(|s| {
                NamedResource::new(
                    s.name.clone(),
                    format!("https://pokeapi.co/api/v2/pokemon-species/{}/", s.id),
                )
            })
            .collect();
        Ok(NamedResourceList {
            count: species.len() as u32,
            results,
        })
    }
}
