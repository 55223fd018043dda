//! Search pipeline: name -> species -> chain -> graph -> enriched, laid-out graph.

use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::aliases::NameAliases;
use crate::api::{EvolutionChain, Species, SpeciesSource, cancellable};
use crate::chain::{extract_id, parse_chain};
use crate::config::Config;
use crate::enrich::{Enricher, EnrichmentReport};
use crate::error::{Error, Result};
use crate::graph::{EvolutionGraph, GraphBuilder};
use crate::layout::{LayoutConfig, layout};

/// Knobs for one search run
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub lang: String,
    pub shiny: bool,
    pub max_species_id: u32,
    pub random_attempts: u32,
    pub layout: LayoutConfig,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SearchOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            lang: config.lang.clone(),
            shiny: false,
            max_species_id: config.max_species_id,
            random_attempts: config.random_attempts,
            layout: LayoutConfig::default(),
        }
    }
}

/// A finished search
#[derive(Debug)]
pub struct SearchOutcome {
    /// Species the search resolved to
    pub species: Species,
    pub graph: EvolutionGraph,
    pub report: EnrichmentReport,
}

pub struct EvolutionSearch<'a, S: SpeciesSource + ?Sized> {
    source: &'a S,
    aliases: &'a NameAliases,
    options: SearchOptions,
}

impl<'a, S: SpeciesSource + ?Sized> EvolutionSearch<'a, S> {
    pub fn new(source: &'a S, aliases: &'a NameAliases, options: SearchOptions) -> Self {
        Self {
            source,
            aliases,
            options,
        }
    }

    /// Resolve `input` through the alias map and build its evolution graph
    pub async fn search(&self, input: &str, cancel: &CancellationToken) -> Result<SearchOutcome> {
        let slug = self.aliases.resolve(input);
        if slug.is_empty() {
            return Err(Error::EmptyQuery);
        }
        info!(input, %slug, "searching");

        let species = cancellable(cancel, self.source.species(&slug)).await?;
        self.graph_for(species, cancel).await
    }

    /// Pick random species ids until one resolves, up to `random_attempts` times
    pub async fn random(&self, cancel: &CancellationToken) -> Result<SearchOutcome> {
        let attempts = self.options.random_attempts.max(1);
        let max_id = self.options.max_species_id.max(1);

        for attempt in 1..=attempts {
            let id = rand::thread_rng().gen_range(1..=max_id);
            match cancellable(cancel, self.source.species(&id.to_string())).await {
                Ok(species) => {
                    info!(id, name = %species.name, attempt, "picked random species");
                    return self.graph_for(species, cancel).await;
                }
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Err(error) => warn!(id, attempt, %error, "random pick failed"),
            }
        }
        Err(Error::Lookup { attempts })
    }

    async fn graph_for(
        &self,
        species: Species,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome> {
        let chain_ref = species.evolution_chain.as_ref().ok_or_else(|| {
            Error::MalformedChain(format!("{} has no evolution chain", species.name))
        })?;
        let chain_id = extract_id(&chain_ref.url)?;
        let chain = cancellable(cancel, self.source.evolution_chain(chain_id)).await?;

        let mut graph = build_graph(&chain, &self.options.layout)?;
        let report = Enricher::new(self.source, &self.options.lang)
            .enrich(&mut graph, self.options.shiny, cancel)
            .await?;

        info!(
            species = %species.name,
            chain = chain_id,
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "built evolution graph"
        );
        Ok(SearchOutcome {
            species,
            graph,
            report,
        })
    }
}

/// Parse, build and lay out a chain without touching the network
pub fn build_graph(chain: &EvolutionChain, config: &LayoutConfig) -> Result<EvolutionGraph> {
    let tree = parse_chain(chain)?;
    let mut graph = GraphBuilder::new().build(&tree);
    layout(&mut graph, config)?;
    Ok(graph)
}
