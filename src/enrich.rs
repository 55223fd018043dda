//! Detail enricher: fills in display names, sprites and types for every node.
//!
//! Nodes are fetched concurrently and awaited together. A node whose fetch
//! fails keeps its placeholder fields and is listed in the report; the graph
//! as a whole still succeeds.

use futures_util::future::join_all;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::{SpeciesSource, cancellable};
use crate::error::{Error, Result};
use crate::graph::{EvolutionGraph, GraphNode};
use crate::model::TypeRef;

/// Display data fetched for one species
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDetails {
    pub label: String,
    pub default_image: Option<String>,
    pub shiny_image: Option<String>,
    pub types: Vec<TypeRef>,
}

impl NodeDetails {
    fn apply_to(self, node: &mut GraphNode, shiny: bool) {
        node.label = self.label;
        node.image = if shiny {
            self.shiny_image.clone()
        } else {
            self.default_image.clone()
        };
        node.default_image = self.default_image;
        node.shiny_image = self.shiny_image;
        node.types = Some(self.types);
    }
}

/// A node that could not be enriched
#[derive(Debug)]
pub struct EnrichmentPartialFailure {
    pub node_id: String,
    pub error: Error,
}

/// Outcome of one enrichment pass
#[derive(Debug, Default)]
pub struct EnrichmentReport {
    pub enriched: usize,
    pub failures: Vec<EnrichmentPartialFailure>,
}

impl EnrichmentReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

pub struct Enricher<'a, S: SpeciesSource + ?Sized> {
    source: &'a S,
    lang: &'a str,
}

impl<'a, S: SpeciesSource + ?Sized> Enricher<'a, S> {
    pub fn new(source: &'a S, lang: &'a str) -> Self {
        Self { source, lang }
    }

    /// Species by id, then its default variety
    pub async fn fetch_node_details(&self, species_id: u32) -> Result<NodeDetails> {
        let species = self.source.species(&species_id.to_string()).await?;
        let variety = species
            .default_variety()
            .or_else(|| species.varieties.first())
            .ok_or_else(|| Error::NotFound(format!("varieties of {}", species.name)))?;
        let pokemon = self.source.pokemon(&variety.pokemon.name).await?;

        let label = species
            .localized_name(self.lang)
            .map(str::to_string)
            .unwrap_or_else(|| pokemon.name.clone());

        let mut types: Vec<TypeRef> = pokemon
            .types
            .iter()
            .map(|t| TypeRef {
                slot: t.slot,
                name: t.type_.name.clone(),
            })
            .collect();
        types.sort_by_key(|t| t.slot);

        debug!(species_id, %label, "fetched node details");
        Ok(NodeDetails {
            label,
            default_image: pokemon.sprites.front_default,
            shiny_image: pokemon.sprites.front_shiny,
            types,
        })
    }

    /// Enrich every node of `graph` in place.
    ///
    /// Returns `Error::Cancelled` if `cancel` fires before all fetches settle,
    /// in which case no node is touched.
    pub async fn enrich(
        &self,
        graph: &mut EvolutionGraph,
        shiny: bool,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentReport> {
        let ids: Vec<u32> = graph.nodes.iter().map(|n| n.species_id).collect();
        let fetches = join_all(ids.into_iter().map(|id| self.fetch_node_details(id)));
        let results = cancellable(cancel, async { Ok(fetches.await) }).await?;

        let mut report = EnrichmentReport::default();
        for (node, result) in graph.nodes.iter_mut().zip(results) {
            match result {
                Ok(details) => {
                    details.apply_to(node, shiny);
                    report.enriched += 1;
                }
                Err(error) => {
                    warn!(node = %node.id, %error, "enrichment failed, keeping placeholder");
                    report.failures.push(EnrichmentPartialFailure {
                        node_id: node.id.clone(),
                        error,
                    });
                }
            }
        }

        info!(
            enriched = report.enriched,
            failed = report.failures.len(),
            "enriched graph"
        );
        Ok(report)
    }
}
