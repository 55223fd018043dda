//! Creature database access.
//!
//! [`SpeciesSource`] is the seam between the pipeline and the network:
//! [`PokeApiClient`] talks to the real API, [`MemorySource`] serves fixtures.

mod memory;
pub mod types;

use std::future::Future;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};

pub use memory::MemorySource;
pub use types::*;

/// Read-only access to species, creature, type, ability and chain records
#[async_trait]
pub trait SpeciesSource: Send + Sync {
    /// `pokemon-species/{key}` where key is a numeric id or a slug
    async fn species(&self, key: &str) -> Result<Species>;

    /// `pokemon/{key}`
    async fn pokemon(&self, key: &str) -> Result<Pokemon>;

    /// `pokemon-form/{id}`
    async fn pokemon_form(&self, id: u32) -> Result<PokemonForm>;

    /// `type/{name}`
    async fn type_record(&self, name: &str) -> Result<TypeRecord>;

    /// `ability/{name}`
    async fn ability(&self, name: &str) -> Result<Ability>;

    /// `evolution-chain/{id}`
    async fn evolution_chain(&self, id: u32) -> Result<EvolutionChain>;

    /// `pokemon-species?limit={limit}`
    async fn species_index(&self, limit: u32) -> Result<NamedResourceList>;
}

/// Run `fut` unless `token` is cancelled first
pub async fn cancellable<T>(
    token: &CancellationToken,
    fut: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        result = fut => result,
    }
}

/// HTTP client for the public creature database
pub struct PokeApiClient {
    client: Client,
    base: Url,
}

impl PokeApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let base = Url::parse(&config.api_base)
            .map_err(|e| Error::Config(format!("api base {:?}: {e}", config.api_base)))?;
        if base.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "api base {:?} cannot hold paths",
                config.api_base
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("evograph/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    /// Build `{base}/{resource}/{key}/`, percent-encoding the key
    fn endpoint(&self, resource: &str, key: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(resource).push(key).push("");
        }
        url
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "fetching");
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(url.path().trim_matches('/').to_string()));
        }
        if !status.is_success() {
            return Err(Error::Status {
                status,
                url: url.to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| Error::Decode {
            url: url.to_string(),
            source,
        })
    }
}

#[async_trait]
impl SpeciesSource for PokeApiClient {
    async fn species(&self, key: &str) -> Result<Species> {
        self.get(self.endpoint("pokemon-species", key)).await
    }

    async fn pokemon(&self, key: &str) -> Result<Pokemon> {
        self.get(self.endpoint("pokemon", key)).await
    }

    async fn pokemon_form(&self, id: u32) -> Result<PokemonForm> {
        self.get(self.endpoint("pokemon-form", &id.to_string())).await
    }

    async fn type_record(&self, name: &str) -> Result<TypeRecord> {
        self.get(self.endpoint("type", name)).await
    }

    async fn ability(&self, name: &str) -> Result<Ability> {
        self.get(self.endpoint("ability", name)).await
    }

    async fn evolution_chain(&self, id: u32) -> Result<EvolutionChain> {
        self.get(self.endpoint("evolution-chain", &id.to_string())).await
    }

    async fn species_index(&self, limit: u32) -> Result<NamedResourceList> {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("pokemon-species").push("");
        }
        url.query_pairs_mut().append_pair("limit", &limit.to_string());
        self.get(url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> PokeApiClient {
        let config = Config {
            api_base: base.to_string(),
            ..Config::default()
        };
        PokeApiClient::new(&config).unwrap()
    }

    #[test]
    fn endpoint_appends_resource_and_key() {
        let api = client("https://pokeapi.co/api/v2");
        assert_eq!(
            api.endpoint("pokemon-species", "bulbasaur").as_str(),
            "https://pokeapi.co/api/v2/pokemon-species/bulbasaur/"
        );

        let api = client("https://pokeapi.co/api/v2/");
        assert_eq!(
            api.endpoint("type", "fire").as_str(),
            "https://pokeapi.co/api/v2/type/fire/"
        );
    }

    #[test]
    fn endpoint_escapes_user_input() {
        let api = client("https://pokeapi.co/api/v2");
        let url = api.endpoint("pokemon-species", "../secret?x=1");
        assert!(url.as_str().starts_with("https://pokeapi.co/api/v2/pokemon-species/"));
        assert!(url.query().is_none());
    }

    #[test]
    fn invalid_base_is_a_config_error() {
        let config = Config {
            api_base: "not a url".to_string(),
            ..Config::default()
        };
        assert!(matches!(
            PokeApiClient::new(&config),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn cancellable_stops_pending_work() {
        let token = CancellationToken::new();
        token.cancel();
        let result: Result<()> = cancellable(&token, std::future::pending()).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn cancellable_passes_through_results() {
        let token = CancellationToken::new();
        let result = cancellable(&token, async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
