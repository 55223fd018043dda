//! Runtime settings, parsed from CLI flags with `EVOGRAPH_*` environment fallbacks.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
pub const DEFAULT_CRY_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon/cries";
pub const DEFAULT_SPRITE_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";
pub const DEFAULT_CRY_PROXY_URL: &str = "http://localhost:3001";
pub const DEFAULT_LANG: &str = "en";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Highest national dex number the random search picks from
pub const DEFAULT_MAX_SPECIES_ID: u32 = 1025;
pub const DEFAULT_RANDOM_ATTEMPTS: u32 = 5;

/// Settings shared by every command
#[derive(Args, Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the creature database API
    #[arg(long, global = true, env = "EVOGRAPH_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Base URL the cry proxy fetches `{id}.ogg` files from
    #[arg(long, global = true, env = "EVOGRAPH_CRY_BASE", default_value = DEFAULT_CRY_BASE)]
    pub cry_base: String,

    /// Base URL for `{id}.png` sprites (quiz choices)
    #[arg(long, global = true, env = "EVOGRAPH_SPRITE_BASE", default_value = DEFAULT_SPRITE_BASE)]
    pub sprite_base: String,

    /// Public URL of the cry proxy, used to build cry links in the detail view
    #[arg(
        long,
        global = true,
        env = "EVOGRAPH_CRY_PROXY_URL",
        default_value = DEFAULT_CRY_PROXY_URL
    )]
    pub cry_proxy_url: String,

    /// Language code for display names (e.g. "en", "ko")
    #[arg(long, global = true, env = "EVOGRAPH_LANG", default_value = DEFAULT_LANG)]
    pub lang: String,

    /// HTTP request timeout in seconds
    #[arg(
        long,
        global = true,
        env = "EVOGRAPH_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub timeout_secs: u64,

    /// Highest species id the random search picks from
    #[arg(
        long,
        global = true,
        env = "EVOGRAPH_MAX_SPECIES_ID",
        default_value_t = DEFAULT_MAX_SPECIES_ID
    )]
    pub max_species_id: u32,

    /// How many random picks to try before giving up
    #[arg(
        long,
        global = true,
        env = "EVOGRAPH_RANDOM_ATTEMPTS",
        default_value_t = DEFAULT_RANDOM_ATTEMPTS
    )]
    pub random_attempts: u32,

    /// JSON file mapping localized names to species slugs (replaces the built-in map)
    #[arg(long, global = true, env = "EVOGRAPH_ALIASES")]
    pub aliases: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            cry_base: DEFAULT_CRY_BASE.to_string(),
            sprite_base: DEFAULT_SPRITE_BASE.to_string(),
            cry_proxy_url: DEFAULT_CRY_PROXY_URL.to_string(),
            lang: DEFAULT_LANG.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_species_id: DEFAULT_MAX_SPECIES_ID,
            random_attempts: DEFAULT_RANDOM_ATTEMPTS,
            aliases: None,
        }
    }
}

impl Config {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
