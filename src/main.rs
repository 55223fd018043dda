use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use evograph::aliases::{AliasBuilder, NameAliases};
use evograph::api::{EvolutionChain, PokeApiClient};
use evograph::config::Config;
use evograph::details::DetailService;
use evograph::layout::LayoutConfig;
use evograph::output::{self, OutputFormat};
use evograph::quiz::{self, DEFAULT_ROUNDS, QuestionGenerator, Quiz};
use evograph::search::{self, EvolutionSearch, SearchOptions, SearchOutcome};
use evograph::server::{self, CryProxyState, DEFAULT_ALLOWED_ORIGIN, DEFAULT_FFMPEG, DEFAULT_PORT};

/// Explore creature evolution chains as laid-out graphs.
#[derive(Parser)]
#[command(name = "evograph")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    config: Config,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the evolution graph of a species (English slug or localized name)
    Search {
        name: String,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Show shiny sprites
        #[arg(long)]
        shiny: bool,
    },
    /// Build the evolution graph of a random species
    Random {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,

        #[arg(long)]
        shiny: bool,
    },
    /// Lay out an evolution-chain JSON file without network access
    Chain {
        /// Evolution chain record as returned by the API
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show forms, types, abilities, stats and matchups of a species
    Details {
        /// Species id, slug or localized name
        species: String,

        /// Output format (json or text)
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Run the cry transcoding proxy
    Serve {
        /// Port to run the server on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Front-end origin allowed by CORS
        #[arg(long, default_value = DEFAULT_ALLOWED_ORIGIN)]
        allowed_origin: String,

        /// Path to the ffmpeg binary
        #[arg(long, env = "EVOGRAPH_FFMPEG", default_value = DEFAULT_FFMPEG)]
        ffmpeg: PathBuf,
    },
    /// Play the description quiz
    Quiz {
        /// Number of questions
        #[arg(short, long, default_value_t = DEFAULT_ROUNDS)]
        rounds: u32,
    },
    /// Regenerate the alias map for the `--lang` language from the API
    Aliases {
        /// Output JSON file
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evograph=info,tower_http=info".into()),
        )
        .with_writer(io::stderr)
        .init();
}

/// Cancel on Ctrl+C
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling");
            child.cancel();
        }
    });
    token
}

fn emit_graph(
    outcome: &SearchOutcome,
    format: OutputFormat,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    for failure in &outcome.report.failures {
        warn!(node = %failure.node_id, error = %failure.error, "shown without details");
    }
    let rendered = output::render_graph(&outcome.graph, format, &LayoutConfig::default())?;
    output::write_output(&rendered, output)?;
    Ok(())
}

fn chain(input: &Path, format: OutputFormat, output: Option<&Path>) -> anyhow::Result<()> {
    let content = fs::read_to_string(input)
        .with_context(|| format!("reading {}", input.display()))?;
    let chain: EvolutionChain = serde_json::from_str(&content)
        .with_context(|| format!("{} is not an evolution chain record", input.display()))?;

    let layout = LayoutConfig::default();
    let graph = search::build_graph(&chain, &layout)?;
    info!(nodes = graph.nodes.len(), edges = graph.edges.len(), "laid out chain");

    let rendered = output::render_graph(&graph, format, &layout)?;
    output::write_output(&rendered, output)?;
    Ok(())
}

/// Turn library errors into the two messages users need to tell apart
fn explain(error: evograph::Error) -> anyhow::Error {
    if error.is_not_found() {
        anyhow::anyhow!("species not found, check the name: {error}")
    } else if error.is_malformed() {
        anyhow::anyhow!("the API returned data we could not interpret: {error}")
    } else {
        error.into()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = cli.config;

    match cli.command {
        Commands::Search {
            name,
            format,
            output,
            shiny,
        } => {
            let client = PokeApiClient::new(&config)?;
            let aliases = NameAliases::load(&config).context("loading alias map")?;
            let options = SearchOptions {
                shiny,
                ..SearchOptions::from_config(&config)
            };
            let outcome = EvolutionSearch::new(&client, &aliases, options)
                .search(&name, &cancel_on_interrupt())
                .await
                .map_err(explain)?;
            emit_graph(&outcome, format, output.as_deref())?;
        }
        Commands::Random {
            format,
            output,
            shiny,
        } => {
            let client = PokeApiClient::new(&config)?;
            let aliases = NameAliases::new();
            let options = SearchOptions {
                shiny,
                ..SearchOptions::from_config(&config)
            };
            let outcome = EvolutionSearch::new(&client, &aliases, options)
                .random(&cancel_on_interrupt())
                .await
                .map_err(explain)?;
            emit_graph(&outcome, format, output.as_deref())?;
        }
        Commands::Chain {
            input,
            format,
            output,
        } => {
            chain(&input, format, output.as_deref())?;
        }
        Commands::Details { species, format } => {
            let client = PokeApiClient::new(&config)?;
            let service = DetailService::new(&client, &config);
            let aliases = NameAliases::load(&config).context("loading alias map")?;
            let key = aliases.resolve(&species);
            let species_details = service.species_details(&key).await.map_err(explain)?;
            let default_form = species_details
                .forms
                .iter()
                .find(|f| f.is_default)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| species_details.name.clone());
            let pokemon_details = service.pokemon_details(&default_form).await.map_err(explain)?;
            let rendered = output::render_details(&species_details, &pokemon_details, format)?;
            output::write_output(&rendered, None)?;
        }
        Commands::Serve {
            port,
            allowed_origin,
            ffmpeg,
        } => {
            let state = CryProxyState::new(&config.cry_base, ffmpeg, config.timeout())?;
            server::serve(state, port, &allowed_origin).await?;
        }
        Commands::Quiz { rounds } => {
            let client = PokeApiClient::new(&config)?;
            let generator = QuestionGenerator::new(&client, &config);
            let stdin = io::stdin().lock();
            let quiz = quiz::play(&generator, Quiz::new(rounds), stdin, io::stdout())
                .await
                .map_err(explain)?;
            info!(score = quiz.score(), rounds = quiz.played(), "quiz finished");
        }
        Commands::Aliases { output } => {
            let client = PokeApiClient::new(&config)?;
            let aliases = AliasBuilder::new(&client, &config.lang)
                .build()
                .await
                .map_err(explain)?;
            aliases
                .write(&output)
                .with_context(|| format!("writing {}", output.display()))?;
            println!("Wrote {} aliases to {}", aliases.len(), output.display());
        }
    }

    Ok(())
}
