//! Output formats for graphs and detail panels.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::Path;

use clap::ValueEnum;
use serde::Serialize;

use crate::details::{PokemonDetails, SpeciesDetails};
use crate::error::{Error, Result};
use crate::graph::{EvolutionGraph, GraphNode};
use crate::html_writer::HtmlWriter;
use crate::layout::LayoutConfig;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed graph JSON
    #[default]
    Json,
    /// Indented tree for the terminal
    Text,
    /// Standalone HTML page
    Html,
}

pub fn render_graph(
    graph: &EvolutionGraph,
    format: OutputFormat,
    layout: &LayoutConfig,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(graph)?),
        OutputFormat::Text => Ok(render_tree(graph)),
        OutputFormat::Html => HtmlWriter::with_layout(layout.clone()).render(graph),
    }
}

/// Graph as an indented tree, edge labels before each child
pub fn render_tree(graph: &EvolutionGraph) -> String {
    let mut out = String::new();
    let Some(root) = graph.node(&graph.root) else {
        return out;
    };
    let _ = writeln!(out, "{}", node_line(root));
    let mut seen = HashSet::from([root.id.as_str()]);
    write_children(graph, &root.id, "", &mut seen, &mut out);
    out
}

fn write_children<'a>(
    graph: &'a EvolutionGraph,
    id: &str,
    prefix: &str,
    seen: &mut HashSet<&'a str>,
    out: &mut String,
) {
    let edges: Vec<_> = graph.outgoing(id).collect();
    for (i, edge) in edges.iter().enumerate() {
        let Some(child) = graph.node(&edge.target) else {
            continue;
        };
        if !seen.insert(child.id.as_str()) {
            continue;
        }
        let last = i + 1 == edges.len();
        let connector = if last { "└─ " } else { "├─ " };
        let condition = edge.label.as_deref().unwrap_or("?");
        let _ = writeln!(out, "{prefix}{connector}[{condition}] {}", node_line(child));

        let nested = format!("{prefix}{}", if last { "   " } else { "│  " });
        write_children(graph, &child.id, &nested, seen, out);
    }
}

fn node_line(node: &GraphNode) -> String {
    match &node.types {
        Some(types) if !types.is_empty() => {
            let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
            format!("{} ({})", node.label, names.join("/"))
        }
        _ => node.label.clone(),
    }
}

#[derive(Serialize)]
struct DetailView<'a> {
    species: &'a SpeciesDetails,
    pokemon: &'a PokemonDetails,
}

pub fn render_details(
    species: &SpeciesDetails,
    pokemon: &PokemonDetails,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&DetailView { species, pokemon })?),
        OutputFormat::Text => Ok(details_text(species, pokemon)),
        OutputFormat::Html => Err(Error::Config(
            "HTML output is only available for evolution graphs".to_string(),
        )),
    }
}

fn details_text(species: &SpeciesDetails, pokemon: &PokemonDetails) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} (#{})", species.display_name, species.id);

    let forms: Vec<&str> = species.forms.iter().map(|f| f.display_name.as_str()).collect();
    let _ = writeln!(out, "Forms: {}", forms.join(", "));

    let types: Vec<&str> = pokemon.types.iter().map(|t| t.display_name.as_str()).collect();
    let _ = writeln!(out, "Types: {}", types.join(", "));

    let abilities: Vec<String> = pokemon
        .abilities
        .iter()
        .map(|a| {
            if a.is_hidden {
                format!("{} (hidden)", a.display_name)
            } else {
                a.display_name.clone()
            }
        })
        .collect();
    let _ = writeln!(out, "Abilities: {}", abilities.join(", "));
    let _ = writeln!(out, "Height: {} m, Weight: {} kg", pokemon.height_m, pokemon.weight_kg);

    for stat in &pokemon.stats {
        let _ = writeln!(out, "  {:<8} {:>3}", stat.display_name, stat.value);
    }
    for (multiplier, attackers) in pokemon.matchups.display_buckets() {
        let names: Vec<&str> = attackers.iter().map(|t| t.as_str()).collect();
        let _ = writeln!(out, "Takes {}: {}", multiplier.label(), names.join(", "));
    }
    let _ = writeln!(out, "Cry: {}", pokemon.cry_url);
    out
}

/// Write to `path`, or stdout when no path is given
pub fn write_output(content: &str, path: Option<&Path>) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, content)?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
