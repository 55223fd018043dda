//! evograph - explore creature evolution chains as laid-out graphs.
//!
//! The pipeline turns a species search into a graph: the name is resolved through
//! the alias map, the evolution chain is fetched from the creature database,
//! parsed into a tree, flattened into nodes and edges, enriched with display data,
//! and finally laid out left to right. The crate also carries the detail view,
//! the type matchup aggregator, the cry transcoding proxy, and the quiz.

pub mod aliases;
pub mod api;
pub mod chain;
pub mod config;
pub mod details;
pub mod enrich;
pub mod error;
pub mod graph;
pub mod html_writer;
pub mod labels;
pub mod layout;
pub mod matchups;
pub mod model;
pub mod output;
pub mod quiz;
pub mod search;
pub mod server;

pub use error::{Error, Result};
