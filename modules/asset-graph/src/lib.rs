//! Synthetic security-asset graphs for seeding test databases.

pub mod config;
pub mod generator;
pub mod graph;
pub mod model;
pub mod names;

pub use config::{CountRange, GraphConfig, Layout};
pub use generator::{generate, Generator};
pub use graph::AssetGraph;
pub use model::*;
pub use names::NameRegistry;
