//! Host/symbiont co-evolution engine.
//!
//! This crate implements the population container, the two agent kinds, and
//! the per-update rules for resource exchange, reproduction, transmission and lysis.

pub mod experiment;
pub mod host;
pub mod interaction;
pub mod population;
pub mod symbiont;
pub mod world;

pub use experiment::{Experiment, ExperimentResult};
pub use host::Host;
pub use interaction::{DonationExchange, Exchange, InteractionPolicy};
pub use population::{Population, PopulationStructure};
pub use symbiont::Symbiont;
pub use world::{SlotView, UpdateReport, World};
