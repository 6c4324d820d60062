//! tweet-archive domain crate
//!
//! This crate contains the core domain logic following hexagonal architecture:
//! - `model`: Posts, entities, media and query value objects
//! - `ports`: Trait definitions for archive backends and the origin platform
//! - `usecases`: Normalization, entity substitution, media resolution,
//!   timestamps, the external-fetch cache and post lookup

pub mod model;
pub mod ports;
pub mod usecases;

pub use model::*;
pub use ports::*;
