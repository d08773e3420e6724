//! Provider Locator Library
//!
//! Finds the healthcare providers nearest to an address, ranked by travel
//! time. Provider rows come from a hosted record store with inconsistent
//! column names; geocoding and travel times come from the Mapbox APIs.
//!
//! # Modules
//!
//! - `api`: API definitions.
//! - `core`: Core business logic.
//! - `integrations`: External service integrations.
//! - `campaigns`: Campaign label canonicalization.
//! - `circuit_breaker`: Circuit breaker for upstream calls.
//! - `config`: Configuration management.
//! - `directory`: Provider directory loading and caching.
//! - `distance_matrix`: Batched travel distance/duration client.
//! - `errors`: Error handling types.
//! - `facets`: Facet and clinical combination builders.
//! - `field_resolver`: Tolerant column lookup and value coercion.
//! - `geocoder`: Forward geocoding client.
//! - `handlers`: HTTP request handlers.
//! - `models`: Core data models.
//! - `normalizer`: Raw row to provider normalization.
//! - `record_store`: Paginated record store client.
//! - `search`: Provider search pipeline.
//! - `static_pins`: Static secondary location overlay.

pub mod api;
pub mod core;
pub mod integrations;

// Re-export primary modules for shared use in tests and other binaries
pub mod campaigns;
pub mod circuit_breaker;
pub mod config;
pub mod directory;
pub mod distance_matrix;
pub mod errors;
pub mod facets;
pub mod field_resolver;
pub mod geocoder;
pub mod handlers;
pub mod models;
pub mod normalizer;
pub mod record_store;
pub mod search;
pub mod static_pins;
