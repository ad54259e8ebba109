//! Georesolve - tiered geospatial resolution for a delivery platform
//!
//! This library turns addresses into coordinates, computes point-to-point and
//! multi-stop routes, and derives delivery economics (fee, ETA, zone
//! eligibility). It stays available even when zero, one, or many external
//! map/geocoding providers are reachable: every operation walks an ordered
//! tier list (free quota-limited provider first, paid provider second) and
//! degrades to a fully local great-circle computation when all tiers fail.
//!
//! # High-Level API
//!
//! ```ignore
//! use georesolve::config::ResolverConfig;
//! use georesolve::provider::{providers_from_env, AsyncReqwestClient};
//! use georesolve::resolver::TieredResolver;
//!
//! let http_client = AsyncReqwestClient::new()?;
//! let providers = providers_from_env(http_client);
//! let resolver = TieredResolver::new(providers, ResolverConfig::from_env());
//!
//! let route = resolver.route(&origin, &destination, profile).await?;
//! ```

pub mod config;
pub mod delivery;
pub mod geo;
pub mod logging;
pub mod model;
pub mod optimizer;
pub mod provider;
pub mod resolver;

/// Version of the georesolve library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
