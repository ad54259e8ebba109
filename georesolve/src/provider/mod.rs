//! External geospatial provider abstraction
//!
//! This module provides traits and implementations for the external
//! capability providers (OpenRouteService, Google Maps) behind the tiered
//! resolver. Each provider adapts one third-party API into the shared
//! capability set: geocode, reverse-geocode, route, distance-matrix,
//! optimize-route, isochrone.
//!
//! # Factory Pattern
//!
//! For centralized provider creation, use [`providers_from_env`] or the
//! [`ProviderFactory`]:
//!
//! ```ignore
//! use georesolve::provider::{providers_from_env, AsyncReqwestClient};
//!
//! let http_client = AsyncReqwestClient::new()?;
//! let providers = providers_from_env(http_client);
//! ```

mod factory;
mod google;
mod http;
mod ors;
mod types;

pub use factory::{
    providers_from_env, ProviderConfig, ProviderFactory, ProviderKind, GOOGLE_API_KEY_ENV,
    ORS_API_KEY_ENV,
};
pub use google::GoogleMapsProvider;
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use ors::OrsProvider;
pub use types::{GeoProvider, ProviderError};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
