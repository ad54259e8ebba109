//! Resolver configuration.
//!
//! Typed settings for the tiered resolver, with environment-derived
//! construction for the CLI and service entry points. Provider credentials
//! are not held here; they are read by the provider factory, and their
//! absence disables a tier rather than failing configuration.

use std::time::Duration;

use tracing::warn;

use crate::geo::DEFAULT_AVERAGE_SPEED_KMH;
use crate::model::TravelProfile;

/// Environment variable overriding the per-provider-call timeout, in seconds.
pub const PROVIDER_TIMEOUT_ENV: &str = "GEORESOLVE_PROVIDER_TIMEOUT_SECS";

/// Environment variable overriding the default travel profile.
pub const DEFAULT_PROFILE_ENV: &str = "GEORESOLVE_DEFAULT_PROFILE";

/// Default per-provider-call timeout.
///
/// Bounds every tier attempt so one slow or unreachable provider cannot
/// stall the fallback chain; a timed-out call is treated like any other
/// provider failure and the next tier is consulted.
pub const DEFAULT_PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

/// Configuration for the tiered resolver.
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Upper bound on each individual provider call.
    pub provider_timeout: Duration,

    /// Travel profile used when the caller does not specify one.
    pub default_profile: TravelProfile,

    /// Average speed assumed by the local duration estimate, in km/h.
    pub average_speed_kmh: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            provider_timeout: DEFAULT_PROVIDER_TIMEOUT,
            default_profile: TravelProfile::default(),
            average_speed_kmh: DEFAULT_AVERAGE_SPEED_KMH,
        }
    }
}

impl ResolverConfig {
    /// Builds a configuration from the environment, falling back to
    /// defaults for unset or unparseable values (with a warning, never an
    /// error).
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var(PROVIDER_TIMEOUT_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => config.provider_timeout = Duration::from_secs(secs),
                _ => warn!(
                    value = raw.as_str(),
                    "ignoring invalid {}", PROVIDER_TIMEOUT_ENV
                ),
            }
        }

        if let Ok(raw) = std::env::var(DEFAULT_PROFILE_ENV) {
            match raw.parse::<TravelProfile>() {
                Ok(profile) => config.default_profile = profile,
                Err(_) => warn!(
                    value = raw.as_str(),
                    "ignoring invalid {}", DEFAULT_PROFILE_ENV
                ),
            }
        }

        config
    }

    /// Overrides the per-provider-call timeout.
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Overrides the default travel profile.
    pub fn with_default_profile(mut self, profile: TravelProfile) -> Self {
        self.default_profile = profile;
        self
    }
}
