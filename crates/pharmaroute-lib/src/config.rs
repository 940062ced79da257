//! Routing configuration loaded from the environment.

use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::adapter::{GraphQueryAdapter, DEFAULT_SNAP_RADIUS_M};
use crate::assembler::{RouteAssembler, DEFAULT_SPEED_KMH, DEFAULT_TURN_THRESHOLD_DEG};
use crate::cache::{
    EvictionPolicy, LeastRecentlyUsed, ResultCache, TimeToLive, Unbounded, DEFAULT_PRECISION,
    MAX_PRECISION, MIN_PRECISION,
};
use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::provider::DEFAULT_CATEGORY;
use crate::routing::RoutingChain;
use crate::selector::{CandidateSelector, DEFAULT_MAX_PROBES};

/// Fallback user position (Fès, Morocco) when none is supplied.
pub const DEFAULT_LOCATION: Coordinate = Coordinate {
    lat: 34.0349,
    lon: -4.9764,
};

/// Radius around the user within which map data is loaded.
pub const DEFAULT_SEARCH_RADIUS_M: f64 = 5_000.0;

/// Number of candidates listed by default.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Tunables for snapping, candidate probing, step synthesis and caching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    pub snap_radius_m: f64,
    pub search_radius_m: f64,
    pub max_probes: usize,
    pub max_results: usize,
    pub turn_threshold_deg: f64,
    pub speed_kmh: f64,
    pub query_timeout_ms: Option<u64>,
    pub cache_enabled: bool,
    pub cache_precision: u32,
    pub cache_capacity: Option<usize>,
    pub cache_ttl_secs: Option<u64>,
    pub category: String,
    pub default_location: Coordinate,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            snap_radius_m: DEFAULT_SNAP_RADIUS_M,
            search_radius_m: DEFAULT_SEARCH_RADIUS_M,
            max_probes: DEFAULT_MAX_PROBES,
            max_results: DEFAULT_MAX_RESULTS,
            turn_threshold_deg: DEFAULT_TURN_THRESHOLD_DEG,
            speed_kmh: DEFAULT_SPEED_KMH,
            query_timeout_ms: None,
            cache_enabled: true,
            cache_precision: DEFAULT_PRECISION,
            cache_capacity: None,
            cache_ttl_secs: None,
            category: DEFAULT_CATEGORY.to_string(),
            default_location: DEFAULT_LOCATION,
        }
    }
}

impl RoutingConfig {
    /// Create configuration from `PHARMAROUTE_*` environment variables.
    ///
    /// - `PHARMAROUTE_SNAP_RADIUS_M`: snap-to-node radius in metres (default: 1000)
    /// - `PHARMAROUTE_SEARCH_RADIUS_M`: map data radius around the user (default: 5000)
    /// - `PHARMAROUTE_MAX_PROBES`: candidates run through the chain (default: 5)
    /// - `PHARMAROUTE_MAX_RESULTS`: candidates listed by `nearest` (default: 5)
    /// - `PHARMAROUTE_TURN_THRESHOLD_DEG`: bearing change that starts a step (default: 30)
    /// - `PHARMAROUTE_SPEED_KMH`: speed for duration estimates (default: 5)
    /// - `PHARMAROUTE_QUERY_TIMEOUT_MS`: per-query graph timeout (default: none)
    /// - `PHARMAROUTE_CACHE_ENABLED`: "true" or "false" (default: true)
    /// - `PHARMAROUTE_CACHE_PRECISION`: decimal places in cache keys, 5 to 9 (default: 6)
    /// - `PHARMAROUTE_CACHE_CAPACITY`: LRU bound on cache entries (default: unbounded)
    /// - `PHARMAROUTE_CACHE_TTL_SECS`: cache entry lifetime (default: unlimited)
    /// - `PHARMAROUTE_CATEGORY`: point-of-interest category (default: pharmacy)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let config = Self {
            snap_radius_m: parse_or(&get, "PHARMAROUTE_SNAP_RADIUS_M", defaults.snap_radius_m)?,
            search_radius_m: parse_or(
                &get,
                "PHARMAROUTE_SEARCH_RADIUS_M",
                defaults.search_radius_m,
            )?,
            max_probes: parse_or(&get, "PHARMAROUTE_MAX_PROBES", defaults.max_probes)?,
            max_results: parse_or(&get, "PHARMAROUTE_MAX_RESULTS", defaults.max_results)?,
            turn_threshold_deg: parse_or(
                &get,
                "PHARMAROUTE_TURN_THRESHOLD_DEG",
                defaults.turn_threshold_deg,
            )?,
            speed_kmh: parse_or(&get, "PHARMAROUTE_SPEED_KMH", defaults.speed_kmh)?,
            query_timeout_ms: parse_optional(&get, "PHARMAROUTE_QUERY_TIMEOUT_MS")?,
            cache_enabled: parse_flag(&get, "PHARMAROUTE_CACHE_ENABLED", defaults.cache_enabled)?,
            cache_precision: parse_or(
                &get,
                "PHARMAROUTE_CACHE_PRECISION",
                defaults.cache_precision,
            )?,
            cache_capacity: parse_optional(&get, "PHARMAROUTE_CACHE_CAPACITY")?,
            cache_ttl_secs: parse_optional(&get, "PHARMAROUTE_CACHE_TTL_SECS")?,
            category: get("PHARMAROUTE_CATEGORY").unwrap_or(defaults.category),
            default_location: defaults.default_location,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make routing meaningless.
    pub fn validate(&self) -> Result<()> {
        check(
            "PHARMAROUTE_SNAP_RADIUS_M",
            self.snap_radius_m,
            self.snap_radius_m.is_finite() && self.snap_radius_m > 0.0,
        )?;
        check(
            "PHARMAROUTE_SEARCH_RADIUS_M",
            self.search_radius_m,
            self.search_radius_m.is_finite() && self.search_radius_m > 0.0,
        )?;
        check(
            "PHARMAROUTE_SPEED_KMH",
            self.speed_kmh,
            self.speed_kmh.is_finite() && self.speed_kmh > 0.0,
        )?;
        check(
            "PHARMAROUTE_TURN_THRESHOLD_DEG",
            self.turn_threshold_deg,
            (0.0..180.0).contains(&self.turn_threshold_deg),
        )?;
        check(
            "PHARMAROUTE_CACHE_PRECISION",
            self.cache_precision,
            (MIN_PRECISION..=MAX_PRECISION).contains(&self.cache_precision),
        )?;
        check("PHARMAROUTE_MAX_PROBES", self.max_probes, self.max_probes > 0)?;
        self.default_location.validate()
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_ms.map(Duration::from_millis)
    }

    pub fn adapter(&self) -> GraphQueryAdapter {
        GraphQueryAdapter::new(self.snap_radius_m).with_timeout(self.query_timeout())
    }

    pub fn assembler(&self) -> RouteAssembler {
        RouteAssembler::new(self.turn_threshold_deg, self.speed_kmh)
    }

    pub fn selector(&self) -> CandidateSelector {
        CandidateSelector::new(self.max_probes, self.assembler())
    }

    /// Eviction policy selected by the cache settings; a TTL takes precedence.
    pub fn eviction_policy(&self) -> Box<dyn EvictionPolicy> {
        match (self.cache_ttl_secs, self.cache_capacity) {
            (Some(secs), _) => Box::new(TimeToLive {
                ttl: Duration::from_secs(secs),
            }),
            (None, Some(capacity)) => Box::new(LeastRecentlyUsed { capacity }),
            (None, None) => Box::new(Unbounded),
        }
    }

    /// Result cache, when caching is enabled.
    pub fn cache(&self) -> Option<Arc<ResultCache>> {
        self.cache_enabled
            .then(|| Arc::new(ResultCache::new(self.cache_precision, self.eviction_policy())))
    }

    /// Standard strategy chain wired with this configuration.
    pub fn chain(&self) -> RoutingChain {
        let chain = RoutingChain::standard(self.adapter());
        match self.cache() {
            Some(cache) => chain.with_cache(cache),
            None => chain,
        }
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    Ok(parse_optional(get, key)?.unwrap_or(default))
}

fn parse_optional<T, G>(get: &G, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|value| {
            value.trim().parse().map_err(|_| Error::InvalidConfig {
                key: key.to_string(),
                value,
            })
        })
        .transpose()
}

fn parse_flag<G>(get: &G, key: &str, default: bool) -> Result<bool>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::InvalidConfig {
                key: key.to_string(),
                value,
            }),
        },
    }
}

fn check<T: ToString>(key: &str, value: T, valid: bool) -> Result<()> {
    if valid {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            key: key.to_string(),
            value: value.to_string(),
        })
    }
}
