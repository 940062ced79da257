//! Candidate ranking and best-destination selection.

use std::cmp::Ordering;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::assembler::{Route, RouteAssembler};
use crate::error::{Error, Result};
use crate::geo::{haversine_m, Coordinate};
use crate::network::PointOfInterest;
use crate::routing::{Resolution, RoutingChain};
use crate::store::GraphStore;

/// Default number of ranked candidates probed through the routing chain.
pub const DEFAULT_MAX_PROBES: usize = 5;

/// Candidate with its straight-line distance from the user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub poi: PointOfInterest,
    pub estimated_distance_m: f64,
}

/// Accepted destination and its route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub poi: PointOfInterest,
    /// Zero-based position of the chosen candidate in the ranking.
    pub rank: usize,
    pub estimated_distance_m: f64,
    pub route: Route,
    pub resolution: Resolution,
    /// Number of candidates run through the chain.
    pub probed: usize,
}

/// Rank candidates by straight-line distance from `user`.
///
/// Candidates with invalid coordinates are skipped. Ties are broken by
/// identifier so the order is deterministic.
pub fn rank_candidates(
    user: Coordinate,
    candidates: &[PointOfInterest],
) -> Result<Vec<RankedCandidate>> {
    user.validate()?;

    let mut ranked: Vec<RankedCandidate> = candidates
        .iter()
        .filter(|poi| {
            let valid = poi.coordinate.is_valid();
            if !valid {
                warn!(id = %poi.id, name = %poi.name, "skipping candidate with invalid coordinate");
            }
            valid
        })
        .map(|poi| RankedCandidate {
            estimated_distance_m: haversine_m(user, poi.coordinate),
            poi: poi.clone(),
        })
        .collect();

    ranked.sort_by(compare_ranked);
    Ok(ranked)
}

fn compare_ranked(a: &RankedCandidate, b: &RankedCandidate) -> Ordering {
    a.estimated_distance_m
        .total_cmp(&b.estimated_distance_m)
        .then_with(|| a.poi.id.cmp(&b.poi.id))
}

/// Candidate with the route the chain resolved to it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutedCandidate {
    pub candidate: RankedCandidate,
    pub resolution: Resolution,
}

impl RoutedCandidate {
    /// Length of the resolved route in metres.
    pub fn route_distance_m(&self) -> f64 {
        self.resolution.result.distance_m().unwrap_or(f64::INFINITY)
    }
}

/// The `limit` candidates closest by resolved route distance.
///
/// Road routes come before straight-line estimates and ties keep the
/// straight-line order. A route is never shorter than the straight line, so
/// candidates are resolved in straight-line order until the remaining ones
/// cannot enter the top `limit`.
pub fn rank_by_route(
    chain: &RoutingChain,
    store: &dyn GraphStore,
    user: Coordinate,
    ranked: &[RankedCandidate],
    limit: usize,
) -> Result<Vec<RoutedCandidate>> {
    user.validate()?;
    if limit == 0 {
        return Ok(Vec::new());
    }

    let mut routed: Vec<RoutedCandidate> = Vec::new();
    let mut road_distances: Vec<f64> = Vec::new();
    for candidate in ranked {
        if road_distances.len() >= limit
            && candidate.estimated_distance_m >= road_distances[limit - 1]
        {
            debug!(
                resolved = routed.len(),
                remaining = ranked.len() - routed.len(),
                "remaining candidates cannot beat the current routes"
            );
            break;
        }

        let resolution = chain.resolve(store, user, candidate.poi.coordinate)?;
        if resolution.result.is_navigable() {
            if let Some(distance_m) = resolution.result.distance_m() {
                let at = road_distances.partition_point(|known| *known <= distance_m);
                road_distances.insert(at, distance_m);
            }
        }
        routed.push(RoutedCandidate {
            candidate: candidate.clone(),
            resolution,
        });
    }

    routed.sort_by(|a, b| {
        b.resolution
            .result
            .is_navigable()
            .cmp(&a.resolution.result.is_navigable())
            .then_with(|| a.route_distance_m().total_cmp(&b.route_distance_m()))
    });
    routed.truncate(limit);
    Ok(routed)
}

/// Drives the routing chain over ranked candidates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CandidateSelector {
    max_probes: usize,
    assembler: RouteAssembler,
}

impl Default for CandidateSelector {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROBES, RouteAssembler::default())
    }
}

impl CandidateSelector {
    /// A probe budget of zero is treated as one.
    pub fn new(max_probes: usize, assembler: RouteAssembler) -> Self {
        Self {
            max_probes: max_probes.max(1),
            assembler,
        }
    }

    pub fn max_probes(&self) -> usize {
        self.max_probes
    }

    /// Route to the nearest candidate that is actually reachable by road.
    ///
    /// The first navigable success in rank order wins. When none of the probed
    /// candidates is navigable, the one with the shortest straight-line result
    /// is accepted instead of failing.
    pub fn select_best(
        &self,
        chain: &RoutingChain,
        store: &dyn GraphStore,
        user: Coordinate,
        candidates: &[PointOfInterest],
    ) -> Result<Selection> {
        let ranked = rank_candidates(user, candidates)?;
        if ranked.is_empty() {
            return Err(Error::NoCandidateRoutable);
        }

        let mut fallback: Option<(usize, Resolution)> = None;
        let mut probed = 0usize;

        for (rank, candidate) in ranked.iter().enumerate().take(self.max_probes) {
            probed += 1;
            let resolution = chain.resolve(store, user, candidate.poi.coordinate)?;
            debug!(
                rank,
                id = %candidate.poi.id,
                algorithm = %resolution.algorithm(),
                "probed candidate"
            );

            if resolution.result.is_navigable() {
                return self.finish(&ranked, rank, resolution, probed);
            }

            let distance = resolution.result.distance_m().unwrap_or(f64::INFINITY);
            let shorter = match &fallback {
                Some((_, best)) => distance < best.result.distance_m().unwrap_or(f64::INFINITY),
                None => true,
            };
            if resolution.result.is_success() && shorter {
                fallback = Some((rank, resolution));
            }
        }

        match fallback {
            Some((rank, resolution)) => {
                warn!(
                    probed,
                    id = %ranked[rank].poi.id,
                    "no candidate reachable by road; accepting straight-line estimate"
                );
                self.finish(&ranked, rank, resolution, probed)
            }
            None => Err(Error::NoCandidateRoutable),
        }
    }

    /// Route to one specific point of interest.
    pub fn route_to(
        &self,
        chain: &RoutingChain,
        store: &dyn GraphStore,
        user: Coordinate,
        poi: &PointOfInterest,
    ) -> Result<Selection> {
        poi.coordinate.validate()?;
        let ranked = vec![RankedCandidate {
            estimated_distance_m: haversine_m(user, poi.coordinate),
            poi: poi.clone(),
        }];
        let resolution = chain.resolve(store, user, poi.coordinate)?;
        self.finish(&ranked, 0, resolution, 1)
    }

    fn finish(
        &self,
        ranked: &[RankedCandidate],
        rank: usize,
        resolution: Resolution,
        probed: usize,
    ) -> Result<Selection> {
        let candidate = &ranked[rank];
        let route = self.assembler.assemble(&resolution.result)?;
        info!(
            id = %candidate.poi.id,
            name = %candidate.poi.name,
            rank,
            algorithm = %route.algorithm,
            distance_m = route.total_distance_m,
            "selected destination"
        );
        Ok(Selection {
            poi: candidate.poi.clone(),
            rank,
            estimated_distance_m: candidate.estimated_distance_m,
            route,
            resolution,
            probed,
        })
    }
}

/// Find a candidate by case-insensitive name.
///
/// Unknown names fail with up to three close matches as suggestions.
pub fn find_by_name<'a>(
    candidates: &'a [PointOfInterest],
    name: &str,
) -> Result<&'a PointOfInterest> {
    let wanted = name.trim().to_lowercase();
    if let Some(poi) = candidates
        .iter()
        .find(|poi| poi.name.to_lowercase() == wanted)
    {
        return Ok(poi);
    }

    let mut scored: Vec<(f64, &str)> = candidates
        .iter()
        .map(|poi| {
            (
                strsim::jaro_winkler(&wanted, &poi.name.to_lowercase()),
                poi.name.as_str(),
            )
        })
        .filter(|(score, _)| *score >= 0.8)
        .collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);

    Err(Error::UnknownPointOfInterest {
        name: name.to_string(),
        suggestions: scored
            .into_iter()
            .take(3)
            .map(|(_, name)| name.to_string())
            .collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poi(id: &str, name: &str, lat: f64, lon: f64) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            coordinate: Coordinate { lat, lon },
            name: name.to_string(),
            category: "pharmacy".to_string(),
        }
    }

    #[test]
    fn ranking_skips_invalid_candidates() {
        let user = Coordinate { lat: 34.0, lon: -5.0 };
        let ranked = rank_candidates(
            user,
            &[
                poi("far", "Far", 34.1, -5.0),
                poi("bad", "Bad", 134.0, -5.0),
                poi("near", "Near", 34.01, -5.0),
            ],
        )
        .unwrap();
        let ids: Vec<&str> = ranked.iter().map(|c| c.poi.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "far"]);
    }

    #[test]
    fn ranking_rejects_invalid_user() {
        let result = rank_candidates(Coordinate { lat: 91.0, lon: 0.0 }, &[]);
        assert!(matches!(result, Err(Error::InvalidCoordinate { .. })));
    }

    #[test]
    fn zero_probe_budget_is_clamped() {
        assert_eq!(
            CandidateSelector::new(0, RouteAssembler::default()).max_probes(),
            1
        );
    }

    #[test]
    fn find_by_name_is_case_insensitive() {
        let pois = [poi("1", "Pharmacie Centrale", 34.0, -5.0)];
        assert_eq!(find_by_name(&pois, "pharmacie centrale").unwrap().id, "1");
    }

    #[test]
    fn find_by_name_suggests_close_matches() {
        let pois = [
            poi("1", "Pharmacie Centrale", 34.0, -5.0),
            poi("2", "Pharmacie Atlas", 34.0, -5.0),
        ];
        match find_by_name(&pois, "Pharmacie Centrle") {
            Err(Error::UnknownPointOfInterest { suggestions, .. }) => {
                assert_eq!(suggestions.first().map(String::as_str), Some("Pharmacie Centrale"));
            }
            other => panic!("expected unknown point of interest, got {other:?}"),
        }
    }
}
