use serde::Serialize;
use serde_json::{json, Value};

use crate::assembler::{format_distance, Route, RouteStep};
use crate::error::Result;
use crate::geo::{compass_label, initial_bearing, Coordinate};
use crate::network::PointOfInterest;
use crate::routing::{Attempt, RouteAlgorithm};
use crate::selector::{RankedCandidate, RoutedCandidate, Selection};

/// Walking speed used for the listing estimate.
pub const WALKING_SPEED_KMH: f64 = 5.0;

/// Whole minutes needed to walk `distance_m` metres at 5 km/h.
pub fn walking_minutes(distance_m: f64) -> u64 {
    let minutes = (distance_m / 1_000.0) / WALKING_SPEED_KMH * 60.0;
    if minutes.is_finite() && minutes > 0.0 {
        minutes.floor() as u64
    } else {
        0
    }
}

/// Presentation style for turning a summary into text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    PlainText,
    RichText,
}

/// Destination reported in summaries.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DestinationSummary {
    pub id: String,
    pub name: String,
    pub category: String,
    pub coordinate: Coordinate,
}

impl From<&PointOfInterest> for DestinationSummary {
    fn from(poi: &PointOfInterest) -> Self {
        Self {
            id: poi.id.clone(),
            name: poi.name.clone(),
            category: poi.category.clone(),
            coordinate: poi.coordinate,
        }
    }
}

/// Structured representation of a selected route that consumers can serialise.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RouteSummary {
    pub destination: DestinationSummary,
    pub algorithm: RouteAlgorithm,
    pub navigable: bool,
    pub degraded: bool,
    pub total_distance_m: f64,
    pub estimated_duration_s: f64,
    pub waypoint_count: usize,
    /// Road segments between the snapped intersections.
    pub hops: usize,
    /// Zero-based rank of the destination among the candidates.
    pub rank: usize,
    pub probed: usize,
    pub from_cache: bool,
    pub attempts: Vec<Attempt>,
    pub steps: Vec<RouteStep>,
}

impl RouteSummary {
    pub fn from_selection(selection: &Selection) -> Self {
        let route = &selection.route;
        Self {
            destination: DestinationSummary::from(&selection.poi),
            algorithm: route.algorithm,
            navigable: route.navigable,
            degraded: route.is_degraded(),
            total_distance_m: route.total_distance_m,
            estimated_duration_s: route.estimated_duration_s,
            waypoint_count: route.waypoints.len(),
            hops: route.hops,
            rank: selection.rank,
            probed: selection.probed,
            from_cache: selection.resolution.from_cache,
            attempts: selection.resolution.attempts.clone(),
            steps: route.steps.clone(),
        }
    }

    /// Warning shown alongside degraded routes, if any.
    pub fn warning(&self) -> Option<&'static str> {
        if !self.navigable {
            Some("straight-line estimate only; no road route was found")
        } else if self.degraded {
            Some("fewest-segments route; it may not be the shortest by distance")
        } else {
            None
        }
    }

    pub fn render(&self, mode: RenderMode) -> String {
        match mode {
            RenderMode::PlainText => self.render_plain(),
            RenderMode::RichText => self.render_rich(),
        }
    }

    fn render_plain(&self) -> String {
        let mut lines = vec![format!(
            "Route to {} ({}): {}, about {} min (algorithm: {}, road segments: {})",
            self.destination.name,
            self.destination.id,
            format_distance(self.total_distance_m),
            duration_minutes(self.estimated_duration_s),
            self.algorithm,
            self.hops
        )];
        if let Some(warning) = self.warning() {
            lines.push(format!("warning: {warning}"));
        }
        lines.extend(
            self.steps
                .iter()
                .map(|step| format!("{:>3}: {}", step.index, step.instruction)),
        );
        join_lines(lines)
    }

    fn render_rich(&self) -> String {
        let mut lines = vec![format!(
            "**Route** to _{}_ ({}, about {} min, algorithm: `{}`)",
            self.destination.name,
            format_distance(self.total_distance_m),
            duration_minutes(self.estimated_duration_s),
            self.algorithm
        )];
        if let Some(warning) = self.warning() {
            lines.push(format!("> {warning}"));
        }
        lines.extend(
            self.steps
                .iter()
                .map(|step| format!("* {:>2}. {}", step.index, step.instruction)),
        );
        join_lines(lines)
    }
}

/// Join lines with a trailing newline, or nothing for an empty list.
fn join_lines(lines: Vec<String>) -> String {
    if lines.is_empty() {
        return String::new();
    }
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn duration_minutes(seconds: f64) -> u64 {
    if seconds.is_finite() && seconds > 0.0 {
        (seconds / 60.0).round() as u64
    } else {
        0
    }
}

/// One line of the nearest-candidate listing.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CandidateListing {
    /// One-based position in the listing.
    pub rank: usize,
    pub id: String,
    pub name: String,
    /// Straight-line distance.
    pub distance_km: f64,
    /// Walking time over the road distance when routed, else the straight line.
    pub walking_minutes: u64,
    pub direction: &'static str,
    pub coordinate: Coordinate,
    /// Length of the resolved route, when the listing was routed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub road_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hops: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<RouteAlgorithm>,
}

impl CandidateListing {
    fn new(rank: usize, user: Coordinate, candidate: &RankedCandidate) -> Self {
        Self {
            rank,
            id: candidate.poi.id.clone(),
            name: candidate.poi.name.clone(),
            distance_km: candidate.estimated_distance_m / 1_000.0,
            walking_minutes: walking_minutes(candidate.estimated_distance_m),
            direction: compass_label(initial_bearing(user, candidate.poi.coordinate)),
            coordinate: candidate.poi.coordinate,
            road_distance_km: None,
            hops: None,
            algorithm: None,
        }
    }
}

/// Listing of the `limit` nearest ranked candidates.
pub fn list_candidates(
    user: Coordinate,
    ranked: &[RankedCandidate],
    limit: usize,
) -> Vec<CandidateListing> {
    ranked
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, candidate)| CandidateListing::new(index + 1, user, candidate))
        .collect()
}

/// Listing of candidates ordered by resolved route, with road distance and hops.
pub fn list_routed_candidates(
    user: Coordinate,
    routed: &[RoutedCandidate],
    limit: usize,
) -> Vec<CandidateListing> {
    routed
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, entry)| {
            let mut listing = CandidateListing::new(index + 1, user, &entry.candidate);
            let result = &entry.resolution.result;
            if let Some(distance_m) = result.distance_m() {
                listing.road_distance_km = Some(distance_m / 1_000.0);
                listing.walking_minutes = walking_minutes(distance_m);
            }
            listing.hops = result.hops();
            listing.algorithm = result.algorithm();
            listing
        })
        .collect()
}

/// Render the listing as plain text.
pub fn render_listing(listing: &[CandidateListing]) -> String {
    let mut lines = Vec::with_capacity(listing.len() * 2);
    for entry in listing {
        lines.push(format!("{:>2}. {} ({})", entry.rank, entry.name, entry.id));
        let route = match (entry.road_distance_km, entry.hops, entry.algorithm) {
            (Some(road_km), Some(hops), Some(algorithm)) if algorithm.is_navigable() => {
                format!(" - {road_km:.2} km by road via {algorithm}, road segments: {hops}")
            }
            (Some(_), _, Some(_)) => " - no road route; straight-line estimate".to_string(),
            _ => String::new(),
        };
        lines.push(format!(
            "    {:.2} km {}{} - about {} min on foot - {}",
            entry.distance_km, entry.direction, route, entry.walking_minutes, entry.coordinate
        ));
    }
    join_lines(lines)
}

/// Extra markers drawn next to a route.
#[derive(Debug, Clone, Default)]
pub struct MapContext {
    pub user: Option<Coordinate>,
    pub destination: Option<PointOfInterest>,
    pub candidates: Vec<PointOfInterest>,
}

/// Turns a route into a visual artifact.
pub trait MapRenderer {
    /// File extension of the produced artifact.
    fn extension(&self) -> &'static str;

    fn render(&self, route: &Route, context: &MapContext) -> Result<String>;
}

/// Renders a GeoJSON `FeatureCollection` with the route line and markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoJsonRenderer {
    pub pretty: bool,
}

impl MapRenderer for GeoJsonRenderer {
    fn extension(&self) -> &'static str {
        "geojson"
    }

    fn render(&self, route: &Route, context: &MapContext) -> Result<String> {
        let mut features = vec![json!({
            "type": "Feature",
            "geometry": {
                "type": "LineString",
                "coordinates": route.waypoints.iter().map(position).collect::<Vec<_>>(),
            },
            "properties": {
                "kind": "route",
                "algorithm": route.algorithm,
                "navigable": route.navigable,
                "total_distance_m": route.total_distance_m,
                "estimated_duration_s": route.estimated_duration_s,
            },
        })];

        if let Some(user) = context.user {
            features.push(point_feature(user, json!({ "kind": "user" })));
        }
        if let Some(poi) = &context.destination {
            features.push(poi_feature(poi, "destination"));
        }
        let destination_id = context.destination.as_ref().map(|poi| poi.id.as_str());
        for poi in &context.candidates {
            if Some(poi.id.as_str()) != destination_id {
                features.push(poi_feature(poi, "candidate"));
            }
        }

        let collection = json!({
            "type": "FeatureCollection",
            "features": features,
        });
        let text = if self.pretty {
            serde_json::to_string_pretty(&collection)?
        } else {
            serde_json::to_string(&collection)?
        };
        Ok(text)
    }
}

/// GeoJSON positions are longitude first.
fn position(coordinate: &Coordinate) -> Value {
    json!([coordinate.lon, coordinate.lat])
}

fn point_feature(coordinate: Coordinate, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "geometry": { "type": "Point", "coordinates": position(&coordinate) },
        "properties": properties,
    })
}

fn poi_feature(poi: &PointOfInterest, kind: &str) -> Value {
    point_feature(
        poi.coordinate,
        json!({
            "kind": kind,
            "id": poi.id,
            "name": poi.name,
            "category": poi.category,
        }),
    )
}
