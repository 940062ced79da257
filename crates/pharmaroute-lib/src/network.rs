use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Opaque identifier for a road intersection, stable within one snapshot.
pub type NodeId = i64;

/// Road intersection or dead end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: NodeId,
    pub coordinate: Coordinate,
}

/// Road segment between two intersections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    pub from: NodeId,
    pub to: NodeId,
    /// Segment length in metres, used as the edge weight.
    pub length_m: f64,
    /// Intermediate shape points for curved roads, excluding both endpoints.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub geometry: Vec<Coordinate>,
}

/// Whether edges may be traversed in one or both directions.
///
/// Stated once per network and held for the lifetime of every graph built
/// from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directionality {
    /// Every edge is one-way from `from` to `to`.
    Directed,
    /// Every edge may be traversed both ways.
    #[default]
    Undirected,
}

impl fmt::Display for Directionality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Directionality::Directed => "directed",
            Directionality::Undirected => "undirected",
        };
        f.write_str(value)
    }
}

impl std::str::FromStr for Directionality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "directed" => Ok(Directionality::Directed),
            "undirected" => Ok(Directionality::Undirected),
            other => Err(format!("unknown directionality '{other}'")),
        }
    }
}

/// In-memory road network snapshot for one region.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoadNetwork {
    pub directionality: Directionality,
    pub nodes: HashMap<NodeId, NetworkNode>,
    pub edges: Vec<NetworkEdge>,
}

impl RoadNetwork {
    /// Create an empty network with the given directionality.
    pub fn new(directionality: Directionality) -> Self {
        Self {
            directionality,
            nodes: HashMap::new(),
            edges: Vec::new(),
        }
    }

    /// Insert or replace an intersection.
    pub fn add_node(&mut self, id: NodeId, coordinate: Coordinate) {
        self.nodes.insert(id, NetworkNode { id, coordinate });
    }

    /// Append a straight road segment.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId, length_m: f64) {
        self.edges.push(NetworkEdge {
            from,
            to,
            length_m,
            geometry: Vec::new(),
        });
    }

    /// Lookup an intersection coordinate.
    pub fn coordinate(&self, id: NodeId) -> Option<Coordinate> {
        self.nodes.get(&id).map(|node| node.coordinate)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Subset of the network whose intersections fall inside `region`.
    ///
    /// Edges are kept only when both endpoints survive the filter.
    pub fn clipped_to(&self, region: &BoundingRegion) -> Self {
        let nodes: HashMap<NodeId, NetworkNode> = self
            .nodes
            .iter()
            .filter(|(_, node)| region.contains(node.coordinate))
            .map(|(id, node)| (*id, *node))
            .collect();
        let edges = self
            .edges
            .iter()
            .filter(|edge| nodes.contains_key(&edge.from) && nodes.contains_key(&edge.to))
            .cloned()
            .collect();

        Self {
            directionality: self.directionality,
            nodes,
            edges,
        }
    }
}

/// Destination candidate such as a pharmacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub id: String,
    pub coordinate: Coordinate,
    pub name: String,
    pub category: String,
}

/// Fallback label for unnamed points of interest.
pub const UNNAMED_POI: &str = "Unnamed pharmacy";

/// Axis-aligned latitude/longitude box.
///
/// A box crossing the antimeridian has `west > east` and covers the
/// longitudes from `west` up to 180 and from -180 up to `east`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingRegion {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl BoundingRegion {
    /// Region covering the whole globe.
    pub const WORLD: BoundingRegion = BoundingRegion {
        south: -90.0,
        west: -180.0,
        north: 90.0,
        east: 180.0,
    };

    /// Square-ish region of `radius_m` metres around a centre point.
    pub fn around(center: Coordinate, radius_m: f64) -> Self {
        let lat_delta = (radius_m / crate::geo::EARTH_RADIUS_M).to_degrees();
        let cos_lat = center.lat.to_radians().cos().max(1e-6);
        let lon_delta = lat_delta / cos_lat;
        let (west, east) = if lon_delta >= 180.0 {
            (-180.0, 180.0)
        } else {
            (
                wrap_longitude(center.lon - lon_delta),
                wrap_longitude(center.lon + lon_delta),
            )
        };
        Self {
            south: (center.lat - lat_delta).max(-90.0),
            west,
            north: (center.lat + lat_delta).min(90.0),
            east,
        }
    }

    /// Whether the box wraps across the antimeridian.
    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, coordinate: Coordinate) -> bool {
        let lon = coordinate.lon;
        let lon_inside = if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            (self.west..=self.east).contains(&lon)
        };
        (self.south..=self.north).contains(&coordinate.lat) && lon_inside
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}
