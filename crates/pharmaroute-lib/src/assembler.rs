//! Builds a structured route from an accepted strategy result.
//!
//! Assembly is a pure transformation: segment lengths are recomputed from the
//! path, checked against the reported distance, and consecutive segments with
//! similar bearings are merged into steps.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::geo::{bearing_delta, compass_label, initial_bearing, segment_lengths, Coordinate};
use crate::routing::{RouteAlgorithm, StrategyResult};

/// Default bearing change, in degrees, that starts a new step.
pub const DEFAULT_TURN_THRESHOLD_DEG: f64 = 30.0;

/// Default travel speed used for duration estimates (walking).
pub const DEFAULT_SPEED_KMH: f64 = 5.0;

/// Relative tolerance between the summed segments and the reported distance.
const DISTANCE_TOLERANCE: f64 = 1e-6;

/// Segments shorter than this keep the previous bearing.
const MIN_BEARING_SEGMENT_M: f64 = 1e-6;

/// Manoeuvre performed at the start of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Maneuver {
    Depart,
    Continue,
    SlightLeft,
    SlightRight,
    TurnLeft,
    TurnRight,
    SharpLeft,
    SharpRight,
    UTurn,
    Arrive,
}

impl Maneuver {
    /// Classify a signed bearing change; negative deltas turn left.
    pub fn from_delta(delta: f64) -> Self {
        let magnitude = delta.abs();
        let left = delta < 0.0;
        match magnitude {
            m if m < 45.0 => {
                if left {
                    Maneuver::SlightLeft
                } else {
                    Maneuver::SlightRight
                }
            }
            m if m < 120.0 => {
                if left {
                    Maneuver::TurnLeft
                } else {
                    Maneuver::TurnRight
                }
            }
            m if m < 170.0 => {
                if left {
                    Maneuver::SharpLeft
                } else {
                    Maneuver::SharpRight
                }
            }
            _ => Maneuver::UTurn,
        }
    }

    fn phrase(self) -> &'static str {
        match self {
            Maneuver::Depart => "Head",
            Maneuver::Continue => "Continue",
            Maneuver::SlightLeft => "Bear slightly left",
            Maneuver::SlightRight => "Bear slightly right",
            Maneuver::TurnLeft => "Turn left",
            Maneuver::TurnRight => "Turn right",
            Maneuver::SharpLeft => "Turn sharp left",
            Maneuver::SharpRight => "Turn sharp right",
            Maneuver::UTurn => "Make a U-turn",
            Maneuver::Arrive => "Arrive at the destination",
        }
    }
}

/// One step of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub index: usize,
    pub maneuver: Maneuver,
    /// Distance covered by this step in metres.
    pub distance_m: f64,
    /// Heading at the start of the step, degrees clockwise from north.
    pub bearing_deg: f64,
    /// Index into [`Route::waypoints`] where the step starts.
    pub start_waypoint: usize,
    pub instruction: String,
}

/// Navigable (or flagged non-navigable) route to a destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Route {
    pub algorithm: RouteAlgorithm,
    pub waypoints: Vec<Coordinate>,
    pub segment_distances_m: Vec<f64>,
    pub total_distance_m: f64,
    pub estimated_duration_s: f64,
    pub steps: Vec<RouteStep>,
    /// Road segments between the snapped intersections.
    pub hops: usize,
    /// False for straight-line estimates that do not follow roads.
    pub navigable: bool,
}

impl Route {
    pub fn source(&self) -> Option<Coordinate> {
        self.waypoints.first().copied()
    }

    pub fn destination(&self) -> Option<Coordinate> {
        self.waypoints.last().copied()
    }

    pub fn is_degraded(&self) -> bool {
        self.algorithm.is_degraded()
    }
}

/// Converts strategy results into routes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteAssembler {
    turn_threshold_deg: f64,
    speed_kmh: f64,
}

impl Default for RouteAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_TURN_THRESHOLD_DEG, DEFAULT_SPEED_KMH)
    }
}

impl RouteAssembler {
    pub fn new(turn_threshold_deg: f64, speed_kmh: f64) -> Self {
        Self {
            turn_threshold_deg,
            speed_kmh,
        }
    }

    pub fn turn_threshold_deg(&self) -> f64 {
        self.turn_threshold_deg
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    /// Assemble a route from a successful strategy result.
    pub fn assemble(&self, result: &StrategyResult) -> Result<Route> {
        let StrategyResult::Success {
            path,
            distance_m,
            algorithm,
            hops,
        } = result
        else {
            return Err(Error::UnresolvedRoute);
        };
        if path.is_empty() {
            return Err(Error::UnresolvedRoute);
        }

        let segment_distances_m = segment_lengths(path);
        let total_distance_m: f64 = segment_distances_m.iter().sum();
        if (total_distance_m - distance_m).abs() > DISTANCE_TOLERANCE * distance_m.max(1.0) {
            return Err(Error::RouteDistanceMismatch {
                expected: *distance_m,
                actual: total_distance_m,
            });
        }

        let bearings = segment_bearings(path, &segment_distances_m);
        let steps = self.build_steps(path.len(), &segment_distances_m, &bearings);
        let estimated_duration_s = if self.speed_kmh > 0.0 {
            total_distance_m / (self.speed_kmh / 3.6)
        } else {
            0.0
        };

        Ok(Route {
            algorithm: *algorithm,
            waypoints: path.clone(),
            segment_distances_m,
            total_distance_m,
            estimated_duration_s,
            steps,
            hops: *hops,
            navigable: algorithm.is_navigable(),
        })
    }

    fn build_steps(
        &self,
        waypoint_count: usize,
        distances: &[f64],
        bearings: &[f64],
    ) -> Vec<RouteStep> {
        let initial = bearings.first().copied().unwrap_or(0.0);
        let mut steps = vec![draft(Maneuver::Depart, 0, initial, 0.0)];

        if let Some(&first_distance) = distances.first() {
            let mut current = draft(Maneuver::Continue, 0, initial, first_distance);
            for index in 1..distances.len() {
                let delta = bearing_delta(bearings[index - 1], bearings[index]);
                if delta.abs() > self.turn_threshold_deg {
                    steps.push(current);
                    current = draft(
                        Maneuver::from_delta(delta),
                        index,
                        bearings[index],
                        distances[index],
                    );
                } else {
                    current.distance_m += distances[index];
                }
            }
            steps.push(current);
        }

        let final_bearing = bearings.last().copied().unwrap_or(initial);
        steps.push(draft(
            Maneuver::Arrive,
            waypoint_count.saturating_sub(1),
            final_bearing,
            0.0,
        ));

        for (index, step) in steps.iter_mut().enumerate() {
            step.index = index;
            step.instruction = instruction(step);
        }
        steps
    }
}

fn draft(maneuver: Maneuver, start_waypoint: usize, bearing_deg: f64, distance_m: f64) -> RouteStep {
    RouteStep {
        index: 0,
        maneuver,
        distance_m,
        bearing_deg,
        start_waypoint,
        instruction: String::new(),
    }
}

/// Bearing of each segment; degenerate segments inherit the previous bearing.
fn segment_bearings(path: &[Coordinate], distances: &[f64]) -> Vec<f64> {
    let mut bearings: Vec<Option<f64>> = Vec::with_capacity(distances.len());
    let mut previous = None;
    for (pair, distance) in path.windows(2).zip(distances) {
        if *distance > MIN_BEARING_SEGMENT_M {
            previous = Some(initial_bearing(pair[0], pair[1]));
        }
        bearings.push(previous);
    }

    let first_known = bearings.iter().flatten().next().copied().unwrap_or(0.0);
    bearings
        .into_iter()
        .map(|bearing| bearing.unwrap_or(first_known))
        .collect()
}

fn instruction(step: &RouteStep) -> String {
    let heading = compass_label(step.bearing_deg);
    match step.maneuver {
        Maneuver::Depart => format!("{} {heading}", step.maneuver.phrase()),
        Maneuver::Arrive => step.maneuver.phrase().to_string(),
        Maneuver::Continue => format!(
            "{} {heading} for {}",
            step.maneuver.phrase(),
            format_distance(step.distance_m)
        ),
        _ => format!(
            "{} and continue {heading} for {}",
            step.maneuver.phrase(),
            format_distance(step.distance_m)
        ),
    }
}

/// Human readable distance: metres below one kilometre, kilometres above.
pub fn format_distance(distance_m: f64) -> String {
    if distance_m < 1_000.0 {
        format!("{distance_m:.0} m")
    } else {
        format!("{:.2} km", distance_m / 1_000.0)
    }
}
