//! Sources of road networks and points of interest.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::db::{load_network_in, load_pois, open_dataset};
use crate::error::Result;
use crate::network::{BoundingRegion, PointOfInterest, RoadNetwork};

/// Default point-of-interest category.
pub const DEFAULT_CATEGORY: &str = "pharmacy";

/// Categories retried, in order, when a category yields no results.
const ALTERNATE_CATEGORIES: &[(&str, &str)] = &[("pharmacy", "chemist")];

/// Supplies map data for a bounding region.
///
/// Repeated calls for the same region must return structurally equivalent
/// results.
pub trait MapDataProvider {
    fn fetch_network(&self, region: &BoundingRegion) -> Result<RoadNetwork>;

    fn fetch_pois(&self, region: &BoundingRegion, category: &str) -> Result<Vec<PointOfInterest>>;
}

/// Fetch points of interest, falling back to alternate categories when empty.
pub fn fetch_candidates(
    provider: &dyn MapDataProvider,
    region: &BoundingRegion,
    category: &str,
) -> Result<Vec<PointOfInterest>> {
    let pois = provider.fetch_pois(region, category)?;
    if !pois.is_empty() {
        return Ok(pois);
    }

    for (primary, alternate) in ALTERNATE_CATEGORIES {
        if category.eq_ignore_ascii_case(primary) {
            info!(category, alternate, "no results; retrying with alternate category");
            return provider.fetch_pois(region, alternate);
        }
    }
    Ok(pois)
}

/// Provider backed by an imported SQLite dataset.
#[derive(Debug, Clone)]
pub struct SqliteMapProvider {
    path: PathBuf,
}

impl SqliteMapProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MapDataProvider for SqliteMapProvider {
    fn fetch_network(&self, region: &BoundingRegion) -> Result<RoadNetwork> {
        let connection = open_dataset(&self.path)?;
        load_network_in(&connection, region)
    }

    fn fetch_pois(&self, region: &BoundingRegion, category: &str) -> Result<Vec<PointOfInterest>> {
        let connection = open_dataset(&self.path)?;
        load_pois(&connection, region, category)
    }
}

/// Provider serving a fixed in-memory snapshot.
#[derive(Debug, Clone, Default)]
pub struct StaticMapProvider {
    network: RoadNetwork,
    pois: Vec<PointOfInterest>,
}

impl StaticMapProvider {
    pub fn new(network: RoadNetwork, pois: Vec<PointOfInterest>) -> Self {
        Self { network, pois }
    }
}

impl MapDataProvider for StaticMapProvider {
    fn fetch_network(&self, region: &BoundingRegion) -> Result<RoadNetwork> {
        Ok(self.network.clipped_to(region))
    }

    fn fetch_pois(&self, region: &BoundingRegion, category: &str) -> Result<Vec<PointOfInterest>> {
        let mut pois: Vec<PointOfInterest> = self
            .pois
            .iter()
            .filter(|poi| poi.category == category && region.contains(poi.coordinate))
            .cloned()
            .collect();
        pois.sort_by(|a, b| a.id.cmp(&b.id));
        debug!(category, count = pois.len(), "served points of interest");
        Ok(pois)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;

    fn poi(id: &str, category: &str) -> PointOfInterest {
        PointOfInterest {
            id: id.to_string(),
            coordinate: Coordinate { lat: 34.0, lon: -5.0 },
            name: format!("POI {id}"),
            category: category.to_string(),
        }
    }

    #[test]
    fn falls_back_to_chemist() {
        let provider = StaticMapProvider::new(RoadNetwork::default(), vec![poi("c1", "chemist")]);
        let pois = fetch_candidates(&provider, &BoundingRegion::WORLD, "pharmacy").unwrap();
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].category, "chemist");
    }

    #[test]
    fn primary_category_wins_when_present() {
        let provider = StaticMapProvider::new(
            RoadNetwork::default(),
            vec![poi("c1", "chemist"), poi("p1", "pharmacy")],
        );
        let pois = fetch_candidates(&provider, &BoundingRegion::WORLD, "pharmacy").unwrap();
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].id, "p1");
    }

    #[test]
    fn other_categories_do_not_fall_back() {
        let provider = StaticMapProvider::new(RoadNetwork::default(), vec![poi("c1", "chemist")]);
        let pois = fetch_candidates(&provider, &BoundingRegion::WORLD, "hospital").unwrap();
        assert!(pois.is_empty());
    }

    #[test]
    fn sqlite_provider_reports_missing_dataset() {
        let provider = SqliteMapProvider::new("/nonexistent/pharmaroute.db");
        assert!(provider.fetch_network(&BoundingRegion::WORLD).is_err());
    }
}
