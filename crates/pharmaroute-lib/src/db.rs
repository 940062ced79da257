//! SQLite persistence for road networks and points of interest.
//!
//! A dataset holds four tables: `intersections`, `roads`, `pois` and a
//! key/value `metadata` table recording the network directionality. Road
//! geometry is stored as a JSON array of coordinates.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OpenFlags, Row};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::geo::Coordinate;
use crate::network::{
    BoundingRegion, Directionality, NetworkEdge, NetworkNode, PointOfInterest, RoadNetwork,
    UNNAMED_POI,
};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS intersections (
    id INTEGER PRIMARY KEY,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
);
CREATE TABLE IF NOT EXISTS roads (
    from_id INTEGER NOT NULL,
    to_id INTEGER NOT NULL,
    length_m REAL NOT NULL,
    geometry TEXT
);
CREATE TABLE IF NOT EXISTS pois (
    id TEXT PRIMARY KEY,
    name TEXT,
    category TEXT NOT NULL,
    latitude REAL NOT NULL,
    longitude REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_intersections_location ON intersections (latitude, longitude);
CREATE INDEX IF NOT EXISTS idx_pois_location ON pois (latitude, longitude);
CREATE INDEX IF NOT EXISTS idx_pois_category ON pois (category);
";

const DIRECTIONALITY_KEY: &str = "directionality";

/// Longitude filter over the numbered `west`/`east` parameters. A box with
/// `west > east` wraps across the antimeridian.
fn longitude_filter(west: usize, east: usize) -> String {
    format!(
        "(longitude BETWEEN ?{west} AND ?{east} \
         OR (?{west} > ?{east} AND (longitude >= ?{west} OR longitude <= ?{east})))"
    )
}

/// Portable dataset export used by the `import` command.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetExport {
    #[serde(default)]
    pub directionality: Directionality,
    pub nodes: Vec<NetworkNode>,
    #[serde(default)]
    pub edges: Vec<NetworkEdge>,
    #[serde(default)]
    pub pois: Vec<PointOfInterest>,
}

impl DatasetExport {
    /// Parse an export from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Split into the network and the point-of-interest list.
    pub fn into_parts(self) -> (RoadNetwork, Vec<PointOfInterest>) {
        let mut network = RoadNetwork::new(self.directionality);
        for node in self.nodes {
            network.add_node(node.id, node.coordinate);
        }
        network.edges = self.edges;
        (network, self.pois)
    }
}

/// Counts reported after a dataset is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub intersections: usize,
    pub roads: usize,
    pub pois: usize,
}

/// Replace the contents of the dataset at `path`, creating it if needed.
///
/// All tables are cleared and rewritten inside a single transaction so readers
/// never observe a half-written snapshot.
pub fn save_dataset(
    path: &Path,
    network: &RoadNetwork,
    pois: &[PointOfInterest],
) -> Result<ImportSummary> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut connection = Connection::open(path)?;
    connection.execute_batch(SCHEMA)?;

    let tx = connection.transaction()?;
    tx.execute_batch(
        "DELETE FROM roads; DELETE FROM intersections; DELETE FROM pois; DELETE FROM metadata;",
    )?;

    tx.execute(
        "INSERT INTO metadata (key, value) VALUES (?1, ?2)",
        params![DIRECTIONALITY_KEY, network.directionality.to_string()],
    )?;

    let mut nodes: Vec<&NetworkNode> = network.nodes.values().collect();
    nodes.sort_by_key(|node| node.id);
    {
        let mut stmt = tx.prepare(
            "INSERT INTO intersections (id, latitude, longitude) VALUES (?1, ?2, ?3)",
        )?;
        for node in &nodes {
            stmt.execute(params![node.id, node.coordinate.lat, node.coordinate.lon])?;
        }

        let mut stmt = tx.prepare(
            "INSERT INTO roads (from_id, to_id, length_m, geometry) VALUES (?1, ?2, ?3, ?4)",
        )?;
        for edge in &network.edges {
            let geometry = if edge.geometry.is_empty() {
                None
            } else {
                Some(serde_json::to_string(&edge.geometry)?)
            };
            stmt.execute(params![edge.from, edge.to, edge.length_m, geometry])?;
        }

        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO pois (id, name, category, latitude, longitude)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        for poi in pois {
            stmt.execute(params![
                poi.id,
                poi.name,
                poi.category,
                poi.coordinate.lat,
                poi.coordinate.lon
            ])?;
        }
    }
    tx.commit()?;

    let summary = ImportSummary {
        intersections: nodes.len(),
        roads: network.edges.len(),
        pois: pois.len(),
    };
    info!(
        path = %path.display(),
        intersections = summary.intersections,
        roads = summary.roads,
        pois = summary.pois,
        "saved dataset"
    );
    Ok(summary)
}

/// Open an existing dataset read-only and verify its schema.
pub fn open_dataset(path: &Path) -> Result<Connection> {
    if !path.is_file() {
        return Err(Error::DatasetNotFound {
            path: path.to_path_buf(),
        });
    }
    let connection = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
    verify_schema(&connection)?;
    Ok(connection)
}

/// Load the complete road network stored at `path`.
pub fn load_network(path: &Path) -> Result<RoadNetwork> {
    let connection = open_dataset(path)?;
    load_network_in(&connection, &BoundingRegion::WORLD)
}

/// Load the part of the network whose intersections fall inside `region`.
///
/// Roads are kept only when both endpoints were loaded.
pub fn load_network_in(connection: &Connection, region: &BoundingRegion) -> Result<RoadNetwork> {
    let directionality = read_directionality(connection)?;
    let mut network = RoadNetwork::new(directionality);

    let mut stmt = connection.prepare(&format!(
        "SELECT id, latitude, longitude FROM intersections
         WHERE latitude BETWEEN ?1 AND ?2 AND {}",
        longitude_filter(3, 4)
    ))?;
    let rows = stmt.query_map(
        params![region.south, region.north, region.west, region.east],
        |row| {
            Ok(NetworkNode {
                id: row.get(0)?,
                coordinate: Coordinate {
                    lat: row.get(1)?,
                    lon: row.get(2)?,
                },
            })
        },
    )?;
    for node in rows {
        let node = node?;
        network.add_node(node.id, node.coordinate);
    }

    let mut stmt = connection.prepare("SELECT from_id, to_id, length_m, geometry FROM roads")?;
    let mut rows = stmt.query([])?;
    let mut dangling = 0usize;
    while let Some(row) = rows.next()? {
        let edge = row_to_edge(row)?;
        if network.nodes.contains_key(&edge.from) && network.nodes.contains_key(&edge.to) {
            network.edges.push(edge);
        } else {
            dangling += 1;
        }
    }

    if dangling > 0 && *region == BoundingRegion::WORLD {
        warn!(dangling, "ignored roads referencing unknown intersections");
    }
    debug!(
        intersections = network.node_count(),
        roads = network.edge_count(),
        %directionality,
        "loaded road network"
    );
    Ok(network)
}

/// Load points of interest of `category` inside `region`, sorted by id.
pub fn load_pois(
    connection: &Connection,
    region: &BoundingRegion,
    category: &str,
) -> Result<Vec<PointOfInterest>> {
    let mut stmt = connection.prepare(&format!(
        "SELECT id, name, category, latitude, longitude FROM pois
         WHERE category = ?1
           AND latitude BETWEEN ?2 AND ?3 AND {}
         ORDER BY id",
        longitude_filter(4, 5)
    ))?;
    let rows = stmt.query_map(
        params![category, region.south, region.north, region.west, region.east],
        row_to_poi,
    )?;
    let pois = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    debug!(category, count = pois.len(), "loaded points of interest");
    Ok(pois)
}

fn row_to_edge(row: &Row<'_>) -> Result<NetworkEdge> {
    let geometry: Option<String> = row.get(3)?;
    let geometry = match geometry.as_deref() {
        Some(text) if !text.trim().is_empty() => serde_json::from_str(text)?,
        _ => Vec::new(),
    };
    Ok(NetworkEdge {
        from: row.get(0)?,
        to: row.get(1)?,
        length_m: row.get(2)?,
        geometry,
    })
}

fn row_to_poi(row: &Row<'_>) -> rusqlite::Result<PointOfInterest> {
    let name: Option<String> = row.get(1)?;
    Ok(PointOfInterest {
        id: row.get(0)?,
        name: name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| UNNAMED_POI.to_string()),
        category: row.get(2)?,
        coordinate: Coordinate {
            lat: row.get(3)?,
            lon: row.get(4)?,
        },
    })
}

fn read_directionality(connection: &Connection) -> Result<Directionality> {
    let mut stmt = connection.prepare("SELECT value FROM metadata WHERE key = ?1")?;
    let mut rows = stmt.query([DIRECTIONALITY_KEY])?;
    let Some(row) = rows.next()? else {
        return Ok(Directionality::default());
    };
    let value: String = row.get(0)?;
    value.parse().map_err(|_| Error::InvalidConfig {
        key: DIRECTIONALITY_KEY.to_string(),
        value,
    })
}

fn verify_schema(connection: &Connection) -> Result<()> {
    let required: [(&str, &[&str]); 4] = [
        ("intersections", &["id", "latitude", "longitude"]),
        ("roads", &["from_id", "to_id", "length_m", "geometry"]),
        ("pois", &["id", "name", "category", "latitude", "longitude"]),
        ("metadata", &["key", "value"]),
    ];
    for (table, columns) in required {
        if !table_exists(connection, table)? || !table_has_columns(connection, table, columns)? {
            debug!(table, "dataset is missing a required table or column");
            return Err(Error::UnsupportedSchema);
        }
    }
    Ok(())
}

fn table_exists(connection: &Connection, table: &str) -> Result<bool> {
    let mut stmt = connection
        .prepare("SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1 LIMIT 1")?;
    let mut rows = stmt.query([table])?;
    Ok(rows.next()?.is_some())
}

fn table_has_columns(connection: &Connection, table: &str, required: &[&str]) -> Result<bool> {
    let pragma = format!("PRAGMA table_info('{table}')");
    let mut stmt = connection.prepare(&pragma)?;
    let columns: Vec<String> = stmt
        .query_map([], |row| row.get(1))?
        .collect::<rusqlite::Result<_>>()?;

    Ok(required.iter().all(|required| {
        columns
            .iter()
            .any(|column| column.eq_ignore_ascii_case(required))
    }))
}

/// Count rows per table, used for diagnostics.
pub fn table_counts(connection: &Connection) -> Result<HashMap<&'static str, usize>> {
    let mut counts = HashMap::new();
    for table in ["intersections", "roads", "pois"] {
        let count: i64 =
            connection.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        counts.insert(table, usize::try_from(count).unwrap_or_default());
    }
    Ok(counts)
}
