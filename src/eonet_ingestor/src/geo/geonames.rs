//! Offline nearest-populated-place index.
//!
//! Loads a GeoNames-derived CSV with the header `lat,lon,name,admin1,admin2,cc`
//! (the layout of the widely used `cities1000` extracts) and answers lookups
//! by nearest place. Places are bucketed into a 1°×1° grid; a lookup scans
//! rings of cells outwards from the query cell and stops one ring after the
//! first hit. That is exact for almost every query and approximate only near
//! the poles, where a degree of longitude is short.
//!
//! The file is read lazily on the first lookup and kept for the lifetime of
//! the geocoder. A load failure is returned on every lookup attempt.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::Arc,
};

use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::Deserialize;
use snafu::{ResultExt, ensure};
use tracing::{debug, info};

use crate::{
    geo::{
        continent::normalize_longitude,
        geocoder::{
            EmptyIndexSnafu, GeocodeError, IndexOpenSnafu, IndexRecordSnafu, Place,
            ReverseGeocoder, TaskSnafu,
        },
    },
    models::coordinate::Coordinate,
};

/// Rings beyond this cover the whole globe.
const MAX_RING: i32 = 180;

#[derive(Debug, Deserialize)]
struct PlaceRecord {
    lat: f64,
    lon: f64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    admin1: String,
    #[serde(default)]
    admin2: String,
    #[serde(default)]
    cc: String,
}

type Cell = (i32, i32);

fn cell_of(c: &Coordinate) -> Cell {
    let lat = c.latitude.clamp(-90.0, 89.999_999).floor() as i32;
    let lon = normalize_longitude(c.longitude).floor() as i32;
    (lat, lon)
}

fn wrap_lon_cell(lon: i32) -> i32 {
    (lon + 180).rem_euclid(360) - 180
}

/// In-memory grid of places.
#[derive(Debug)]
pub struct PlaceIndex {
    places: Vec<(Coordinate, Place)>,
    grid: HashMap<Cell, Vec<usize>>,
}

impl PlaceIndex {
    pub fn new(places: Vec<(Coordinate, Place)>) -> Self {
        let mut grid: HashMap<Cell, Vec<usize>> = HashMap::new();
        for (i, (coord, _)) in places.iter().enumerate() {
            grid.entry(cell_of(coord)).or_default().push(i);
        }
        Self { places, grid }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    /// Reads the CSV index at `path`.
    pub fn load(path: &Path) -> Result<Self, GeocodeError> {
        let mut reader = csv::Reader::from_path(path).context(IndexOpenSnafu { path })?;
        let mut places = Vec::new();
        for (i, record) in reader.deserialize::<PlaceRecord>().enumerate() {
            let record = record.context(IndexRecordSnafu {
                path,
                record: i as u64 + 1,
            })?;
            let Some(coord) = Coordinate::from_parts(Some(record.lat), Some(record.lon)) else {
                continue;
            };
            places.push((
                coord,
                Place {
                    name: record.name,
                    admin1: record.admin1,
                    admin2: record.admin2,
                    country_code: record.cc,
                },
            ));
        }
        ensure!(!places.is_empty(), EmptyIndexSnafu { path });
        Ok(Self::new(places))
    }

    fn ring_cells(center: Cell, ring: i32) -> impl Iterator<Item = Cell> {
        let (clat, clon) = center;
        (-ring..=ring).flat_map(move |dlat| {
            (-ring..=ring).filter_map(move |dlon| {
                if dlat.abs().max(dlon.abs()) != ring {
                    return None;
                }
                let lat = clat + dlat;
                if !(-90..90).contains(&lat) {
                    return None;
                }
                Some((lat, wrap_lon_cell(clon + dlon)))
            })
        })
    }

    /// The nearest place to `point`, or `None` when the index is empty.
    pub fn nearest(&self, point: &Coordinate) -> Option<&Place> {
        let center = cell_of(point);
        let mut best: Option<(f64, usize)> = None;
        let mut stop_after: Option<i32> = None;

        for ring in 0..=MAX_RING {
            for cell in Self::ring_cells(center, ring) {
                let Some(members) = self.grid.get(&cell) else {
                    continue;
                };
                for &i in members {
                    let d = point.haversine_km(&self.places[i].0);
                    if best.is_none_or(|(bd, _)| d < bd) {
                        best = Some((d, i));
                    }
                }
            }
            if best.is_some() && stop_after.is_none() {
                stop_after = Some(ring + 1);
            }
            if stop_after.is_some_and(|last| ring >= last) {
                break;
            }
        }

        best.map(|(_, i)| &self.places[i].1)
    }
}

struct Inner {
    path: PathBuf,
    index: OnceCell<PlaceIndex>,
}

impl Inner {
    fn index(&self) -> Result<&PlaceIndex, GeocodeError> {
        self.index.get_or_try_init(|| {
            let index = PlaceIndex::load(&self.path)?;
            info!(path = %self.path.display(), places = index.len(), "Loaded geocoding index");
            Ok(index)
        })
    }
}

/// [`ReverseGeocoder`] backed by a local GeoNames extract.
#[derive(Clone)]
pub struct GeoNamesGeocoder {
    inner: Arc<Inner>,
}

impl GeoNamesGeocoder {
    /// Creates a geocoder that loads `path` on first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                index: OnceCell::new(),
            }),
        }
    }

    /// Creates a geocoder over an already built index.
    pub fn from_index(index: PlaceIndex) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(index);
        Self {
            inner: Arc::new(Inner {
                path: PathBuf::from("<memory>"),
                index: cell,
            }),
        }
    }
}

#[async_trait]
impl ReverseGeocoder for GeoNamesGeocoder {
    async fn reverse_batch(&self, points: &[Coordinate]) -> Result<Vec<Option<Place>>, GeocodeError> {
        let inner = Arc::clone(&self.inner);
        let points = points.to_vec();
        tokio::task::spawn_blocking(move || {
            let index = inner.index()?;
            debug!(points = points.len(), "Reverse geocoding batch");
            Ok(points.iter().map(|p| index.nearest(p).cloned()).collect())
        })
        .await
        .context(TaskSnafu)?
    }

    fn name(&self) -> &'static str {
        "GeoNames"
    }
}
