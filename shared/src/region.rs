use serde::{Deserialize, Serialize};

use crate::score::Readings;

/// GeoJSON geometry, positions as `[lng, lat]`. Only the polygon kinds the
/// boundary pipeline produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "coordinates")]
pub enum Geometry {
    Polygon(Vec<Vec<[f64; 2]>>),
    MultiPolygon(Vec<Vec<Vec<[f64; 2]>>>),
}

impl Geometry {
    /// Vertex-average centroid of the largest outer ring. Good enough to
    /// anchor the weather-detail lookup; not an area-weighted centroid.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        let ring = match self {
            Geometry::Polygon(rings) => rings.first()?,
            Geometry::MultiPolygon(polygons) => polygons
                .iter()
                .filter_map(|rings| rings.first())
                .max_by_key(|ring| ring.len())?,
        };
        if ring.is_empty() {
            return None;
        }
        let (sum_lng, sum_lat) = ring
            .iter()
            .fold((0.0, 0.0), |(lng, lat), p| (lng + p[0], lat + p[1]));
        let n = ring.len() as f64;
        Some((sum_lat / n, sum_lng / n))
    }
}

/// Per-region statistics. Field names are the wire contract with the
/// aggregation pipeline; all values nullable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionProperties {
    pub name: String,
    pub admin: Option<String>,
    pub temp_avg: Option<f64>,
    pub prec_mean: Option<f64>,
    pub sunhours_mean: Option<f64>,
    pub overall_score: Option<f64>,
}

impl RegionProperties {
    /// The three mean fields as composite-mode readings, so region polygons
    /// classify against the preference profile without a server round trip.
    pub fn readings(&self) -> Readings {
        Readings {
            temperature: self.temp_avg,
            precipitation: self.prec_mean,
            sunshine: self.sunhours_mean,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionFeature {
    pub properties: RegionProperties,
    pub geometry: Geometry,
}

impl RegionFeature {
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.geometry.centroid()
    }
}

/// A decoded GeoJSON FeatureCollection of country or province polygons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDataset {
    pub features: Vec<RegionFeature>,
}
