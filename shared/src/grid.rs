use serde::{Deserialize, Serialize};

use crate::geo::GeoBounds;
use crate::score::Readings;

/// Cell size fallback when a grid has a single sample on an axis.
const SINGLE_SAMPLE_STEP_DEG: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    /// values matrix dimensions don't equal (len(lats), len(lngs)).
    ShapeMismatch,
    /// lats must strictly decrease north→south, lngs strictly increase west→east.
    UnorderedAxes,
    /// Composite grids must share one shape across variables.
    MisalignedVariables,
}

impl std::fmt::Display for GridError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GridError::ShapeMismatch => write!(f, "grid values don't match axis lengths"),
            GridError::UnorderedAxes => write!(f, "grid axes are not ordered"),
            GridError::MisalignedVariables => write!(f, "composite variable grids are misaligned"),
        }
    }
}

/// A rectangular sample grid of one variable. Samples are cell centers;
/// `None` marks no-data (ocean, missing coverage).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDataset {
    /// North→south, strictly decreasing.
    pub lats: Vec<f64>,
    /// West→east, strictly increasing.
    pub lngs: Vec<f64>,
    /// Addressed `[lat_index][lng_index]`.
    pub values: Vec<Vec<Option<f64>>>,
}

impl GridDataset {
    pub fn validate(&self) -> Result<(), GridError> {
        if self.values.len() != self.lats.len()
            || self.values.iter().any(|row| row.len() != self.lngs.len())
        {
            return Err(GridError::ShapeMismatch);
        }
        if self.lats.windows(2).any(|w| w[0] <= w[1]) {
            return Err(GridError::UnorderedAxes);
        }
        if self.lngs.windows(2).any(|w| w[0] >= w[1]) {
            return Err(GridError::UnorderedAxes);
        }
        Ok(())
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lngs.len())
    }

    pub fn value(&self, lat_idx: usize, lng_idx: usize) -> Option<f64> {
        self.values.get(lat_idx)?.get(lng_idx).copied().flatten()
    }

    /// The rectangle a sample covers: the sample point ± half the step to the
    /// adjacent sample per axis. Samples are centers, so rendering without
    /// this expansion would shift the overlay half a cell off true geography.
    pub fn cell_bounds(&self, lat_idx: usize, lng_idx: usize) -> GeoBounds {
        let lat = self.lats[lat_idx];
        let lng = self.lngs[lng_idx];

        let step_north = if lat_idx > 0 {
            self.lats[lat_idx - 1] - lat
        } else {
            self.lat_edge_step()
        };
        let step_south = if lat_idx + 1 < self.lats.len() {
            lat - self.lats[lat_idx + 1]
        } else {
            self.lat_edge_step()
        };
        let step_west = if lng_idx > 0 {
            lng - self.lngs[lng_idx - 1]
        } else {
            self.lng_edge_step()
        };
        let step_east = if lng_idx + 1 < self.lngs.len() {
            self.lngs[lng_idx + 1] - lng
        } else {
            self.lng_edge_step()
        };

        GeoBounds {
            north: lat + step_north / 2.0,
            south: lat - step_south / 2.0,
            east: lng + step_east / 2.0,
            west: lng - step_west / 2.0,
        }
    }

    fn lat_edge_step(&self) -> f64 {
        if self.lats.len() > 1 {
            self.lats[0] - self.lats[1]
        } else {
            SINGLE_SAMPLE_STEP_DEG
        }
    }

    fn lng_edge_step(&self) -> f64 {
        if self.lngs.len() > 1 {
            self.lngs[1] - self.lngs[0]
        } else {
            SINGLE_SAMPLE_STEP_DEG
        }
    }
}

/// Average two aligned grids cell-wise; a cell missing in either input is
/// missing in the output. Used to derive mean temperature from tmin+tmax.
pub fn average_grids(a: &GridDataset, b: &GridDataset) -> Result<GridDataset, GridError> {
    if a.lats != b.lats || a.lngs != b.lngs {
        return Err(GridError::MisalignedVariables);
    }
    let values = a
        .values
        .iter()
        .zip(&b.values)
        .map(|(row_a, row_b)| {
            row_a
                .iter()
                .zip(row_b)
                .map(|(va, vb)| match (va, vb) {
                    (Some(x), Some(y)) => Some((x + y) / 2.0),
                    _ => None,
                })
                .collect()
        })
        .collect();
    Ok(GridDataset {
        lats: a.lats.clone(),
        lngs: a.lngs.clone(),
        values,
    })
}

/// The three aligned variable grids the composite "overall" mode scores.
/// Raw values only; colors are always derived on demand.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeGrid {
    pub temp: GridDataset,
    pub prec: GridDataset,
    pub sun: GridDataset,
}

impl CompositeGrid {
    pub fn new(
        temp: GridDataset,
        prec: GridDataset,
        sun: GridDataset,
    ) -> Result<Self, GridError> {
        if temp.lats != prec.lats
            || temp.lats != sun.lats
            || temp.lngs != prec.lngs
            || temp.lngs != sun.lngs
        {
            return Err(GridError::MisalignedVariables);
        }
        Ok(Self { temp, prec, sun })
    }

    pub fn shape(&self) -> (usize, usize) {
        self.temp.shape()
    }

    pub fn readings_at(&self, lat_idx: usize, lng_idx: usize) -> Readings {
        Readings {
            temperature: self.temp.value(lat_idx, lng_idx),
            precipitation: self.prec.value(lat_idx, lng_idx),
            sunshine: self.sun.value(lat_idx, lng_idx),
        }
    }
}
