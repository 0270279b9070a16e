//! In-memory dataset cache. Stores raw values only — never derived colors —
//! so a preference change is always a pure recolor, never a refetch.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use climatlas_shared::geo::{GRID_STALE_TOLERANCE_DEG, GeoBounds, QuantizedBounds};
use climatlas_shared::grid::{CompositeGrid, GridDataset};
use climatlas_shared::mode::ClimateVariable;
use climatlas_shared::region::RegionDataset;
use climatlas_shared::resolution::Granularity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridKey {
    pub variable: ClimateVariable,
    pub month: u8,
    pub resolution: u32,
    pub bounds: QuantizedBounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionKey {
    pub month: u8,
    pub granularity: Granularity,
}

struct RegionEntry {
    dataset: Rc<RegionDataset>,
    /// Bounds the fetch covered. `None` means world-wide (country layer).
    coverage: Option<GeoBounds>,
}

struct CompositeEntry {
    month: u8,
    resolution: u32,
    viewport: GeoBounds,
    data: Rc<CompositeGrid>,
}

/// Session-scoped memo of fetched datasets. Single-threaded; interior
/// mutability only, no locking. Invalidated wholesale by `clear()`.
#[derive(Default)]
pub struct DataCache {
    grids: RefCell<HashMap<GridKey, Rc<GridDataset>>>,
    regions: RefCell<HashMap<RegionKey, RegionEntry>>,
    composite: RefCell<Option<CompositeEntry>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(&self, key: &GridKey) -> Option<Rc<GridDataset>> {
        self.grids.borrow().get(key).cloned()
    }

    pub fn put_grid(&self, key: GridKey, dataset: Rc<GridDataset>) {
        self.grids.borrow_mut().insert(key, dataset);
    }

    /// Region hit. Province entries carry the (padded) bounds they were
    /// fetched for and only hit while the viewport stays inside them.
    pub fn region(&self, key: &RegionKey, viewport: &GeoBounds) -> Option<Rc<RegionDataset>> {
        let regions = self.regions.borrow();
        let entry = regions.get(key)?;
        match &entry.coverage {
            Some(coverage) if !coverage.contains(viewport) => None,
            _ => Some(entry.dataset.clone()),
        }
    }

    pub fn put_region(
        &self,
        key: RegionKey,
        dataset: Rc<RegionDataset>,
        coverage: Option<GeoBounds>,
    ) {
        self.regions
            .borrow_mut()
            .insert(key, RegionEntry { dataset, coverage });
    }

    /// Second-level entry for the composite "overall" mode: the three raw
    /// variable grids of the last composite fetch. A hit needs matching
    /// month and resolution plus a viewport within the grid staleness
    /// tolerance — exactly the condition under which a slider change may
    /// recolor without any network traffic.
    pub fn composite(
        &self,
        month: u8,
        resolution: u32,
        viewport: &GeoBounds,
    ) -> Option<Rc<CompositeGrid>> {
        let slot = self.composite.borrow();
        let entry = slot.as_ref()?;
        if entry.month != month || entry.resolution != resolution {
            return None;
        }
        if viewport.moved_beyond(&entry.viewport, GRID_STALE_TOLERANCE_DEG) {
            return None;
        }
        Some(entry.data.clone())
    }

    pub fn put_composite(
        &self,
        month: u8,
        resolution: u32,
        viewport: GeoBounds,
        data: Rc<CompositeGrid>,
    ) {
        *self.composite.borrow_mut() = Some(CompositeEntry {
            month,
            resolution,
            viewport,
            data,
        });
    }

    /// Drop everything. Nothing colored is cached, so there is no derived
    /// artifact left to invalidate separately.
    pub fn clear(&self) {
        self.grids.borrow_mut().clear();
        self.regions.borrow_mut().clear();
        *self.composite.borrow_mut() = None;
    }
}
