//! Overlay construction and the capability seam to the map widget.
//!
//! The pipeline never touches the DOM; it hands complete layer batches and
//! per-region paints to a [`MapSurface`] adapter. Layer replacement is
//! atomic: the adapter swaps the old layer for the finished new one, never
//! incrementally.

use climatlas_shared::colors::{NO_DATA, REGION_ALPHA, Rgba};
use climatlas_shared::grid::{CompositeGrid, GridDataset};
use climatlas_shared::mode::{ClimateVariable, RegionStatistic};
use climatlas_shared::prefs::PreferenceProfile;
use climatlas_shared::region::{RegionDataset, RegionFeature};
use climatlas_shared::score::classify;
use climatlas_shared::GeoBounds;

use crate::api::YearlyWeather;

/// One colored grid cell, bounds already expanded to cell coverage.
#[derive(Debug, Clone, PartialEq)]
pub struct CellRect {
    pub bounds: GeoBounds,
    pub color: Rgba,
    /// The underlying raw value (heatmaps) or match score (overall), kept
    /// for tooltips.
    pub value: f64,
}

/// Style for one region polygon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionPaint {
    pub fill: Rgba,
    pub border_weight: f64,
    pub border_opacity: f64,
}

const BASE_BORDER_WEIGHT: f64 = 1.0;
const BASE_BORDER_OPACITY: f64 = 0.5;
const HOVER_BORDER_WEIGHT: f64 = 3.0;
const HOVER_BORDER_OPACITY: f64 = 0.9;
const SELECTED_BORDER_WEIGHT: f64 = 3.5;
const SELECTED_BORDER_OPACITY: f64 = 1.0;

impl RegionPaint {
    pub fn base(fill: Rgba) -> Self {
        Self {
            fill,
            border_weight: BASE_BORDER_WEIGHT,
            border_opacity: BASE_BORDER_OPACITY,
        }
    }

    pub fn hovered(self) -> Self {
        Self {
            border_weight: HOVER_BORDER_WEIGHT,
            border_opacity: HOVER_BORDER_OPACITY,
            ..self
        }
    }

    pub fn selected(self) -> Self {
        Self {
            border_weight: SELECTED_BORDER_WEIGHT,
            border_opacity: SELECTED_BORDER_OPACITY,
            ..self
        }
    }
}

/// What the map adapter must provide. Implementations must not call back
/// into the controller synchronously.
pub trait MapSurface {
    /// Replace the active grid overlay with a complete batch of cells.
    fn swap_grid_layer(&self, cells: Vec<CellRect>);
    /// Replace the active region overlay with a complete feature+paint batch.
    fn swap_region_layer(&self, regions: Vec<(RegionFeature, RegionPaint)>);
    /// Restyle a single region in place (hover/selection transitions).
    fn restyle_region(&self, index: usize, paint: RegionPaint);
    fn show_weather_panel(&self, name: &str, weather: &YearlyWeather);
    fn hide_weather_panel(&self);
}

/// Build the heatmap batch for one variable grid. No-data cells are skipped
/// entirely rather than painted gray: the basemap reads better than a gray
/// wash over oceans.
pub fn heatmap_cells(grid: &GridDataset, variable: ClimateVariable) -> Vec<CellRect> {
    let gradient = variable.gradient();
    let (rows, cols) = grid.shape();
    let mut cells = Vec::new();
    for lat_idx in 0..rows {
        for lng_idx in 0..cols {
            let Some(value) = grid.value(lat_idx, lng_idx) else {
                continue;
            };
            cells.push(CellRect {
                bounds: grid.cell_bounds(lat_idx, lng_idx),
                color: gradient.color_for(Some(value)),
                value,
            });
        }
    }
    cells
}

/// Build the composite match batch: every cell with at least one present
/// variable gets its categorical match color; cells with no variables at
/// all are skipped like no-data.
pub fn composite_cells(composite: &CompositeGrid, prefs: &PreferenceProfile) -> Vec<CellRect> {
    let (rows, cols) = composite.shape();
    let mut cells = Vec::new();
    for lat_idx in 0..rows {
        for lng_idx in 0..cols {
            let readings = composite.readings_at(lat_idx, lng_idx);
            let Some(result) = classify(&readings, prefs) else {
                continue;
            };
            cells.push(CellRect {
                bounds: composite.temp.cell_bounds(lat_idx, lng_idx),
                color: result.color(),
                value: result.score,
            });
        }
    }
    cells
}

/// Base paint for every region under the given statistic. The overall
/// statistic classifies the three mean fields against the profile; the
/// others run their gradient over the mapped field.
pub fn region_paints(
    dataset: &RegionDataset,
    statistic: RegionStatistic,
    prefs: &PreferenceProfile,
) -> Vec<RegionPaint> {
    dataset
        .features
        .iter()
        .map(|feature| {
            let fill = region_fill(&feature.properties, statistic, prefs);
            RegionPaint::base(fill)
        })
        .collect()
}

fn region_fill(
    props: &climatlas_shared::region::RegionProperties,
    statistic: RegionStatistic,
    prefs: &PreferenceProfile,
) -> Rgba {
    match statistic.gradient() {
        Some(gradient) => {
            let value = statistic.field_value(props);
            let mut fill = gradient.color_for(value);
            if value.is_some() {
                fill.a = REGION_ALPHA;
            }
            fill
        }
        None => match classify(&props.readings(), prefs) {
            Some(result) => result.color(),
            None => NO_DATA,
        },
    }
}

/// What a click did, so the caller can drive the weather panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionChange {
    Selected(usize),
    Deselected,
}

/// Hover/selection state for the active region layer. At most one region is
/// selected; hovering never overrides the selected style.
#[derive(Default)]
pub struct RegionInteraction {
    base: Vec<RegionPaint>,
    hovered: Option<usize>,
    selected: Option<usize>,
}

impl RegionInteraction {
    pub fn new(base: Vec<RegionPaint>) -> Self {
        Self {
            base,
            hovered: None,
            selected: None,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn hover(&mut self, index: Option<usize>, surface: &dyn MapSurface) {
        if self.hovered == index {
            return;
        }
        if let Some(previous) = self.hovered
            && self.selected != Some(previous)
            && let Some(paint) = self.base.get(previous)
        {
            surface.restyle_region(previous, *paint);
        }
        if let Some(current) = index
            && self.selected != Some(current)
            && let Some(paint) = self.base.get(current)
        {
            surface.restyle_region(current, paint.hovered());
        }
        self.hovered = index;
    }

    /// Toggle selection. A second click on the selected region deselects;
    /// selecting a different region fully resets the previous one first.
    pub fn click(&mut self, index: usize, surface: &dyn MapSurface) -> Option<SelectionChange> {
        let paint = *self.base.get(index)?;
        if self.selected == Some(index) {
            self.selected = None;
            let restored = if self.hovered == Some(index) {
                paint.hovered()
            } else {
                paint
            };
            surface.restyle_region(index, restored);
            return Some(SelectionChange::Deselected);
        }
        if let Some(previous) = self.selected
            && let Some(previous_paint) = self.base.get(previous)
        {
            surface.restyle_region(previous, *previous_paint);
        }
        self.selected = Some(index);
        surface.restyle_region(index, paint.selected());
        Some(SelectionChange::Selected(index))
    }
}
