//! The refresh state machine. Owns the visualization state; UI event
//! handlers only mutate state and schedule, and only refresh cycles touch
//! the caches or the overlay.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use climatlas_shared::geo::Viewport;
use climatlas_shared::mode::{ClimateVariable, DisplayMode, RegionStatistic};
use climatlas_shared::prefs::PreferenceProfile;
use climatlas_shared::region::RegionDataset;
use climatlas_shared::resolution::{self, Granularity};
use climatlas_shared::units::TempUnit;

use crate::api::{ClimateApi, FetchError};
use crate::cache::{DataCache, GridKey, RegionKey};
use crate::fetch::{FetchCoordinator, FetchTicket};
use crate::logging;
use crate::overlay::{self, MapSurface, RegionInteraction, SelectionChange};
use crate::schedule::{Scheduler, TaskHandle};
use crate::settings::PreferenceStore;

/// Map navigation settles slower than a slider drag, so it gets the longer
/// coalescing window.
pub const MAP_DEBOUNCE_MS: u32 = 300;
pub const SLIDER_DEBOUNCE_MS: u32 = 150;

/// Province fetches pad the viewport so small pans stay cache hits.
pub const PROVINCE_FETCH_PAD_DEG: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    PendingRefresh,
    Fetching,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    MapMoved,
    SliderChanged,
    MonthChanged,
    ModeChanged,
    CacheCleared,
}

impl RefreshTrigger {
    fn debounce_ms(self) -> u32 {
        match self {
            RefreshTrigger::MapMoved => MAP_DEBOUNCE_MS,
            RefreshTrigger::SliderChanged => SLIDER_DEBOUNCE_MS,
            RefreshTrigger::MonthChanged
            | RefreshTrigger::ModeChanged
            | RefreshTrigger::CacheCleared => 0,
        }
    }
}

enum RefreshOutcome {
    /// Overlay swapped.
    Applied,
    /// A newer generation cancelled this cycle; it owns the state machine now.
    Superseded,
    /// Result discarded because the viewport moved past tolerance while the
    /// fetch was in flight; a fresh cycle gets scheduled.
    Stale,
}

struct ControllerState {
    viewport: Viewport,
    month: u8,
    mode: DisplayMode,
    prefs: PreferenceProfile,
    refresh: RefreshState,
    region_data: Option<Rc<RegionDataset>>,
    interaction: RegionInteraction,
}

pub struct ViewportController {
    state: RefCell<ControllerState>,
    cache: DataCache,
    coordinator: FetchCoordinator,
    api: Rc<dyn ClimateApi>,
    surface: Rc<dyn MapSurface>,
    scheduler: Rc<dyn Scheduler>,
    store: Rc<dyn PreferenceStore>,
    /// Handle of the scheduled-but-unfired refresh, if any. Replacing it
    /// cancels the previous one, which is how event bursts coalesce.
    pending: RefCell<Option<TaskHandle>>,
    /// Supersession nonce for the weather-detail lookup; selecting another
    /// region invalidates the previous lookup's response.
    detail_nonce: Cell<u64>,
}

impl ViewportController {
    pub fn new(
        api: Rc<dyn ClimateApi>,
        surface: Rc<dyn MapSurface>,
        scheduler: Rc<dyn Scheduler>,
        store: Rc<dyn PreferenceStore>,
        viewport: Viewport,
        month: u8,
        mode: DisplayMode,
    ) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(ControllerState {
                viewport,
                month,
                mode,
                prefs: store.load(),
                refresh: RefreshState::Idle,
                region_data: None,
                interaction: RegionInteraction::default(),
            }),
            cache: DataCache::new(),
            coordinator: FetchCoordinator::new(api.clone()),
            api,
            surface,
            scheduler,
            store,
            pending: RefCell::new(None),
            detail_nonce: Cell::new(0),
        })
    }

    pub fn refresh_state(&self) -> RefreshState {
        self.state.borrow().refresh
    }

    pub fn preferences(&self) -> PreferenceProfile {
        self.state.borrow().prefs.clone()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.state.borrow().mode
    }

    // --- UI event handlers: state + schedule only, never the overlay. ---

    pub fn on_map_moved(self: &Rc<Self>, viewport: Viewport) {
        self.state.borrow_mut().viewport = viewport;
        self.schedule_refresh(RefreshTrigger::MapMoved);
    }

    pub fn on_month_changed(self: &Rc<Self>, month: u8) {
        self.state.borrow_mut().month = month;
        self.schedule_refresh(RefreshTrigger::MonthChanged);
    }

    pub fn on_mode_changed(self: &Rc<Self>, mode: DisplayMode) {
        self.state.borrow_mut().mode = mode;
        self.schedule_refresh(RefreshTrigger::ModeChanged);
    }

    pub fn on_preferences_changed(self: &Rc<Self>, prefs: PreferenceProfile) {
        self.store.save(&prefs);
        self.state.borrow_mut().prefs = prefs;
        self.schedule_refresh(RefreshTrigger::SliderChanged);
    }

    pub fn on_unit_toggled(self: &Rc<Self>, unit: TempUnit) {
        {
            let mut state = self.state.borrow_mut();
            state.prefs.set_unit(unit);
            self.store.save(&state.prefs);
        }
        self.schedule_refresh(RefreshTrigger::SliderChanged);
    }

    /// Manual "clear cache": drops every cached dataset, then rebuilds the
    /// overlay from a fresh fetch.
    pub fn clear_cache(self: &Rc<Self>) {
        self.cache.clear();
        self.schedule_refresh(RefreshTrigger::CacheCleared);
    }

    /// Schedule a debounced refresh, cancelling any scheduled-but-unfired
    /// one so bursts of events collapse into a single cycle.
    pub fn schedule_refresh(self: &Rc<Self>, trigger: RefreshTrigger) {
        self.state.borrow_mut().refresh = RefreshState::PendingRefresh;
        let controller = self.clone();
        let handle = self.scheduler.delay(
            trigger.debounce_ms(),
            Box::new(move || {
                // Fired: its handle no longer guards anything.
                controller.pending.borrow_mut().take();
                let cycle = controller.clone();
                controller
                    .scheduler
                    .spawn(Box::pin(async move { cycle.run_refresh().await }));
            }),
        );
        *self.pending.borrow_mut() = Some(handle);
    }

    async fn run_refresh(self: Rc<Self>) {
        let (viewport, month, mode, prefs) = {
            let mut state = self.state.borrow_mut();
            state.refresh = RefreshState::Fetching;
            (state.viewport, state.month, state.mode, state.prefs.clone())
        };

        // Every cycle claims the generation up front, cache-served cycles
        // included: an in-flight fetch from an earlier cycle goes stale the
        // moment a newer overlay is about to apply, whatever its source.
        let ticket = self.coordinator.begin();

        let outcome = match mode {
            DisplayMode::Overall => self.refresh_overall(ticket, viewport, month).await,
            DisplayMode::Heatmap(variable) => {
                self.refresh_heatmap(ticket, variable, viewport, month).await
            }
            DisplayMode::Regions(statistic) => {
                self.refresh_regions(ticket, statistic, viewport, month, &prefs)
                    .await
            }
        };

        match outcome {
            Ok(RefreshOutcome::Applied) => {
                self.state.borrow_mut().refresh = RefreshState::Idle;
            }
            Ok(RefreshOutcome::Superseded) => {
                // The newer cycle drives the state machine from here.
            }
            Ok(RefreshOutcome::Stale) => {
                self.state.borrow_mut().refresh = RefreshState::Idle;
                self.schedule_refresh(RefreshTrigger::MapMoved);
            }
            Err(error) => {
                // Previous overlay stays up; no partial render, no user-facing error.
                logging::warn(&format!("overlay refresh failed: {error}"));
                self.state.borrow_mut().refresh = RefreshState::Idle;
            }
        }
    }

    async fn refresh_overall(
        &self,
        ticket: FetchTicket,
        viewport: Viewport,
        month: u8,
    ) -> Result<RefreshOutcome, FetchError> {
        let resolution = resolution::sample_resolution(viewport.zoom);

        // Fast path: unchanged viewport + cached raw grids means a slider
        // change is a pure recolor. This is the central performance
        // guarantee — dragging a preference slider never refetches.
        if let Some(composite) = self.cache.composite(month, resolution, &viewport.bounds) {
            let prefs = self.state.borrow().prefs.clone();
            self.surface
                .swap_grid_layer(overlay::composite_cells(&composite, &prefs));
            return Ok(RefreshOutcome::Applied);
        }

        let composite = match self
            .coordinator
            .fetch_composite(ticket, month, viewport.bounds, resolution)
            .await
        {
            Ok(composite) => composite,
            Err(FetchError::Cancelled) => return Ok(RefreshOutcome::Superseded),
            Err(error) => return Err(error),
        };

        let current = self.state.borrow().viewport;
        if current
            .bounds
            .moved_beyond(&viewport.bounds, DisplayMode::Overall.staleness_tolerance())
        {
            return Ok(RefreshOutcome::Stale);
        }

        let composite = Rc::new(composite);
        self.cache
            .put_composite(month, resolution, viewport.bounds, composite.clone());
        let prefs = self.state.borrow().prefs.clone();
        self.surface
            .swap_grid_layer(overlay::composite_cells(&composite, &prefs));
        Ok(RefreshOutcome::Applied)
    }

    async fn refresh_heatmap(
        &self,
        ticket: FetchTicket,
        variable: ClimateVariable,
        viewport: Viewport,
        month: u8,
    ) -> Result<RefreshOutcome, FetchError> {
        let resolution = resolution::sample_resolution(viewport.zoom);
        let key = GridKey {
            variable,
            month,
            resolution,
            bounds: viewport.bounds.quantized(),
        };

        if let Some(grid) = self.cache.grid(&key) {
            self.surface
                .swap_grid_layer(overlay::heatmap_cells(&grid, variable));
            return Ok(RefreshOutcome::Applied);
        }

        let grid = match self
            .coordinator
            .fetch_variable(ticket, variable, month, viewport.bounds, resolution)
            .await
        {
            Ok(grid) => grid,
            Err(FetchError::Cancelled) => return Ok(RefreshOutcome::Superseded),
            Err(error) => return Err(error),
        };

        let current = self.state.borrow().viewport;
        let tolerance = DisplayMode::Heatmap(variable).staleness_tolerance();
        if current.bounds.moved_beyond(&viewport.bounds, tolerance) {
            return Ok(RefreshOutcome::Stale);
        }

        let grid = Rc::new(grid);
        self.cache.put_grid(key, grid.clone());
        self.surface
            .swap_grid_layer(overlay::heatmap_cells(&grid, variable));
        Ok(RefreshOutcome::Applied)
    }

    async fn refresh_regions(
        &self,
        ticket: FetchTicket,
        statistic: RegionStatistic,
        viewport: Viewport,
        month: u8,
        prefs: &PreferenceProfile,
    ) -> Result<RefreshOutcome, FetchError> {
        let granularity = resolution::granularity(viewport.zoom);
        let key = RegionKey { month, granularity };

        if let Some(dataset) = self.cache.region(&key, &viewport.bounds) {
            self.apply_regions(dataset, statistic, prefs);
            return Ok(RefreshOutcome::Applied);
        }

        // Country data is world-wide; province payloads stay bounded by
        // fetching the padded viewport only.
        let (fetch_bounds, coverage) = match granularity {
            Granularity::Country => (None, None),
            Granularity::Province => {
                let padded = viewport.bounds.padded(PROVINCE_FETCH_PAD_DEG);
                (Some(padded), Some(padded))
            }
        };

        let dataset = match self
            .coordinator
            .fetch_regions(ticket, month, granularity, fetch_bounds)
            .await
        {
            Ok(dataset) => dataset,
            Err(FetchError::Cancelled) => return Ok(RefreshOutcome::Superseded),
            Err(error) => return Err(error),
        };

        let current = self.state.borrow().viewport;
        let tolerance = DisplayMode::Regions(statistic).staleness_tolerance();
        if current.bounds.moved_beyond(&viewport.bounds, tolerance) {
            return Ok(RefreshOutcome::Stale);
        }

        let dataset = Rc::new(dataset);
        self.cache.put_region(key, dataset.clone(), coverage);
        let prefs = self.state.borrow().prefs.clone();
        self.apply_regions(dataset, statistic, &prefs);
        Ok(RefreshOutcome::Applied)
    }

    fn apply_regions(
        &self,
        dataset: Rc<RegionDataset>,
        statistic: RegionStatistic,
        prefs: &PreferenceProfile,
    ) {
        let paints = overlay::region_paints(&dataset, statistic, prefs);
        let batch: Vec<_> = dataset
            .features
            .iter()
            .cloned()
            .zip(paints.iter().copied())
            .collect();
        {
            let mut state = self.state.borrow_mut();
            state.interaction = RegionInteraction::new(paints);
            state.region_data = Some(dataset);
        }
        // Replacing the layer resets any selection with it.
        self.surface.swap_region_layer(batch);
        self.surface.hide_weather_panel();
    }

    // --- Region interaction, driven by the map adapter. ---

    pub fn on_region_hovered(&self, index: Option<usize>) {
        self.state
            .borrow_mut()
            .interaction
            .hover(index, &*self.surface);
    }

    pub fn on_region_clicked(self: &Rc<Self>, index: usize) {
        let change = {
            let mut state = self.state.borrow_mut();
            state.interaction.click(index, &*self.surface)
        };
        match change {
            None => {}
            Some(SelectionChange::Deselected) => self.surface.hide_weather_panel(),
            Some(SelectionChange::Selected(index)) => self.lookup_region_weather(index),
        }
    }

    /// Fetch the selected region's twelve-month weather at its centroid and
    /// show the detail panel, unless superseded or deselected meanwhile.
    fn lookup_region_weather(self: &Rc<Self>, index: usize) {
        let (name, centroid) = {
            let state = self.state.borrow();
            let Some(dataset) = &state.region_data else {
                return;
            };
            let Some(feature) = dataset.features.get(index) else {
                return;
            };
            (feature.properties.name.clone(), feature.centroid())
        };
        let Some((lat, lng)) = centroid else {
            return;
        };

        let nonce = self.detail_nonce.get() + 1;
        self.detail_nonce.set(nonce);

        let controller = self.clone();
        self.scheduler.spawn(Box::pin(async move {
            match controller.api.weather_yearly(lat, lng).await {
                Ok(weather) => {
                    if controller.detail_nonce.get() != nonce {
                        return;
                    }
                    if controller.state.borrow().interaction.selected() != Some(index) {
                        return;
                    }
                    controller.surface.show_weather_panel(&name, &weather);
                }
                Err(error) => {
                    if controller.detail_nonce.get() != nonce {
                        return;
                    }
                    logging::warn(&format!("weather lookup failed: {error}"));
                }
            }
        }));
    }
}
