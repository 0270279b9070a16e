//! Test doubles for the network, scheduler, and map seams.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::future::LocalBoxFuture;
use futures::task::noop_waker;

use climatlas_shared::geo::GeoBounds;
use climatlas_shared::grid::GridDataset;
use climatlas_shared::mode::ApiVariable;
use climatlas_shared::region::{Geometry, RegionDataset, RegionFeature, RegionProperties};
use climatlas_shared::resolution::Granularity;

use climatlas_shared::prefs::PreferenceProfile;

use crate::api::{ClimateApi, FetchError, YearlyWeather};
use crate::overlay::{CellRect, MapSurface, RegionPaint};
use crate::schedule::{Scheduler, TaskHandle};
use crate::settings::PreferenceStore;

/// Scripted `ClimateApi`. Every response resolves immediately; grids are a
/// fixed 2x2 shape filled with the configured per-variable value.
pub struct MockApi {
    values: RefCell<HashMap<ApiVariable, Option<f64>>>,
    failures: RefCell<HashMap<ApiVariable, String>>,
    pub grid_calls: Cell<usize>,
    pub combined_calls: Cell<usize>,
    pub yearly_calls: Cell<usize>,
    /// Fired at the start of every grid request; lets a test mutate
    /// controller state "while the fetch is in flight".
    pub on_request: RefCell<Option<Box<dyn Fn()>>>,
    combined_gate: RefCell<Option<Rc<Cell<bool>>>>,
}

/// Resolves once its gate flag flips to open. Polled manually by
/// [`ManualScheduler::drive`].
struct GateWait(Rc<Cell<bool>>);

impl Future for GateWait {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.0.get() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            values: RefCell::new(HashMap::new()),
            failures: RefCell::new(HashMap::new()),
            grid_calls: Cell::new(0),
            combined_calls: Cell::new(0),
            yearly_calls: Cell::new(0),
            on_request: RefCell::new(None),
            combined_gate: RefCell::new(None),
        }
    }

    /// Park subsequent `combined` responses until the returned gate is set,
    /// keeping the fetch "in flight" across other controller activity.
    pub fn hold_combined(&self) -> Rc<Cell<bool>> {
        let gate = Rc::new(Cell::new(false));
        *self.combined_gate.borrow_mut() = Some(gate.clone());
        gate
    }

    pub fn set_grid_value(&self, variable: ApiVariable, value: Option<f64>) {
        self.values.borrow_mut().insert(variable, value);
    }

    pub fn fail_variable(&self, variable: ApiVariable, message: &str) {
        self.failures
            .borrow_mut()
            .insert(variable, message.to_string());
    }

    fn grid_response(&self, variable: ApiVariable) -> Result<GridDataset, FetchError> {
        if let Some(message) = self.failures.borrow().get(&variable) {
            return Err(FetchError::Server(message.clone()));
        }
        let value = self
            .values
            .borrow()
            .get(&variable)
            .copied()
            .unwrap_or(Some(0.0));
        Ok(GridDataset {
            lats: vec![52.0, 51.0],
            lngs: vec![4.0, 5.0],
            values: vec![vec![value, value], vec![value, value]],
        })
    }
}

fn mock_feature(name: &str, temp: f64, ring: Vec<[f64; 2]>) -> RegionFeature {
    RegionFeature {
        properties: RegionProperties {
            name: name.to_string(),
            temp_avg: Some(temp),
            prec_mean: Some(2.0),
            sunhours_mean: Some(8.0),
            ..RegionProperties::default()
        },
        geometry: Geometry::Polygon(vec![ring]),
    }
}

impl ClimateApi for MockApi {
    fn grid(
        &self,
        variable: ApiVariable,
        _month: u8,
        _bounds: GeoBounds,
        _resolution: u32,
    ) -> LocalBoxFuture<'_, Result<GridDataset, FetchError>> {
        self.grid_calls.set(self.grid_calls.get() + 1);
        if let Some(hook) = self.on_request.borrow().as_ref() {
            hook();
        }
        let response = self.grid_response(variable);
        Box::pin(async move { response })
    }

    fn combined(
        &self,
        _month: u8,
        _granularity: Granularity,
        _bounds: Option<GeoBounds>,
    ) -> LocalBoxFuture<'_, Result<RegionDataset, FetchError>> {
        self.combined_calls.set(self.combined_calls.get() + 1);
        if let Some(hook) = self.on_request.borrow().as_ref() {
            hook();
        }
        let dataset = RegionDataset {
            features: vec![
                mock_feature("Atlantis", 21.0, vec![[4.0, 52.0], [5.0, 52.0], [5.0, 51.0]]),
                mock_feature("Borealia", 3.0, vec![[6.0, 54.0], [7.0, 54.0], [7.0, 53.0]]),
            ],
        };
        let gate = self.combined_gate.borrow().clone();
        Box::pin(async move {
            if let Some(gate) = gate {
                GateWait(gate).await;
            }
            Ok(dataset)
        })
    }

    fn weather_yearly(
        &self,
        _lat: f64,
        _lng: f64,
    ) -> LocalBoxFuture<'_, Result<YearlyWeather, FetchError>> {
        self.yearly_calls.set(self.yearly_calls.get() + 1);
        let weather = YearlyWeather {
            tmin: vec![Some(2.0); 12],
            tmax: vec![Some(12.0); 12],
            prec: vec![Some(1.5); 12],
            sunhours: vec![Some(6.0); 12],
        };
        Box::pin(async move { Ok(weather) })
    }
}

struct ManualTask {
    delay_ms: u32,
    callback: Box<dyn FnOnce()>,
    cancelled: Rc<Cell<bool>>,
}

/// Deterministic scheduler: delayed tasks queue until `fire_all`; spawned
/// futures are polled eagerly and park until `drive` when they block (on a
/// [`MockApi`] gate, for instance).
#[derive(Default)]
pub struct ManualScheduler {
    tasks: RefCell<Vec<ManualTask>>,
    parked: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued tasks, cancelled ones included.
    pub fn queued(&self) -> usize {
        self.tasks.borrow().len()
    }

    pub fn last_delay(&self) -> Option<u32> {
        self.tasks.borrow().last().map(|task| task.delay_ms)
    }

    /// Run every queued, non-cancelled task. Tasks queued by the callbacks
    /// themselves stay queued for the next call.
    pub fn fire_all(&self) {
        let batch: Vec<ManualTask> = self.tasks.borrow_mut().drain(..).collect();
        for task in batch {
            if !task.cancelled.get() {
                (task.callback)();
            }
        }
    }

    /// Re-poll every parked future once, keeping the still-pending ones.
    pub fn drive(&self) {
        let mut batch: Vec<_> = self.parked.borrow_mut().drain(..).collect();
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        batch.retain_mut(|future| future.as_mut().poll(&mut cx).is_pending());
        self.parked.borrow_mut().extend(batch);
    }
}

impl Scheduler for ManualScheduler {
    fn delay(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) -> TaskHandle {
        let cancelled = Rc::new(Cell::new(false));
        self.tasks.borrow_mut().push(ManualTask {
            delay_ms,
            callback,
            cancelled: cancelled.clone(),
        });
        TaskHandle::new(move || cancelled.set(true))
    }

    fn spawn(&self, mut future: LocalBoxFuture<'static, ()>) {
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);
        if future.as_mut().poll(&mut cx).is_pending() {
            self.parked.borrow_mut().push(future);
        }
    }
}

/// In-memory `PreferenceStore`.
#[derive(Default)]
pub struct MemoryStore {
    pub saved: RefCell<Option<PreferenceProfile>>,
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> PreferenceProfile {
        self.saved.borrow().clone().unwrap_or_default()
    }

    fn save(&self, prefs: &PreferenceProfile) {
        *self.saved.borrow_mut() = Some(prefs.clone());
    }
}

/// `MapSurface` that records every call for later assertions.
#[derive(Default)]
pub struct RecordingSurface {
    pub grid_swaps: RefCell<Vec<Vec<CellRect>>>,
    pub region_swaps: RefCell<Vec<Vec<(RegionFeature, RegionPaint)>>>,
    pub restyles: RefCell<Vec<(usize, RegionPaint)>>,
    /// Name shown in the weather panel, `None` after hide.
    pub panel: RefCell<Option<String>>,
}

impl RecordingSurface {
    pub fn last_restyle(&self) -> Option<(usize, RegionPaint)> {
        self.restyles.borrow().last().copied()
    }

    pub fn last_grid_swap(&self) -> Option<Vec<CellRect>> {
        self.grid_swaps.borrow().last().cloned()
    }
}

impl MapSurface for RecordingSurface {
    fn swap_grid_layer(&self, cells: Vec<CellRect>) {
        self.grid_swaps.borrow_mut().push(cells);
    }

    fn swap_region_layer(&self, regions: Vec<(RegionFeature, RegionPaint)>) {
        self.region_swaps.borrow_mut().push(regions);
    }

    fn restyle_region(&self, index: usize, paint: RegionPaint) {
        self.restyles.borrow_mut().push((index, paint));
    }

    fn show_weather_panel(&self, name: &str, _weather: &YearlyWeather) {
        *self.panel.borrow_mut() = Some(name.to_string());
    }

    fn hide_weather_panel(&self) {
        *self.panel.borrow_mut() = None;
    }
}
