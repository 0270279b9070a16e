//! Fetch coordination: at most one live fetch generation per overlay
//! refresh. Starting a new generation cancels everything older; a cancelled
//! fetch resolves to `FetchError::Cancelled`, which callers drop silently.

use std::cell::Cell;
use std::rc::Rc;

use climatlas_shared::geo::GeoBounds;
use climatlas_shared::grid::{CompositeGrid, GridDataset, average_grids};
use climatlas_shared::mode::{ApiVariable, ClimateVariable};
use climatlas_shared::region::RegionDataset;
use climatlas_shared::resolution::Granularity;

use crate::api::{ClimateApi, FetchError};

/// Identifies one fetch generation. Stale tickets turn results into
/// cancellations at every await point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
}

pub struct FetchCoordinator {
    api: Rc<dyn ClimateApi>,
    generation: Cell<u64>,
}

impl FetchCoordinator {
    pub fn new(api: Rc<dyn ClimateApi>) -> Self {
        Self {
            api,
            generation: Cell::new(0),
        }
    }

    /// Start a new fetch generation, cooperatively cancelling any older
    /// in-flight fetch for the overlay.
    pub fn begin(&self) -> FetchTicket {
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        FetchTicket { generation }
    }

    pub fn is_current(&self, ticket: FetchTicket) -> bool {
        self.generation.get() == ticket.generation
    }

    fn ensure_current(&self, ticket: FetchTicket) -> Result<(), FetchError> {
        if self.is_current(ticket) {
            Ok(())
        } else {
            Err(FetchError::Cancelled)
        }
    }

    /// Fetch one display variable's grid. Temperature is the mean of a
    /// concurrent tmin+tmax pair; the other variables map to one endpoint
    /// call each.
    pub async fn fetch_variable(
        &self,
        ticket: FetchTicket,
        variable: ClimateVariable,
        month: u8,
        bounds: GeoBounds,
        resolution: u32,
    ) -> Result<GridDataset, FetchError> {
        let grid = match variable {
            ClimateVariable::Temperature => {
                let (tmin, tmax) = futures::try_join!(
                    self.api.grid(ApiVariable::Tmin, month, bounds, resolution),
                    self.api.grid(ApiVariable::Tmax, month, bounds, resolution),
                )?;
                average_grids(&tmin, &tmax).map_err(|e| FetchError::Server(e.to_string()))?
            }
            ClimateVariable::Precipitation => {
                self.api
                    .grid(ApiVariable::Prec, month, bounds, resolution)
                    .await?
            }
            ClimateVariable::Sunshine => {
                self.api
                    .grid(ApiVariable::Sunhours, month, bounds, resolution)
                    .await?
            }
        };
        self.ensure_current(ticket)?;
        Ok(grid)
    }

    /// Fetch the composite "overall" inputs: all three variables
    /// concurrently, joined before rendering. Any sub-fetch failure fails
    /// the composite as a whole.
    pub async fn fetch_composite(
        &self,
        ticket: FetchTicket,
        month: u8,
        bounds: GeoBounds,
        resolution: u32,
    ) -> Result<CompositeGrid, FetchError> {
        let (temp, prec, sun) = futures::try_join!(
            self.fetch_variable(ticket, ClimateVariable::Temperature, month, bounds, resolution),
            self.fetch_variable(
                ticket,
                ClimateVariable::Precipitation,
                month,
                bounds,
                resolution
            ),
            self.fetch_variable(ticket, ClimateVariable::Sunshine, month, bounds, resolution),
        )?;
        self.ensure_current(ticket)?;
        CompositeGrid::new(temp, prec, sun).map_err(|e| FetchError::Server(e.to_string()))
    }

    pub async fn fetch_regions(
        &self,
        ticket: FetchTicket,
        month: u8,
        granularity: Granularity,
        bounds: Option<GeoBounds>,
    ) -> Result<RegionDataset, FetchError> {
        let dataset = self.api.combined(month, granularity, bounds).await?;
        self.ensure_current(ticket)?;
        Ok(dataset)
    }
}
