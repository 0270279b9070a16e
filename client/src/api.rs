//! Climate API client: query builders, response envelopes, and the
//! `ClimateApi` seam the pipeline fetches through.

use std::fmt;

use futures::future::LocalBoxFuture;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use climatlas_shared::geo::GeoBounds;
use climatlas_shared::grid::GridDataset;
use climatlas_shared::mode::{ApiVariable, RegionStatistic};
use climatlas_shared::region::RegionDataset;
use climatlas_shared::resolution::Granularity;

/// Why a fetch produced no dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Superseded by a newer fetch. Dropped silently, never surfaced.
    Cancelled,
    /// Network failure, non-2xx status, or malformed JSON.
    Transport(String),
    /// The server answered with an `{error}` payload.
    Server(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Cancelled => write!(f, "superseded"),
            FetchError::Transport(message) => write!(f, "{message}"),
            FetchError::Server(message) => write!(f, "server error: {message}"),
        }
    }
}

impl std::error::Error for FetchError {}

pub fn build_grid_query(
    variable: ApiVariable,
    month: u8,
    bounds: &GeoBounds,
    resolution: u32,
) -> String {
    format!(
        "variable={}&month={}&north={}&south={}&east={}&west={}&resolution={}",
        variable.as_str(),
        month,
        bounds.north,
        bounds.south,
        bounds.east,
        bounds.west,
        resolution
    )
}

pub fn build_combined_query(month: u8, granularity: Granularity, bounds: Option<&GeoBounds>) -> String {
    let mut query = format!("month={}&layer={}", month, granularity.layer_name());
    if let Some(bounds) = bounds {
        query.push_str(&format!(
            "&north={}&south={}&east={}&west={}",
            bounds.north, bounds.south, bounds.east, bounds.west
        ));
    }
    query
}

/// Query for the single-statistic region endpoints (`/api/countries`,
/// `/api/provinces`). The pipeline itself fetches through `/api/combined`;
/// these remain part of the consumed surface.
pub fn build_region_query(month: u8, statistic: RegionStatistic, bounds: &GeoBounds) -> String {
    format!(
        "month={}&variable={}&north={}&south={}&east={}&west={}",
        month,
        statistic.api_name(),
        bounds.north,
        bounds.south,
        bounds.east,
        bounds.west
    )
}

pub fn build_yearly_query(lat: f64, lng: f64) -> String {
    format!("lat={lat}&lng={lng}")
}

/// Twelve monthly values per variable for one location, nulls where the
/// source rasters have no coverage.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct YearlyWeather {
    pub tmin: Vec<Option<f64>>,
    pub tmax: Vec<Option<f64>>,
    pub prec: Vec<Option<f64>>,
    pub sunhours: Vec<Option<f64>>,
}

/// `/api/regions` availability probe.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct RegionsInfo {
    pub variables: Vec<String>,
    pub message: Option<String>,
}

// Every endpoint may answer `{error: string}` with a 200; envelopes make
// that case explicit before the payload is trusted.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GridEnvelope {
    grid: Option<GridDataset>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CombinedEnvelope {
    data: Option<RegionDataset>,
    error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct YearlyEnvelope {
    data: Option<YearlyWeather>,
    error: Option<String>,
}

fn grid_from_envelope(envelope: GridEnvelope) -> Result<GridDataset, FetchError> {
    if let Some(error) = envelope.error {
        return Err(FetchError::Server(error));
    }
    let grid = envelope
        .grid
        .ok_or_else(|| FetchError::Server("missing grid payload".to_string()))?;
    grid.validate()
        .map_err(|e| FetchError::Server(e.to_string()))?;
    Ok(grid)
}

fn regions_from_envelope(envelope: CombinedEnvelope) -> Result<RegionDataset, FetchError> {
    if let Some(error) = envelope.error {
        return Err(FetchError::Server(error));
    }
    envelope
        .data
        .ok_or_else(|| FetchError::Server("missing region payload".to_string()))
}

fn yearly_from_envelope(envelope: YearlyEnvelope) -> Result<YearlyWeather, FetchError> {
    if let Some(error) = envelope.error {
        return Err(FetchError::Server(error));
    }
    envelope
        .data
        .ok_or_else(|| FetchError::Server("missing weather payload".to_string()))
}

/// The network seam. The browser implementation is [`HttpApi`]; tests drive
/// the pipeline through a mock.
pub trait ClimateApi {
    fn grid(
        &self,
        variable: ApiVariable,
        month: u8,
        bounds: GeoBounds,
        resolution: u32,
    ) -> LocalBoxFuture<'_, Result<GridDataset, FetchError>>;

    fn combined(
        &self,
        month: u8,
        granularity: Granularity,
        bounds: Option<GeoBounds>,
    ) -> LocalBoxFuture<'_, Result<RegionDataset, FetchError>>;

    fn weather_yearly(
        &self,
        lat: f64,
        lng: f64,
    ) -> LocalBoxFuture<'_, Result<YearlyWeather, FetchError>>;
}

/// gloo-net backed implementation against the climate statistics server.
#[derive(Debug, Default)]
pub struct HttpApi;

async fn get_json<T: DeserializeOwned>(url: &str) -> Result<T, FetchError> {
    let response = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| FetchError::Transport(format!("fetch error: {e}")))?;
    if !response.ok() {
        return Err(FetchError::Transport(format!("HTTP {}", response.status())));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| FetchError::Transport(format!("parse error: {e}")))
}

impl HttpApi {
    /// `/api/regions` availability probe. Not part of a refresh cycle; kept
    /// as the documented endpoint contract for a UI-level capability check,
    /// like [`build_region_query`] for the single-statistic endpoints.
    pub async fn regions_info(&self) -> Result<RegionsInfo, FetchError> {
        get_json("/api/regions").await
    }
}

impl ClimateApi for HttpApi {
    fn grid(
        &self,
        variable: ApiVariable,
        month: u8,
        bounds: GeoBounds,
        resolution: u32,
    ) -> LocalBoxFuture<'_, Result<GridDataset, FetchError>> {
        Box::pin(async move {
            let url = format!(
                "/api/grid?{}",
                build_grid_query(variable, month, &bounds, resolution)
            );
            grid_from_envelope(get_json(&url).await?)
        })
    }

    fn combined(
        &self,
        month: u8,
        granularity: Granularity,
        bounds: Option<GeoBounds>,
    ) -> LocalBoxFuture<'_, Result<RegionDataset, FetchError>> {
        Box::pin(async move {
            let url = format!(
                "/api/combined?{}",
                build_combined_query(month, granularity, bounds.as_ref())
            );
            regions_from_envelope(get_json(&url).await?)
        })
    }

    fn weather_yearly(
        &self,
        lat: f64,
        lng: f64,
    ) -> LocalBoxFuture<'_, Result<YearlyWeather, FetchError>> {
        Box::pin(async move {
            let url = format!("/api/weather/yearly?{}", build_yearly_query(lat, lng));
            yearly_from_envelope(get_json(&url).await?)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds() -> GeoBounds {
        GeoBounds {
            north: 53.5,
            south: 50.75,
            east: 7.25,
            west: 3.25,
        }
    }

    #[test]
    fn grid_query_includes_all_parameters() {
        let query = build_grid_query(ApiVariable::Prec, 7, &bounds(), 50);
        assert_eq!(
            query,
            "variable=prec&month=7&north=53.5&south=50.75&east=7.25&west=3.25&resolution=50"
        );
    }

    #[test]
    fn combined_query_omits_bounds_for_worldwide_fetches() {
        assert_eq!(
            build_combined_query(3, Granularity::Country, None),
            "month=3&layer=countries"
        );
        let query = build_combined_query(3, Granularity::Province, Some(&bounds()));
        assert!(query.starts_with("month=3&layer=provinces&north=53.5"));
    }

    #[test]
    fn region_query_uses_statistic_api_name() {
        let query = build_region_query(12, RegionStatistic::Overall, &bounds());
        assert!(query.starts_with("month=12&variable=overall&"));
    }

    #[test]
    fn grid_envelope_with_error_maps_to_server_error() {
        let envelope: GridEnvelope =
            serde_json::from_str(r#"{"error": "Month must be between 1 and 12"}"#).unwrap();
        assert_eq!(
            grid_from_envelope(envelope),
            Err(FetchError::Server("Month must be between 1 and 12".into()))
        );
    }

    #[test]
    fn grid_envelope_with_payload_decodes_and_validates() {
        let envelope: GridEnvelope = serde_json::from_str(
            r#"{"grid": {"lats": [52.0, 51.0], "lngs": [4.0, 5.0],
                "values": [[1.5, null], [null, 2.5]]}}"#,
        )
        .unwrap();
        let grid = grid_from_envelope(envelope).unwrap();
        assert_eq!(grid.value(0, 0), Some(1.5));
        assert_eq!(grid.value(0, 1), None);
    }

    #[test]
    fn malformed_grid_payload_is_a_server_error() {
        // Axes out of order: the payload parsed but violates the invariant.
        let envelope: GridEnvelope = serde_json::from_str(
            r#"{"grid": {"lats": [51.0, 52.0], "lngs": [4.0, 5.0],
                "values": [[null, null], [null, null]]}}"#,
        )
        .unwrap();
        assert!(matches!(
            grid_from_envelope(envelope),
            Err(FetchError::Server(_))
        ));
    }

    #[test]
    fn yearly_envelope_decodes_twelve_month_arrays() {
        let envelope: YearlyEnvelope = serde_json::from_str(
            r#"{"data": {"tmin": [1.0, null], "tmax": [10.0, 11.0],
                "prec": [2.0, 2.5], "sunhours": [null, 6.0]}}"#,
        )
        .unwrap();
        let weather = yearly_from_envelope(envelope).unwrap();
        assert_eq!(weather.tmin[1], None);
        assert_eq!(weather.sunhours[1], Some(6.0));
    }

    #[test]
    fn empty_envelope_is_a_server_error_not_a_panic() {
        assert!(matches!(
            regions_from_envelope(CombinedEnvelope::default()),
            Err(FetchError::Server(_))
        ));
    }

    #[test]
    fn cancellation_displays_as_superseded() {
        assert_eq!(FetchError::Cancelled.to_string(), "superseded");
    }
}
