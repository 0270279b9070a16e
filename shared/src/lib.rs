pub mod colors;
pub mod geo;
pub mod grid;
pub mod mode;
pub mod prefs;
pub mod region;
pub mod resolution;
pub mod score;
pub mod units;

pub use colors::{Gradient, Rgba};
pub use geo::{GeoBounds, Viewport};
pub use grid::{CompositeGrid, GridDataset};
pub use mode::{ApiVariable, ClimateVariable, DisplayMode, RegionStatistic};
pub use prefs::PreferenceProfile;
pub use region::{RegionDataset, RegionFeature};
pub use resolution::Granularity;
pub use score::{MatchCategory, MatchResult, Readings};
pub use units::TempUnit;
