use serde::{Deserialize, Serialize};

/// An overlay color. Channels 0–255, alpha 0.0–1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Format as a CSS color string.
    pub fn css(&self) -> String {
        let Rgba { r, g, b, a } = self;
        format!("rgba({r},{g},{b},{a})")
    }
}

/// Neutral gray for missing samples. Low alpha so the basemap shows through.
pub const NO_DATA: Rgba = Rgba::new(160, 160, 160, 0.25);

/// Fill alpha for grid heatmap cells.
pub const GRID_ALPHA: f64 = 0.7;
/// Fill alpha for region choropleth polygons.
pub const REGION_ALPHA: f64 = 0.65;

/// A value-ordered color breakpoint. Stops must be strictly increasing in value.
#[derive(Debug, Clone, Copy)]
pub struct GradientStop {
    pub value: f64,
    pub rgb: (u8, u8, u8),
}

/// Piecewise-linear color scale over scalar values.
#[derive(Debug, Clone, Copy)]
pub struct Gradient {
    stops: &'static [GradientStop],
    alpha: f64,
}

impl Gradient {
    pub const fn new(stops: &'static [GradientStop], alpha: f64) -> Self {
        Self { stops, alpha }
    }

    /// Interpolate a color for `value`. Values past either end clamp to the
    /// end colors; a missing sample yields the no-data gray.
    pub fn color_for(&self, value: Option<f64>) -> Rgba {
        let Some(value) = value else {
            return NO_DATA;
        };
        if !value.is_finite() {
            return NO_DATA;
        }

        let first = self.stops[0];
        if value <= first.value {
            let (r, g, b) = first.rgb;
            return Rgba::new(r, g, b, self.alpha);
        }

        for window in self.stops.windows(2) {
            let (lower, upper) = (window[0], window[1]);
            if value <= upper.value {
                let span = (upper.value - lower.value).max(f64::EPSILON);
                let t = (value - lower.value) / span;
                return Rgba::new(
                    lerp_u8(lower.rgb.0, upper.rgb.0, t),
                    lerp_u8(lower.rgb.1, upper.rgb.1, t),
                    lerp_u8(lower.rgb.2, upper.rgb.2, t),
                    self.alpha,
                );
            }
        }

        let last = self.stops[self.stops.len() - 1];
        let (r, g, b) = last.rgb;
        Rgba::new(r, g, b, self.alpha)
    }
}

fn lerp_u8(a: u8, b: u8, t: f64) -> u8 {
    let t = t.clamp(0.0, 1.0);
    let value = a as f64 + (b as f64 - a as f64) * t;
    value.round().clamp(0.0, 255.0) as u8
}

/// Monthly average temperature, °C.
pub const TEMPERATURE_GRADIENT: Gradient = Gradient::new(
    &[
        GradientStop { value: -30.0, rgb: (49, 54, 149) },
        GradientStop { value: -10.0, rgb: (69, 117, 180) },
        GradientStop { value: 0.0, rgb: (116, 173, 209) },
        GradientStop { value: 10.0, rgb: (224, 243, 248) },
        GradientStop { value: 18.0, rgb: (254, 224, 144) },
        GradientStop { value: 26.0, rgb: (253, 141, 89) },
        GradientStop { value: 35.0, rgb: (165, 0, 38) },
    ],
    GRID_ALPHA,
);

/// Mean precipitation, mm/day.
pub const PRECIPITATION_GRADIENT: Gradient = Gradient::new(
    &[
        GradientStop { value: 0.0, rgb: (255, 255, 229) },
        GradientStop { value: 1.0, rgb: (199, 233, 180) },
        GradientStop { value: 3.0, rgb: (65, 182, 196) },
        GradientStop { value: 6.0, rgb: (34, 94, 168) },
        GradientStop { value: 12.0, rgb: (8, 29, 88) },
    ],
    GRID_ALPHA,
);

/// Mean sunshine, hours/day.
pub const SUNSHINE_GRADIENT: Gradient = Gradient::new(
    &[
        GradientStop { value: 0.0, rgb: (84, 84, 110) },
        GradientStop { value: 4.0, rgb: (158, 154, 137) },
        GradientStop { value: 8.0, rgb: (253, 205, 80) },
        GradientStop { value: 12.0, rgb: (255, 160, 0) },
    ],
    GRID_ALPHA,
);
