use serde::{Deserialize, Serialize};

use crate::units::{TempUnit, celsius_to_fahrenheit, fahrenheit_to_celsius, to_celsius};

/// The user's desired climate ranges. Temperature bounds are stored in the
/// currently selected unit; rainfall is mm/day, sunshine hours/day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferenceProfile {
    pub temp_min: f64,
    pub temp_max: f64,
    pub rain_min: f64,
    pub rain_max: f64,
    pub sun_min: f64,
    pub sun_max: f64,
    pub unit: TempUnit,
}

impl Default for PreferenceProfile {
    fn default() -> Self {
        Self {
            temp_min: 15.0,
            temp_max: 28.0,
            rain_min: 0.0,
            rain_max: 5.0,
            sun_min: 6.0,
            sun_max: 14.0,
            unit: TempUnit::Celsius,
        }
    }
}

impl PreferenceProfile {
    /// Switch the display unit, converting the stored temperature bounds in
    /// place. Converting back recovers the original values up to float
    /// precision because no display rounding is applied here.
    pub fn set_unit(&mut self, unit: TempUnit) {
        if unit == self.unit {
            return;
        }
        let (min, max) = match unit {
            TempUnit::Fahrenheit => (
                celsius_to_fahrenheit(self.temp_min),
                celsius_to_fahrenheit(self.temp_max),
            ),
            TempUnit::Celsius => (
                fahrenheit_to_celsius(self.temp_min),
                fahrenheit_to_celsius(self.temp_max),
            ),
        };
        self.temp_min = min;
        self.temp_max = max;
        self.unit = unit;
    }

    /// Temperature bounds normalized to Celsius, swapped if rounding (or a
    /// half-updated slider pair) left min above max.
    pub fn temp_bounds_celsius(&self) -> (f64, f64) {
        ordered(
            to_celsius(self.temp_min, self.unit),
            to_celsius(self.temp_max, self.unit),
        )
    }

    pub fn rain_bounds(&self) -> (f64, f64) {
        ordered(self.rain_min, self.rain_max)
    }

    pub fn sun_bounds(&self) -> (f64, f64) {
        ordered(self.sun_min, self.sun_max)
    }
}

fn ordered(a: f64, b: f64) -> (f64, f64) {
    if a <= b { (a, b) } else { (b, a) }
}
