use crate::colors::Rgba;
use crate::prefs::PreferenceProfile;

/// Match-classification colors. Categorical, not a gradient.
pub const MATCH_GREEN: Rgba = Rgba::new(67, 160, 71, 0.75);
pub const MATCH_YELLOW: Rgba = Rgba::new(253, 216, 53, 0.75);
pub const MATCH_ORANGE: Rgba = Rgba::new(251, 140, 0, 0.75);
pub const MATCH_RED: Rgba = Rgba::new(229, 57, 53, 0.75);

/// One location's readings for the composite mode. Temperature is the
/// monthly average in °C; absent variables simply don't count as criteria.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Readings {
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub sunshine: Option<f64>,
}

/// How well a location matches the preference profile.
///
/// The bucket rule is asymmetric on purpose: 2-of-3 and 1-of-2 are both
/// "most", while 1-of-3 gets its own bucket. Observed product behavior,
/// kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchCategory {
    /// Every present criterion matched.
    All,
    /// 2-of-3 or 1-of-2 matched.
    Most,
    /// Exactly 1-of-3 matched.
    OneOfThree,
    /// Nothing matched.
    None,
}

impl MatchCategory {
    pub fn color(self) -> Rgba {
        match self {
            MatchCategory::All => MATCH_GREEN,
            MatchCategory::Most => MATCH_YELLOW,
            MatchCategory::OneOfThree => MATCH_ORANGE,
            MatchCategory::None => MATCH_RED,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// match_count / total_criteria, for "67% match" style display.
    pub score: f64,
    pub match_count: u8,
    pub total_criteria: u8,
    pub category: MatchCategory,
}

impl MatchResult {
    pub fn color(&self) -> Rgba {
        self.category.color()
    }
}

/// Score a location against the profile. Returns `None` when no variable is
/// present at all (rendered as no-data, never as a zero-score red).
pub fn classify(readings: &Readings, prefs: &PreferenceProfile) -> Option<MatchResult> {
    let mut total = 0u8;
    let mut matched = 0u8;

    if let Some(temp) = readings.temperature {
        total += 1;
        let (min, max) = prefs.temp_bounds_celsius();
        if temp >= min && temp <= max {
            matched += 1;
        }
    }
    if let Some(prec) = readings.precipitation {
        total += 1;
        let (min, max) = prefs.rain_bounds();
        if prec >= min && prec <= max {
            matched += 1;
        }
    }
    if let Some(sun) = readings.sunshine {
        total += 1;
        let (min, max) = prefs.sun_bounds();
        if sun >= min && sun <= max {
            matched += 1;
        }
    }

    if total == 0 {
        return None;
    }

    let category = categorize(matched, total);
    Some(MatchResult {
        score: matched as f64 / total as f64,
        match_count: matched,
        total_criteria: total,
        category,
    })
}

fn categorize(matched: u8, total: u8) -> MatchCategory {
    if matched == total {
        MatchCategory::All
    } else if (total == 3 && matched == 2) || (total == 2 && matched == 1) {
        MatchCategory::Most
    } else if total == 3 && matched == 1 {
        MatchCategory::OneOfThree
    } else {
        MatchCategory::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::units::TempUnit;

    fn profile() -> PreferenceProfile {
        PreferenceProfile {
            temp_min: 18.0,
            temp_max: 30.0,
            rain_min: 0.0,
            rain_max: 3.0,
            sun_min: 6.0,
            sun_max: 14.0,
            unit: TempUnit::Celsius,
        }
    }

    #[test]
    fn categorization_is_total_and_deterministic() {
        let expected = [
            (1, 0, MatchCategory::None),
            (1, 1, MatchCategory::All),
            (2, 0, MatchCategory::None),
            (2, 1, MatchCategory::Most),
            (2, 2, MatchCategory::All),
            (3, 0, MatchCategory::None),
            (3, 1, MatchCategory::OneOfThree),
            (3, 2, MatchCategory::Most),
            (3, 3, MatchCategory::All),
        ];
        for (total, matched, category) in expected {
            assert_eq!(
                categorize(matched, total),
                category,
                "total={total} matched={matched}"
            );
        }
    }

    #[test]
    fn no_readings_yields_no_result() {
        assert_eq!(classify(&Readings::default(), &profile()), None);
    }

    #[test]
    fn all_three_in_range_is_green_with_full_score() {
        let readings = Readings {
            temperature: Some(24.0),
            precipitation: Some(1.5),
            sunshine: Some(9.0),
        };
        let result = classify(&readings, &profile()).unwrap();
        assert_eq!(result.category, MatchCategory::All);
        assert_eq!(result.match_count, 3);
        assert_eq!(result.total_criteria, 3);
        assert!((result.score - 1.0).abs() < 1e-9);
        assert_eq!(result.color(), MATCH_GREEN);
    }

    #[test]
    fn two_of_three_scores_67_percent_yellow() {
        let readings = Readings {
            temperature: Some(24.0),
            precipitation: Some(8.0), // out of range
            sunshine: Some(9.0),
        };
        let result = classify(&readings, &profile()).unwrap();
        assert_eq!(result.category, MatchCategory::Most);
        assert!((result.score - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn bounds_are_inclusive() {
        let readings = Readings {
            temperature: Some(18.0),
            precipitation: Some(3.0),
            sunshine: Some(14.0),
        };
        let result = classify(&readings, &profile()).unwrap();
        assert_eq!(result.category, MatchCategory::All);
    }

    #[test]
    fn single_present_criterion_out_of_range_is_red() {
        // Spec end-to-end: tavg 15 °C against 18–30 °C, only temperature
        // present, must classify red.
        let readings = Readings {
            temperature: Some(15.0),
            precipitation: None,
            sunshine: None,
        };
        let result = classify(&readings, &profile()).unwrap();
        assert_eq!(result.total_criteria, 1);
        assert_eq!(result.match_count, 0);
        assert_eq!(result.category, MatchCategory::None);
        assert_eq!(result.color(), MATCH_RED);
    }

    #[test]
    fn fahrenheit_profile_compares_in_celsius() {
        let mut prefs = profile();
        prefs.set_unit(TempUnit::Fahrenheit);
        // 24 °C sits inside 18–30 °C regardless of the stored unit.
        let readings = Readings {
            temperature: Some(24.0),
            ..Readings::default()
        };
        let result = classify(&readings, &prefs).unwrap();
        assert_eq!(result.category, MatchCategory::All);
    }
}
