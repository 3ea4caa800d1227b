//! Tracked metrics, delta formatting and trend coloring

use serde::{Deserialize, Serialize};

use super::document::Rgb;
use super::style::{COLOR_BAD, COLOR_GOOD, COLOR_INCREASE, COLOR_NEUTRAL, COLOR_REDUCTION};
use crate::models::{Assessment, SummaryStatistics};

/// A body-composition metric with its own KPI card and chart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Weight,
    BodyFat,
    Bmi,
    LeanMass,
}

impl Metric {
    pub const KPI_ORDER: [Metric; 4] = [Metric::Weight, Metric::BodyFat, Metric::Bmi, Metric::LeanMass];

    /// Metrics that get a chart section in the evolution report
    pub const CHARTED: [Metric; 3] = [Metric::Weight, Metric::BodyFat, Metric::Bmi];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Weight => "weight",
            Metric::BodyFat => "body_fat",
            Metric::Bmi => "bmi",
            Metric::LeanMass => "lean_mass",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "weight" => Some(Metric::Weight),
            "body_fat" | "bodyfat" | "fat" => Some(Metric::BodyFat),
            "bmi" | "imc" => Some(Metric::Bmi),
            "lean_mass" | "lean" => Some(Metric::LeanMass),
            _ => None,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Metric::Weight => "Weight",
            Metric::BodyFat => "Body Fat",
            Metric::Bmi => "BMI",
            Metric::LeanMass => "Lean Mass",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Weight | Metric::LeanMass => "kg",
            Metric::BodyFat => "%",
            Metric::Bmi => "",
        }
    }

    pub fn value(&self, record: &Assessment) -> Option<f64> {
        match self {
            Metric::Weight => record.weight_kg,
            Metric::BodyFat => record.body_fat_pct,
            Metric::Bmi => record.bmi,
            Metric::LeanMass => record.lean_mass_kg,
        }
    }

    pub fn delta(&self, stats: &SummaryStatistics) -> Option<f64> {
        match self {
            Metric::Weight => stats.weight_delta,
            Metric::BodyFat => stats.body_fat_delta,
            Metric::Bmi => stats.bmi_delta,
            Metric::LeanMass => stats.lean_mass_delta,
        }
    }
}

/// Direction of change over the reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Increase,
    Reduction,
    Stable,
}

impl Trend {
    /// Sign of the delta; zero or missing counts as stable
    pub fn from_delta(delta: Option<f64>) -> Self {
        match delta {
            Some(d) if d.is_finite() && d > 0.0 => Trend::Increase,
            Some(d) if d.is_finite() && d < 0.0 => Trend::Reduction,
            _ => Trend::Stable,
        }
    }

    pub fn word(&self) -> &'static str {
        match self {
            Trend::Increase => "increase",
            Trend::Reduction => "reduction",
            Trend::Stable => "stable",
        }
    }

    /// Same mapping for every metric, even where a reduction is the desirable outcome
    pub fn color(&self) -> Rgb {
        match self {
            Trend::Increase => COLOR_INCREASE,
            Trend::Reduction => COLOR_REDUCTION,
            Trend::Stable => COLOR_NEUTRAL,
        }
    }
}

/// "-1.5 kg", "+0.3", "0.0 %" or "N/A". Any non-zero delta keeps its sign.
pub fn format_delta(delta: Option<f64>, unit: &str) -> String {
    let value = match delta {
        Some(d) if d.is_finite() => d,
        _ => return "N/A".to_string(),
    };
    let number = if Trend::from_delta(Some(value)) == Trend::Stable {
        "0.0".to_string()
    } else {
        format!("{:+.1}", value)
    };
    if unit.is_empty() {
        number
    } else {
        format!("{} {}", number, unit)
    }
}

pub fn format_value(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.1}", v),
        _ => "-".to_string(),
    }
}

/// Color for a circumference change.
///
/// Arm measurements read growth as progress; every other site (waist, hip,
/// abdomen...) reads growth as a setback. KPI cards do not use this rule.
pub fn circumference_delta_color(name: &str, delta: Option<f64>) -> Rgb {
    let increase_is_good = name.to_lowercase().contains("arm");
    match Trend::from_delta(delta) {
        Trend::Stable => COLOR_NEUTRAL,
        Trend::Increase if increase_is_good => COLOR_GOOD,
        Trend::Increase => COLOR_BAD,
        Trend::Reduction if increase_is_good => COLOR_BAD,
        Trend::Reduction => COLOR_GOOD,
    }
}

/// Color for a performance test change: more repetitions or reach reads as progress
pub fn test_delta_color(delta: Option<f64>) -> Rgb {
    match Trend::from_delta(delta) {
        Trend::Increase => COLOR_GOOD,
        Trend::Reduction => COLOR_BAD,
        Trend::Stable => COLOR_NEUTRAL,
    }
}

/// "right_arm" -> "Right Arm"
pub fn humanize(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_delta() {
        assert_eq!(format_delta(Some(-1.5), "kg"), "-1.5 kg");
        assert_eq!(format_delta(Some(0.3), ""), "+0.3");
        assert_eq!(format_delta(Some(0.0), "%"), "0.0 %");
        assert_eq!(format_delta(None, "kg"), "N/A");
        assert_eq!(format_delta(Some(f64::NAN), "kg"), "N/A");
    }

    #[test]
    fn test_trend_by_sign() {
        assert_eq!(Trend::from_delta(Some(2.0)), Trend::Increase);
        assert_eq!(Trend::from_delta(Some(-0.4)), Trend::Reduction);
        assert_eq!(Trend::from_delta(Some(0.0)), Trend::Stable);
        assert_eq!(Trend::from_delta(None), Trend::Stable);
        assert_eq!(Trend::Stable.color(), COLOR_NEUTRAL);
    }

    #[test]
    fn test_small_deltas_keep_their_sign() {
        assert_eq!(Trend::from_delta(Some(0.03)), Trend::Increase);
        assert_eq!(Trend::from_delta(Some(-0.03)), Trend::Reduction);
        assert_eq!(Trend::from_delta(Some(0.03)).color(), COLOR_INCREASE);
        assert_eq!(format_delta(Some(0.03), ""), "+0.0");
        assert_eq!(format_delta(Some(-0.03), "cm"), "-0.0 cm");
        assert_eq!(circumference_delta_color("waist", Some(0.03)), COLOR_BAD);
        assert_eq!(test_delta_color(Some(-0.03)), COLOR_BAD);
    }

    #[test]
    fn test_circumference_coloring_is_site_specific() {
        assert_eq!(circumference_delta_color("right_arm", Some(1.0)), COLOR_GOOD);
        assert_eq!(circumference_delta_color("waist", Some(1.0)), COLOR_BAD);
        assert_eq!(circumference_delta_color("hip", Some(-2.0)), COLOR_GOOD);
        assert_eq!(circumference_delta_color("forearm", Some(-1.0)), COLOR_BAD);
        assert_eq!(circumference_delta_color("waist", None), COLOR_NEUTRAL);
    }

    #[test]
    fn test_performance_tests_reward_increase() {
        assert_eq!(test_delta_color(Some(3.0)), COLOR_GOOD);
        assert_eq!(test_delta_color(Some(-3.0)), COLOR_BAD);
        assert_eq!(test_delta_color(None), COLOR_NEUTRAL);
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("right_arm"), "Right Arm");
        assert_eq!(humanize("waist"), "Waist");
        assert_eq!(humanize("push-ups max"), "Push Ups Max");
    }
}
