//! Weighted 0–100 design score and classification labels.

use serde::Serialize;
use std::f64::consts::PI;

use crate::engine::{PerformanceResult, STANDARD_GRAVITY};
use crate::model::EngineConfiguration;

/// Mild steel (kg/m³)
pub const STEEL_DENSITY: f64 = 7850.0;
/// Sheet wall thickness (m)
pub const WALL_THICKNESS: f64 = 0.001;
/// Allowance for flanges, valve plate and mounts
pub const FITTINGS_FACTOR: f64 = 1.5;

pub const WEIGHT_THRUST: f64 = 0.25;
pub const WEIGHT_ISP: f64 = 0.20;
pub const WEIGHT_THERMAL: f64 = 0.20;
pub const WEIGHT_FREQUENCY: f64 = 0.15;
pub const WEIGHT_THRUST_TO_WEIGHT: f64 = 0.10;
pub const WEIGHT_POWER: f64 = 0.10;

/// Target frequency band (Hz) and the distance over which the score decays.
const FREQUENCY_BAND: (f64, f64) = (80.0, 120.0);
const FREQUENCY_DECAY_HZ: f64 = 50.0;

/// Per-criterion scores, each in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SubScores {
    pub thrust: f64,
    pub specific_impulse: f64,
    pub thermal_efficiency: f64,
    pub frequency: f64,
    pub thrust_to_weight: f64,
    pub power: f64,
}

impl SubScores {
    pub fn weighted_total(&self) -> f64 {
        let total = WEIGHT_THRUST * self.thrust
            + WEIGHT_ISP * self.specific_impulse
            + WEIGHT_THERMAL * self.thermal_efficiency
            + WEIGHT_FREQUENCY * self.frequency
            + WEIGHT_THRUST_TO_WEIGHT * self.thrust_to_weight
            + WEIGHT_POWER * self.power;
        total.clamp(0.0, 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeClass {
    Micro,
    SmallHobby,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Grade {
    Poor,
    Fair,
    Good,
    Excellent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyRegime {
    Low,
    Optimal,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RankLabels {
    pub size_class: SizeClass,
    pub grade: Grade,
    pub frequency_regime: FrequencyRegime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredResult {
    pub score: f64,
    pub sub_scores: SubScores,
    pub engine_weight_kg: f64,
    pub thrust_to_weight: f64,
    pub rank_labels: RankLabels,
}

/// Linear ramp from 0 at `lo` to 100 at `hi`, clamped.
fn ramp(value: f64, lo: f64, hi: f64) -> f64 {
    ((value - lo) / (hi - lo) * 100.0).clamp(0.0, 100.0)
}

/// Inverted-U frequency score: flat 100 inside the target band.
fn frequency_score(f: f64) -> f64 {
    let (lo, hi) = FREQUENCY_BAND;
    let distance = if f < lo {
        lo - f
    } else if f > hi {
        f - hi
    } else {
        0.0
    };
    (100.0 * (1.0 - distance / FREQUENCY_DECAY_HZ)).clamp(0.0, 100.0)
}

/// Sheet-metal estimate of engine mass (kg): chamber shell with both end
/// caps, exhaust pipe and a short intake stub.
pub fn estimate_weight(config: &EngineConfiguration) -> f64 {
    let g = &config.geometry;
    let exhaust = PI * (g.exhaust_diameter / 100.0) * (g.exhaust_length / 100.0);
    let intake_d = g.intake_diameter / 100.0;
    let intake = PI * intake_d * (2.0 * intake_d);
    let sheet_area = g.chamber_surface_m2() + exhaust + intake;
    sheet_area * WALL_THICKNESS * STEEL_DENSITY * FITTINGS_FACTOR
}

pub fn size_class(thrust_n: f64) -> SizeClass {
    if thrust_n < 10.0 {
        SizeClass::Micro
    } else if thrust_n < 100.0 {
        SizeClass::SmallHobby
    } else if thrust_n < 500.0 {
        SizeClass::Medium
    } else {
        SizeClass::Large
    }
}

pub fn grade(score: f64) -> Grade {
    if score >= 80.0 {
        Grade::Excellent
    } else if score >= 60.0 {
        Grade::Good
    } else if score >= 40.0 {
        Grade::Fair
    } else {
        Grade::Poor
    }
}

pub fn frequency_regime(frequency_hz: f64) -> FrequencyRegime {
    let (lo, hi) = FREQUENCY_BAND;
    if frequency_hz < lo {
        FrequencyRegime::Low
    } else if frequency_hz > hi {
        FrequencyRegime::High
    } else {
        FrequencyRegime::Optimal
    }
}

/// Score a result given an externally estimated engine weight.
pub fn score(result: &PerformanceResult, engine_weight_kg: f64) -> ScoredResult {
    let thrust_to_weight = if engine_weight_kg > 0.0 {
        result.thrust_n / (engine_weight_kg * STANDARD_GRAVITY)
    } else {
        0.0
    };
    let sub_scores = SubScores {
        thrust: ramp(result.thrust_n, 5.0, 100.0),
        specific_impulse: ramp(result.specific_impulse_s, 100.0, 500.0),
        thermal_efficiency: ramp(result.thermal_efficiency_pct, 0.2, 2.0),
        frequency: frequency_score(result.frequency_hz),
        thrust_to_weight: ramp(thrust_to_weight, 0.0, 3.0),
        power: ramp(result.power_kw, 0.0, 10.0),
    };
    let total = sub_scores.weighted_total();
    ScoredResult {
        score: total,
        sub_scores,
        engine_weight_kg,
        thrust_to_weight,
        rank_labels: RankLabels {
            size_class: size_class(result.thrust_n),
            grade: grade(total),
            frequency_regime: frequency_regime(result.frequency_hz),
        },
    }
}

/// Score using the sheet-metal weight estimate of `config`.
pub fn score_engine(config: &EngineConfiguration, result: &PerformanceResult) -> ScoredResult {
    score(result, estimate_weight(config))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignNote {
    pub key: &'static str,
    pub message: String,
}

/// Qualitative design suggestions, one per topic at most.
pub fn design_notes(config: &EngineConfiguration, result: &PerformanceResult) -> Vec<DesignNote> {
    let mut notes = Vec::new();
    let mut note = |key: &'static str, message: String| notes.push(DesignNote { key, message });

    let ld = result.ld_ratio;
    if ld < 2.0 {
        note("ld_ratio", format!("L/D ratio is low ({ld:.1}); a longer chamber burns more completely"));
    } else if ld > 5.0 {
        note("ld_ratio", format!("L/D ratio is high ({ld:.1}); expect heat transfer losses and extra weight"));
    } else {
        note("ld_ratio", format!("L/D ratio ({ld:.1}) is in the usual range"));
    }

    let f = result.frequency_hz;
    if f < 30.0 {
        note("frequency", "low frequency limits power density; shorten the exhaust".to_string());
    } else if f > 250.0 {
        note("frequency", "high frequency stresses valves and structure; lengthen the exhaust".to_string());
    } else if (50.0..=150.0).contains(&f) {
        note("frequency", format!("operating frequency ({f:.0} Hz) is in the optimal range"));
    }

    let ar = result.area_ratio;
    if ar < 1.0 {
        note("area_ratio", "exhaust area is smaller than intake area; flow may be restricted".to_string());
    } else if ar > 3.0 {
        note("area_ratio", "very large exhaust/intake area ratio may detune the resonance".to_string());
    } else if (1.2..=2.5).contains(&ar) {
        note("area_ratio", format!("area ratio ({ar:.2}) is well balanced"));
    }

    let eff = result.thermal_efficiency_pct;
    if eff < 0.5 {
        note("efficiency", "low thermal efficiency; revisit chamber geometry and mixture".to_string());
    } else if eff > 1.5 {
        note("efficiency", format!("excellent thermal efficiency ({eff:.2}%)"));
    } else {
        note("efficiency", format!("thermal efficiency ({eff:.2}%) is typical for a valved pulse jet"));
    }

    let tw = result.thrust_n / (estimate_weight(config) * STANDARD_GRAVITY);
    if tw < 2.0 {
        note("thrust_to_weight", "low thrust-to-weight; enlarge the chamber diameter or valve area".to_string());
    } else if tw > 8.0 {
        note("thrust_to_weight", format!("excellent thrust-to-weight ratio ({tw:.1})"));
    }

    let isp = result.specific_impulse_s;
    if isp < 80.0 {
        note("specific_impulse", "low specific impulse; tune the air-fuel ratio".to_string());
    } else if isp > 200.0 {
        note("specific_impulse", format!("outstanding specific impulse ({isp:.0} s)"));
    }

    notes
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn weights_sum_to_one() {
        let sum = WEIGHT_THRUST
            + WEIGHT_ISP
            + WEIGHT_THERMAL
            + WEIGHT_FREQUENCY
            + WEIGHT_THRUST_TO_WEIGHT
            + WEIGHT_POWER;
        assert_relative_eq!(sum, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn frequency_score_is_inverted_u() {
        assert_eq!(frequency_score(100.0), 100.0);
        assert_eq!(frequency_score(80.0), 100.0);
        assert_relative_eq!(frequency_score(55.0), 50.0);
        assert_relative_eq!(frequency_score(145.0), 50.0);
        assert_eq!(frequency_score(10.0), 0.0);
        assert_eq!(frequency_score(400.0), 0.0);
    }

    #[test]
    fn labels_follow_thresholds() {
        assert_eq!(size_class(5.0), SizeClass::Micro);
        assert_eq!(size_class(44.0), SizeClass::SmallHobby);
        assert_eq!(size_class(250.0), SizeClass::Medium);
        assert_eq!(size_class(500.0), SizeClass::Large);
        assert_eq!(grade(80.0), Grade::Excellent);
        assert_eq!(grade(59.9), Grade::Fair);
        assert_eq!(grade(10.0), Grade::Poor);
        assert_eq!(frequency_regime(79.0), FrequencyRegime::Low);
        assert_eq!(frequency_regime(121.0), FrequencyRegime::High);
    }

    #[test]
    fn weight_estimate_grows_with_size() {
        let small = estimate_weight(&EngineConfiguration::small_hobby());
        let large = estimate_weight(&EngineConfiguration::large());
        assert!(small > 0.0);
        assert!(large > 5.0 * small);
    }
}
