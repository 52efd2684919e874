//! Exhaustive grid search over up to three configuration fields.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, info};

use crate::engine::{evaluate, PerformanceResult};
use crate::error::{DomainError, OptimizeError};
use crate::model::EngineConfiguration;
use crate::scoring::{score_engine, ScoredResult};
use crate::sweep::{linspace, SweepField};

pub const MAX_RANGES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    Thrust,
    ThermalEfficiency,
    SpecificImpulse,
    SpecificFuelConsumption,
    DesignScore,
}

impl Objective {
    pub const ALL: [Objective; 5] = [
        Objective::Thrust,
        Objective::ThermalEfficiency,
        Objective::SpecificImpulse,
        Objective::SpecificFuelConsumption,
        Objective::DesignScore,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Objective::Thrust => "thrust",
            Objective::ThermalEfficiency => "thermal_efficiency",
            Objective::SpecificImpulse => "specific_impulse",
            Objective::SpecificFuelConsumption => "specific_fuel_consumption",
            Objective::DesignScore => "design_score",
        }
    }

    /// Only specific fuel consumption is minimized.
    pub fn maximize(self) -> bool {
        self != Objective::SpecificFuelConsumption
    }

    pub fn value(self, result: &PerformanceResult, scored: &ScoredResult) -> f64 {
        match self {
            Objective::Thrust => result.thrust_n,
            Objective::ThermalEfficiency => result.thermal_efficiency_pct,
            Objective::SpecificImpulse => result.specific_impulse_s,
            Objective::SpecificFuelConsumption => result.specific_fuel_consumption_kg_nh,
            Objective::DesignScore => scored.score,
        }
    }

    fn better(self, candidate: f64, incumbent: f64) -> bool {
        if self.maximize() {
            candidate > incumbent
        } else {
            candidate < incumbent
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Objective {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.to_ascii_lowercase().as_str() {
            "isp" => return Ok(Objective::SpecificImpulse),
            "sfc" => return Ok(Objective::SpecificFuelConsumption),
            "efficiency" => return Ok(Objective::ThermalEfficiency),
            "score" => return Ok(Objective::DesignScore),
            _ => {}
        }
        Objective::ALL
            .into_iter()
            .find(|o| o.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown objective '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParameterRange {
    pub field: SweepField,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimum {
    pub objective: Objective,
    pub objective_value: f64,
    /// Chosen value per searched field, in range order
    pub parameters: Vec<(SweepField, f64)>,
    pub config: EngineConfiguration,
    pub result: PerformanceResult,
    pub scored: ScoredResult,
    pub evaluated: usize,
    pub failed: usize,
}

/// Cartesian product of per-axis samples, last axis fastest.
fn grid_points(axes: &[Vec<f64>]) -> Vec<Vec<f64>> {
    axes.iter().fold(vec![Vec::new()], |acc, axis| {
        acc.into_iter()
            .flat_map(|prefix| {
                axis.iter().map(move |&v| {
                    let mut p = prefix.clone();
                    p.push(v);
                    p
                })
            })
            .collect()
    })
}

pub fn optimize(
    base: &EngineConfiguration,
    ranges: &[ParameterRange],
    points_per_axis: usize,
    objective: Objective,
) -> Result<Optimum, OptimizeError> {
    optimize_with(evaluate, base, ranges, points_per_axis, objective)
}

/// Grid search with an arbitrary evaluator.
pub fn optimize_with<E>(
    evaluator: E,
    base: &EngineConfiguration,
    ranges: &[ParameterRange],
    points_per_axis: usize,
    objective: Objective,
) -> Result<Optimum, OptimizeError>
where
    E: Fn(&EngineConfiguration) -> Result<PerformanceResult, DomainError> + Sync,
{
    if ranges.is_empty() {
        return Err(OptimizeError::NoRanges);
    }
    if ranges.len() > MAX_RANGES {
        return Err(OptimizeError::TooManyRanges(ranges.len()));
    }
    if points_per_axis < 2 {
        return Err(OptimizeError::TooFewPoints(points_per_axis));
    }
    for r in ranges {
        if !(r.min <= r.max) {
            return Err(OptimizeError::InvalidRange {
                field: r.field,
                min: r.min,
                max: r.max,
            });
        }
    }

    let axes: Vec<Vec<f64>> = ranges
        .iter()
        .map(|r| linspace(r.min, r.max, points_per_axis))
        .collect();
    let points = grid_points(&axes);
    info!(%objective, points = points.len(), "grid search started");

    let outcomes: Vec<Option<(EngineConfiguration, PerformanceResult, ScoredResult, f64)>> = points
        .par_iter()
        .map(|values| {
            let config = ranges
                .iter()
                .zip(values)
                .fold(*base, |c, (r, &v)| r.field.apply(&c, v));
            let result = evaluator(&config).ok()?;
            let scored = score_engine(&config, &result);
            let value = objective.value(&result, &scored);
            value.is_finite().then_some((config, result, scored, value))
        })
        .collect();

    let evaluated = outcomes.len();
    let failed = outcomes.iter().filter(|o| o.is_none()).count();

    let mut best: Option<(usize, f64)> = None;
    for (idx, outcome) in outcomes.iter().enumerate() {
        if let Some((_, _, _, value)) = outcome {
            if best.map_or(true, |(_, incumbent)| objective.better(*value, incumbent)) {
                best = Some((idx, *value));
            }
        }
    }

    let (idx, objective_value) = best.ok_or(OptimizeError::NoFeasiblePoint { failed })?;
    let Some((config, result, scored, _)) = outcomes.into_iter().nth(idx).flatten() else {
        return Err(OptimizeError::NoFeasiblePoint { failed });
    };
    let parameters = ranges
        .iter()
        .zip(&points[idx])
        .map(|(r, &v)| (r.field, v))
        .collect();

    debug!(objective_value, evaluated, failed, "grid search finished");

    Ok(Optimum {
        objective,
        objective_value,
        parameters,
        config,
        result,
        scored,
        evaluated,
        failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_points_cover_product() {
        let pts = grid_points(&[vec![1.0, 2.0], vec![10.0, 20.0, 30.0]]);
        assert_eq!(pts.len(), 6);
        assert_eq!(pts[0], vec![1.0, 10.0]);
        assert_eq!(pts[5], vec![2.0, 30.0]);
    }

    #[test]
    fn rejects_bad_requests() {
        let base = EngineConfiguration::medium();
        let r = ParameterRange {
            field: SweepField::ChamberLength,
            min: 40.0,
            max: 60.0,
        };
        assert_eq!(optimize(&base, &[], 5, Objective::Thrust), Err(OptimizeError::NoRanges));
        assert_eq!(
            optimize(&base, &[r; 4], 5, Objective::Thrust),
            Err(OptimizeError::TooManyRanges(4))
        );
        assert_eq!(
            optimize(&base, &[r], 1, Objective::Thrust),
            Err(OptimizeError::TooFewPoints(1))
        );
        let inverted = ParameterRange { min: 60.0, max: 40.0, ..r };
        assert!(matches!(
            optimize(&base, &[inverted], 3, Objective::Thrust),
            Err(OptimizeError::InvalidRange { .. })
        ));
    }

    #[test]
    fn objective_aliases_parse() {
        assert_eq!("isp".parse::<Objective>(), Ok(Objective::SpecificImpulse));
        assert_eq!("Thrust".parse::<Objective>(), Ok(Objective::Thrust));
        assert!("range".parse::<Objective>().is_err());
        assert!(!Objective::SpecificFuelConsumption.maximize());
    }
}
