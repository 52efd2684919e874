//! Parameter sweeps over one or two configuration fields.
//!
//! Each point is an independent evaluation of a modified copy of the base
//! configuration, so points are evaluated in parallel and collected back in
//! input order. A failing point is recorded as a failed entry; it never
//! aborts the rest of the sweep.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::engine::{evaluate, PerformanceResult};
use crate::error::{DomainError, GridEntryError, SweepEntryError};
use crate::model::EngineConfiguration;

/// Numeric configuration fields that can be swept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SweepField {
    ChamberLength,
    ChamberDiameter,
    IntakeDiameter,
    ExhaustDiameter,
    ExhaustLength,
    ValveCount,
    ValveArea,
    AirFuelRatio,
    AmbientTemperature,
    AmbientPressure,
}

impl SweepField {
    pub const ALL: [SweepField; 10] = [
        SweepField::ChamberLength,
        SweepField::ChamberDiameter,
        SweepField::IntakeDiameter,
        SweepField::ExhaustDiameter,
        SweepField::ExhaustLength,
        SweepField::ValveCount,
        SweepField::ValveArea,
        SweepField::AirFuelRatio,
        SweepField::AmbientTemperature,
        SweepField::AmbientPressure,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SweepField::ChamberLength => "chamber_length",
            SweepField::ChamberDiameter => "chamber_diameter",
            SweepField::IntakeDiameter => "intake_diameter",
            SweepField::ExhaustDiameter => "exhaust_diameter",
            SweepField::ExhaustLength => "exhaust_length",
            SweepField::ValveCount => "valve_count",
            SweepField::ValveArea => "valve_area",
            SweepField::AirFuelRatio => "air_fuel_ratio",
            SweepField::AmbientTemperature => "ambient_temperature",
            SweepField::AmbientPressure => "ambient_pressure",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            SweepField::ChamberLength
            | SweepField::ChamberDiameter
            | SweepField::IntakeDiameter
            | SweepField::ExhaustDiameter
            | SweepField::ExhaustLength => "cm",
            SweepField::ValveArea => "cm2",
            SweepField::AmbientTemperature => "C",
            SweepField::AmbientPressure => "kPa",
            SweepField::ValveCount | SweepField::AirFuelRatio => "",
        }
    }

    /// Integer-valued fields are rounded when applied.
    pub fn is_integer(self) -> bool {
        self == SweepField::ValveCount
    }

    pub fn get(self, config: &EngineConfiguration) -> f64 {
        match self {
            SweepField::ChamberLength => config.geometry.chamber_length,
            SweepField::ChamberDiameter => config.geometry.chamber_diameter,
            SweepField::IntakeDiameter => config.geometry.intake_diameter,
            SweepField::ExhaustDiameter => config.geometry.exhaust_diameter,
            SweepField::ExhaustLength => config.geometry.exhaust_length,
            SweepField::ValveCount => f64::from(config.valves.valve_count),
            SweepField::ValveArea => config.valves.valve_area,
            SweepField::AirFuelRatio => config.operating.air_fuel_ratio,
            SweepField::AmbientTemperature => config.operating.ambient_temperature,
            SweepField::AmbientPressure => config.operating.ambient_pressure,
        }
    }

    /// Copy of `config` with this field set to `value`.
    pub fn apply(self, config: &EngineConfiguration, value: f64) -> EngineConfiguration {
        let mut c = *config;
        match self {
            SweepField::ChamberLength => c.geometry.chamber_length = value,
            SweepField::ChamberDiameter => c.geometry.chamber_diameter = value,
            SweepField::IntakeDiameter => c.geometry.intake_diameter = value,
            SweepField::ExhaustDiameter => c.geometry.exhaust_diameter = value,
            SweepField::ExhaustLength => c.geometry.exhaust_length = value,
            SweepField::ValveCount => {
                // Counts that do not fit map to 0 so evaluation rejects them.
                let rounded = value.round();
                c.valves.valve_count = if rounded >= 1.0 && rounded <= f64::from(u32::MAX) {
                    rounded as u32
                } else {
                    0
                };
            }
            SweepField::ValveArea => c.valves.valve_area = value,
            SweepField::AirFuelRatio => c.operating.air_fuel_ratio = value,
            SweepField::AmbientTemperature => c.operating.ambient_temperature = value,
            SweepField::AmbientPressure => c.operating.ambient_pressure = value,
        }
        c
    }
}

impl fmt::Display for SweepField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SweepField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        SweepField::ALL
            .into_iter()
            .find(|f| f.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = SweepField::ALL.iter().map(|f| f.name()).collect();
                format!("unknown sweep field '{s}' (expected one of: {})", names.join(", "))
            })
    }
}

/// `n` evenly spaced values from `min` to `max` inclusive.
pub fn linspace(min: f64, max: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![min],
        _ => (0..n)
            .map(|i| min + (max - min) * (i as f64) / ((n - 1) as f64))
            .collect(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SweepEntry {
    pub value: f64,
    pub outcome: Result<PerformanceResult, SweepEntryError>,
}

impl SweepEntry {
    pub fn result(&self) -> Option<&PerformanceResult> {
        self.outcome.as_ref().ok()
    }
}

/// Ordered sweep entries, one per input value.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepResult {
    pub field: SweepField,
    pub entries: Vec<SweepEntry>,
}

impl SweepResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.entries.iter().filter(|e| e.outcome.is_ok()).count()
    }

    pub fn failures(&self) -> usize {
        self.len() - self.successes()
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.value).collect()
    }

    /// One metric per entry; failed entries are `None`, never zero.
    pub fn series<F>(&self, metric: F) -> Vec<Option<f64>>
    where
        F: Fn(&PerformanceResult) -> f64,
    {
        self.entries.iter().map(|e| e.result().map(&metric)).collect()
    }
}

/// Two-field sweep, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSweepResult {
    pub row_field: SweepField,
    pub col_field: SweepField,
    pub row_values: Vec<f64>,
    pub col_values: Vec<f64>,
    pub cells: Vec<Result<PerformanceResult, GridEntryError>>,
}

impl GridSweepResult {
    pub fn cell(&self, i: usize, j: usize) -> Option<&Result<PerformanceResult, GridEntryError>> {
        if i >= self.row_values.len() || j >= self.col_values.len() {
            return None;
        }
        self.cells.get(i * self.col_values.len() + j)
    }

    pub fn successes(&self) -> usize {
        self.cells.iter().filter(|c| c.is_ok()).count()
    }

    pub fn failures(&self) -> usize {
        self.cells.len() - self.successes()
    }

    /// Iterate `(i, j, row_value, col_value, outcome)` in row-major order.
    pub fn iter(
        &self,
    ) -> impl Iterator<Item = (usize, usize, f64, f64, &Result<PerformanceResult, GridEntryError>)> {
        let cols = self.col_values.len();
        self.cells.iter().enumerate().map(move |(k, cell)| {
            let (i, j) = (k / cols, k % cols);
            (i, j, self.row_values[i], self.col_values[j], cell)
        })
    }
}

pub fn sweep(base: &EngineConfiguration, field: SweepField, values: &[f64]) -> SweepResult {
    sweep_with(evaluate, base, field, values)
}

/// Sweep with an arbitrary evaluator.
pub fn sweep_with<E>(evaluator: E, base: &EngineConfiguration, field: SweepField, values: &[f64]) -> SweepResult
where
    E: Fn(&EngineConfiguration) -> Result<PerformanceResult, DomainError> + Sync,
{
    let entries: Vec<SweepEntry> = values
        .par_iter()
        .map(|&value| {
            let outcome = evaluator(&field.apply(base, value)).map_err(|source| {
                warn!(%field, value, error = %source, "sweep point failed");
                SweepEntryError { field, value, source }
            });
            SweepEntry { value, outcome }
        })
        .collect();

    let result = SweepResult { field, entries };
    debug!(%field, points = result.len(), failed = result.failures(), "sweep finished");
    result
}

pub fn sweep_grid(
    base: &EngineConfiguration,
    row_field: SweepField,
    row_values: &[f64],
    col_field: SweepField,
    col_values: &[f64],
) -> GridSweepResult {
    sweep_grid_with(evaluate, base, row_field, row_values, col_field, col_values)
}

pub fn sweep_grid_with<E>(
    evaluator: E,
    base: &EngineConfiguration,
    row_field: SweepField,
    row_values: &[f64],
    col_field: SweepField,
    col_values: &[f64],
) -> GridSweepResult
where
    E: Fn(&EngineConfiguration) -> Result<PerformanceResult, DomainError> + Sync,
{
    let points: Vec<(f64, f64)> = row_values
        .iter()
        .flat_map(|&r| col_values.iter().map(move |&c| (r, c)))
        .collect();

    let cells = points
        .par_iter()
        .map(|&(r, c)| {
            let config = col_field.apply(&row_field.apply(base, r), c);
            evaluator(&config).map_err(|source| {
                warn!(%row_field, r, %col_field, c, error = %source, "grid point failed");
                GridEntryError {
                    row_field,
                    row_value: r,
                    col_field,
                    col_value: c,
                    source,
                }
            })
        })
        .collect();

    GridSweepResult {
        row_field,
        col_field,
        row_values: row_values.to_vec(),
        col_values: col_values.to_vec(),
        cells,
    }
}

/// Central-difference derivatives of the headline metrics for one field.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityRow {
    pub field: SweepField,
    pub base_value: f64,
    pub step: f64,
    pub d_thrust: Option<f64>,
    pub d_frequency: Option<f64>,
    pub d_specific_impulse: Option<f64>,
    pub d_thermal_efficiency: Option<f64>,
    /// Percent thrust change per percent input change
    pub thrust_elasticity: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensitivityReport {
    pub rel_step: f64,
    pub base: PerformanceResult,
    pub rows: Vec<SensitivityRow>,
}

pub fn sensitivity(
    base: &EngineConfiguration,
    fields: &[SweepField],
    rel_step: f64,
) -> Result<SensitivityReport, DomainError> {
    sensitivity_with(evaluate, base, fields, rel_step)
}

pub fn sensitivity_with<E>(
    evaluator: E,
    base: &EngineConfiguration,
    fields: &[SweepField],
    rel_step: f64,
) -> Result<SensitivityReport, DomainError>
where
    E: Fn(&EngineConfiguration) -> Result<PerformanceResult, DomainError> + Sync,
{
    let base_result = evaluator(base)?;

    let rows = fields
        .par_iter()
        .map(|&field| {
            let x = field.get(base);
            let mut h = (x.abs() * rel_step).max(f64::EPSILON);
            if x == 0.0 {
                h = rel_step;
            }
            if field.is_integer() {
                h = h.round().max(1.0);
            }

            let plus = evaluator(&field.apply(base, x + h));
            let minus = evaluator(&field.apply(base, x - h));
            let (d_thrust, d_frequency, d_isp, d_eff) = match (plus, minus) {
                (Ok(p), Ok(m)) => {
                    let d = |f: fn(&PerformanceResult) -> f64| Some((f(&p) - f(&m)) / (2.0 * h));
                    (
                        d(|r| r.thrust_n),
                        d(|r| r.frequency_hz),
                        d(|r| r.specific_impulse_s),
                        d(|r| r.thermal_efficiency_pct),
                    )
                }
                (Err(e), _) | (_, Err(e)) => {
                    warn!(%field, error = %e, "sensitivity perturbation failed");
                    (None, None, None, None)
                }
            };

            SensitivityRow {
                field,
                base_value: x,
                step: h,
                d_thrust,
                d_frequency,
                d_specific_impulse: d_isp,
                d_thermal_efficiency: d_eff,
                thrust_elasticity: d_thrust.map(|d| d * x / base_result.thrust_n),
            }
        })
        .collect();

    Ok(SensitivityReport {
        rel_step,
        base: base_result,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linspace_endpoints() {
        assert_eq!(linspace(1.0, 2.0, 0), Vec::<f64>::new());
        assert_eq!(linspace(3.0, 9.0, 1), vec![3.0]);
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn field_names_round_trip() {
        for field in SweepField::ALL {
            assert_eq!(field.name().parse::<SweepField>(), Ok(field));
        }
        assert!("nozzle_length".parse::<SweepField>().is_err());
    }

    #[test]
    fn apply_then_get() {
        let base = EngineConfiguration::medium();
        for field in SweepField::ALL {
            let c = field.apply(&base, 7.0);
            assert_eq!(field.get(&c), 7.0, "{field}");
        }
    }

    #[test]
    fn valve_count_rounds_and_rejects_nonpositive() {
        let base = EngineConfiguration::medium();
        assert_eq!(SweepField::ValveCount.apply(&base, 5.6).valves.valve_count, 6);
        assert_eq!(SweepField::ValveCount.apply(&base, -2.0).valves.valve_count, 0);
        assert_eq!(SweepField::ValveCount.apply(&base, f64::NAN).valves.valve_count, 0);
        assert_eq!(SweepField::ValveCount.apply(&base, 1e12).valves.valve_count, 0);
        assert_eq!(SweepField::ValveCount.apply(&base, f64::INFINITY).valves.valve_count, 0);
    }

    #[test]
    fn oversized_valve_count_fails_its_entry() {
        let base = EngineConfiguration::medium();
        let result = sweep(&base, SweepField::ValveCount, &[4.0, 1e12]);
        assert!(result.entries[0].outcome.is_ok());
        let err = result.entries[1].outcome.as_ref().unwrap_err();
        assert_eq!(err.source.quantity(), "valve_count");
    }

    #[test]
    fn grid_cell_indexing_is_row_major() {
        let base = EngineConfiguration::medium();
        let grid = sweep_grid(
            &base,
            SweepField::ChamberLength,
            &[40.0, 50.0],
            SweepField::AirFuelRatio,
            &[13.0, 14.7, 16.0],
        );
        assert_eq!(grid.cells.len(), 6);
        let direct = evaluate(&SweepField::AirFuelRatio.apply(
            &SweepField::ChamberLength.apply(&base, 50.0),
            13.0,
        ))
        .unwrap();
        assert_eq!(grid.cell(1, 0), Some(&Ok(direct)));
        assert!(grid.cell(2, 0).is_none());
        assert!(grid.cell(0, 3).is_none());
    }

    #[test]
    fn failed_grid_cell_names_its_coordinates() {
        let base = EngineConfiguration::medium();
        let grid = sweep_grid(
            &base,
            SweepField::ChamberLength,
            &[40.0, -1.0],
            SweepField::ValveArea,
            &[10.0, 20.0],
        );
        assert_eq!(grid.failures(), 2);
        let err = grid.cell(1, 1).unwrap().as_ref().unwrap_err();
        assert_eq!(err.row_field, SweepField::ChamberLength);
        assert_eq!(err.row_value, -1.0);
        assert_eq!(err.col_value, 20.0);
        assert_eq!(err.source.quantity(), "chamber_length");
        assert!(err.to_string().starts_with("chamber_length = -1, valve_area = 20:"));
    }
}
