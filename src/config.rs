use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::engine::ModelConstants;
use crate::fuel::FuelType;
use crate::model::{EngineConfiguration, Geometry, OperatingConditions, ValveSystem};
use crate::optimize::{Objective, ParameterRange, MAX_RANGES};
use crate::sweep::{linspace, SweepField};
use crate::validator::ValidationLevel;

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Root {
    #[serde(default)]
    pub metadata: Metadata,
    pub geometry: Geometry,
    pub valves: ValveSystem,
    pub operating: Operating,
    #[serde(default)]
    pub validation: Validation,
    pub sweep: Option<Axis>,
    pub grid: Option<Grid>,
    pub optimize: Option<Optimize>,
    /// Overrides for the empirical model constants
    pub model: Option<ModelConstants>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Metadata {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_name() -> String {
    "unnamed".to_string()
}

fn default_version() -> String {
    "1.0".to_string()
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            name: default_name(),
            description: String::new(),
            version: default_version(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Operating {
    pub fuel: FuelType,
    /// Defaults to the fuel's stoichiometric ratio
    pub air_fuel_ratio: Option<f64>,
    /// Ambient temperature (°C, default: 20)
    #[serde(default = "default_temperature")]
    pub ambient_temperature: f64,
    /// Ambient pressure (kPa, default: 101.3)
    #[serde(default = "default_pressure")]
    pub ambient_pressure: f64,
}

fn default_temperature() -> f64 { 20.0 }
fn default_pressure() -> f64 { 101.3 }

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Validation {
    #[serde(default)]
    pub level: ValidationLevel,
    /// Refuse to evaluate when the validator reports errors
    #[serde(default)]
    pub deny_errors: bool,
}

/// One swept axis: either explicit `values` or `min`/`max`/`n`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Axis {
    pub field: SweepField,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub n: Option<usize>,
    pub values: Option<Vec<f64>>,
}

impl Axis {
    pub fn values(&self) -> Vec<f64> {
        match (&self.values, self.min, self.max) {
            (Some(v), _, _) => v.clone(),
            (None, Some(min), Some(max)) => linspace(min, max, self.n.unwrap_or(11)),
            _ => Vec::new(),
        }
    }

    fn validate(&self, section: &str) -> Result<()> {
        if let Some(ref values) = self.values {
            if values.is_empty() {
                bail!("{section}.values must not be empty");
            }
            if self.min.is_some() || self.max.is_some() || self.n.is_some() {
                bail!("{section}: give either values or min/max/n, not both");
            }
            return Ok(());
        }
        let (Some(min), Some(max)) = (self.min, self.max) else {
            bail!("{section} needs values or both min and max");
        };
        if self.n == Some(0) {
            bail!("{section}.n must be >= 1");
        }
        if !(min <= max) {
            bail!("{section}.min must be <= {section}.max");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Grid {
    pub rows: Axis,
    pub cols: Axis,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Optimize {
    #[serde(default = "default_objective")]
    pub objective: Objective,
    /// Grid points per searched field (default: 5)
    #[serde(default = "default_points")]
    pub points: usize,
    pub ranges: Vec<ParameterRange>,
}

fn default_objective() -> Objective { Objective::Thrust }
fn default_points() -> usize { 5 }

impl Root {
    /// Read, parse and structurally validate a TOML file. Returns the
    /// parsed root and the raw text (hashed into result manifests).
    pub fn load(path: impl AsRef<Path>) -> Result<(Self, String)> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let root: Root = toml::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        root.validate()?;
        Ok((root, text))
    }

    pub fn engine(&self) -> EngineConfiguration {
        let op = &self.operating;
        EngineConfiguration {
            geometry: self.geometry,
            valves: self.valves,
            operating: OperatingConditions {
                fuel: op.fuel,
                air_fuel_ratio: op
                    .air_fuel_ratio
                    .unwrap_or(op.fuel.properties().stoichiometric_afr),
                ambient_temperature: op.ambient_temperature,
                ambient_pressure: op.ambient_pressure,
            },
        }
    }

    pub fn constants(&self) -> ModelConstants {
        self.model.unwrap_or_default()
    }

    /// Structural checks only. Engineering ranges are the validator's job.
    pub fn validate(&self) -> Result<()> {
        if self.metadata.name.trim().is_empty() {
            bail!("metadata.name must not be empty");
        }
        if let Some(afr) = self.operating.air_fuel_ratio {
            if !afr.is_finite() {
                bail!("operating.air_fuel_ratio must be a finite number");
            }
        }

        if let Some(ref sweep) = self.sweep {
            sweep.validate("sweep")?;
        }

        if let Some(ref grid) = self.grid {
            grid.rows.validate("grid.rows")?;
            grid.cols.validate("grid.cols")?;
            if grid.rows.field == grid.cols.field {
                bail!("grid.rows.field and grid.cols.field must differ");
            }
        }

        if let Some(ref opt) = self.optimize {
            if opt.points < 2 {
                bail!("optimize.points must be >= 2");
            }
            if opt.ranges.is_empty() || opt.ranges.len() > MAX_RANGES {
                bail!("optimize.ranges must list 1 to {MAX_RANGES} fields");
            }
            for r in &opt.ranges {
                if !(r.min <= r.max) {
                    bail!("optimize range for {} has min > max", r.field);
                }
            }
        }

        if let Some(ref model) = self.model {
            model.check().context("invalid [model] constants")?;
        }

        Ok(())
    }
}
