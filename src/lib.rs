//! Steady-state pulse jet engine performance evaluator.
//!
//! The core is a set of pure functions: [`validate`] checks a configuration
//! against engineering ranges, [`evaluate`] computes a [`PerformanceResult`],
//! [`scoring::score`] grades it, and [`sweep()`] re-evaluates over parameter
//! grids. The `pulsejet` binary wraps these with TOML input and CSV/JSON
//! output.

pub mod config;
pub mod engine;
pub mod error;
pub mod fuel;
pub mod io;
pub mod logging;
pub mod model;
pub mod optimize;
pub mod scoring;
pub mod sweep;
pub mod validator;


pub use engine::{evaluate, evaluate_with, ModelConstants, PerformanceResult};
pub use error::{DomainError, DomainResult, GridEntryError, OptimizeError, SweepEntryError};
pub use fuel::{FuelProperties, FuelType};
pub use model::{EngineConfiguration, Geometry, OperatingConditions, ValveSystem, ValveType};
pub use optimize::{optimize, optimize_with, Objective, Optimum, ParameterRange};
pub use scoring::{score, score_engine, ScoredResult};
pub use sweep::{linspace, sensitivity, sweep, sweep_grid, sweep_with, SweepField, SweepResult};
pub use validator::{validate, validate_at, Severity, ValidationLevel, ValidationReport};
