//! Advisory engineering-reasonableness checks.
//!
//! `validate` never fails: it returns every finding as data and leaves the
//! decision to halt on errors to the caller. Tolerance levels only move the
//! warning/error thresholds; they have no effect on evaluation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::fuel::FuelType;
use crate::model::{EngineConfiguration, ValveType};

/// Sea-level standard air density (kg/m³).
const SEA_LEVEL_DENSITY: f64 = 1.225;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.field, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub level: ValidationLevel,
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn has_errors(&self) -> bool {
        self.findings.iter().any(|f| f.severity == Severity::Error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings.iter().filter(|f| f.severity == severity).count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Warning)
    }

    pub fn infos(&self) -> impl Iterator<Item = &Finding> {
        self.with_severity(Severity::Info)
    }

    fn with_severity(&self, severity: Severity) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(move |f| f.severity == severity)
    }

    fn push(&mut self, severity: Severity, field: &'static str, message: impl Into<String>) {
        self.findings.push(Finding {
            severity,
            field,
            message: message.into(),
        });
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationLevel {
    Strict,
    #[default]
    Normal,
    Permissive,
}

impl ValidationLevel {
    pub fn name(self) -> &'static str {
        match self {
            ValidationLevel::Strict => "strict",
            ValidationLevel::Normal => "normal",
            ValidationLevel::Permissive => "permissive",
        }
    }

    pub fn thresholds(self) -> Thresholds {
        match self {
            ValidationLevel::Strict => Thresholds::STRICT,
            ValidationLevel::Normal => Thresholds::NORMAL,
            ValidationLevel::Permissive => Thresholds::PERMISSIVE,
        }
    }
}

impl fmt::Display for ValidationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValidationLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ValidationLevel::Strict),
            "normal" => Ok(ValidationLevel::Normal),
            "permissive" => Ok(ValidationLevel::Permissive),
            other => Err(format!(
                "unknown validation level '{other}' (expected strict, normal or permissive)"
            )),
        }
    }
}

/// Inclusive warning band nested inside an inclusive error band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Limit {
    pub warn: (f64, f64),
    pub error: (f64, f64),
}

const fn limit(warn: (f64, f64), error: (f64, f64)) -> Limit {
    Limit { warn, error }
}

/// Threshold table for one tolerance level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Thresholds {
    pub chamber_length: Limit,
    pub chamber_diameter: Limit,
    pub intake_diameter: Limit,
    pub exhaust_diameter: Limit,
    pub exhaust_length: Limit,
    pub valve_count: Limit,
    pub valve_area: Limit,
    pub ambient_pressure: Limit,
    pub ambient_temperature: Limit,
    pub ld_ratio: (f64, f64),
    pub valve_to_intake: (f64, f64),
    /// Relative AFR deviation from stoichiometric (warning, error)
    pub afr_deviation: (f64, f64),
}

impl Thresholds {
    pub const STRICT: Thresholds = Thresholds {
        chamber_length: limit((15.0, 80.0), (10.0, 100.0)),
        chamber_diameter: limit((8.0, 25.0), (5.0, 30.0)),
        intake_diameter: limit((3.0, 12.0), (2.0, 15.0)),
        exhaust_diameter: limit((4.0, 18.0), (3.0, 20.0)),
        exhaust_length: limit((30.0, 150.0), (20.0, 200.0)),
        valve_count: limit((2.0, 8.0), (1.0, 12.0)),
        valve_area: limit((8.0, 40.0), (5.0, 50.0)),
        ambient_pressure: limit((95.0, 110.0), (80.0, 120.0)),
        ambient_temperature: limit((0.0, 40.0), (-20.0, 50.0)),
        ld_ratio: (2.5, 4.5),
        valve_to_intake: (0.9, 1.3),
        afr_deviation: (0.2, 0.4),
    };

    pub const NORMAL: Thresholds = Thresholds {
        chamber_length: limit((10.0, 100.0), (5.0, 200.0)),
        chamber_diameter: limit((5.0, 30.0), (3.0, 50.0)),
        intake_diameter: limit((2.0, 15.0), (1.0, 25.0)),
        exhaust_diameter: limit((3.0, 20.0), (2.0, 40.0)),
        exhaust_length: limit((20.0, 200.0), (10.0, 300.0)),
        valve_count: limit((1.0, 12.0), (1.0, 20.0)),
        valve_area: limit((5.0, 50.0), (2.0, 100.0)),
        ambient_pressure: limit((80.0, 120.0), (50.0, 150.0)),
        ambient_temperature: limit((-20.0, 50.0), (-50.0, 80.0)),
        ld_ratio: (2.0, 5.0),
        valve_to_intake: (0.8, 1.5),
        afr_deviation: (0.3, 0.6),
    };

    pub const PERMISSIVE: Thresholds = Thresholds {
        chamber_length: limit((5.0, 200.0), (2.5, 400.0)),
        chamber_diameter: limit((3.0, 50.0), (1.5, 100.0)),
        intake_diameter: limit((1.0, 25.0), (0.5, 50.0)),
        exhaust_diameter: limit((2.0, 40.0), (1.0, 80.0)),
        exhaust_length: limit((10.0, 300.0), (5.0, 600.0)),
        valve_count: limit((1.0, 20.0), (1.0, 40.0)),
        valve_area: limit((2.0, 100.0), (1.0, 200.0)),
        ambient_pressure: limit((50.0, 150.0), (25.0, 300.0)),
        ambient_temperature: limit((-50.0, 80.0), (-75.0, 120.0)),
        ld_ratio: (1.5, 6.0),
        valve_to_intake: (0.6, 2.0),
        afr_deviation: (0.5, 0.9),
    };
}

/// Validate at the default (normal) level.
pub fn validate(config: &EngineConfiguration) -> ValidationReport {
    validate_at(config, ValidationLevel::Normal)
}

pub fn validate_at(config: &EngineConfiguration, level: ValidationLevel) -> ValidationReport {
    let t = level.thresholds();
    let g = &config.geometry;
    let v = &config.valves;
    let op = &config.operating;
    let mut report = ValidationReport {
        level,
        findings: Vec::new(),
    };

    // Ranged inputs. Non-positive dimensions are errors at every level.
    let dims = [
        ("chamber_length", g.chamber_length, t.chamber_length, "cm"),
        ("chamber_diameter", g.chamber_diameter, t.chamber_diameter, "cm"),
        ("intake_diameter", g.intake_diameter, t.intake_diameter, "cm"),
        ("exhaust_diameter", g.exhaust_diameter, t.exhaust_diameter, "cm"),
        ("exhaust_length", g.exhaust_length, t.exhaust_length, "cm"),
        ("valve_count", f64::from(v.valve_count), t.valve_count, ""),
        ("valve_area", v.valve_area, t.valve_area, "cm²"),
    ];
    let mut geometry_ok = true;
    for (field, value, lim, unit) in dims {
        if !value.is_finite() || value <= 0.0 {
            geometry_ok = false;
            report.push(Severity::Error, field, format!("must be a positive number (got {value})"));
        } else {
            check_range(&mut report, field, value, lim, unit);
        }
    }
    let afr_ok = op.air_fuel_ratio.is_finite() && op.air_fuel_ratio > 0.0;
    if !afr_ok {
        report.push(
            Severity::Error,
            "air_fuel_ratio",
            format!("must be a positive number (got {})", op.air_fuel_ratio),
        );
    }
    let ambient_ok = op.ambient_pressure > 0.0 && op.ambient_temperature_k() > 0.0;
    if op.ambient_pressure.is_finite() && op.ambient_pressure > 0.0 {
        check_range(&mut report, "ambient_pressure", op.ambient_pressure, t.ambient_pressure, "kPa");
    } else {
        report.push(
            Severity::Error,
            "ambient_pressure",
            format!("must be a positive number (got {})", op.ambient_pressure),
        );
    }
    if op.ambient_temperature.is_finite() && op.ambient_temperature_k() > 0.0 {
        check_range(
            &mut report,
            "ambient_temperature",
            op.ambient_temperature,
            t.ambient_temperature,
            "°C",
        );
    } else {
        report.push(
            Severity::Error,
            "ambient_temperature",
            format!("must be above absolute zero (got {} °C)", op.ambient_temperature),
        );
    }

    // Derived ratios only make sense on positive geometry.
    if geometry_ok {
        check_geometry(&mut report, config, &t);
        check_valves(&mut report, config);
    }

    if afr_ok {
        let stoich = op.fuel.properties().stoichiometric_afr;
        let deviation = (op.air_fuel_ratio - stoich).abs() / stoich;
        let (warn, error) = t.afr_deviation;
        let message = format!(
            "AFR {:.2} is {:.0}% from stoichiometric {:.1} for {}",
            op.air_fuel_ratio,
            deviation * 100.0,
            stoich,
            op.fuel
        );
        if deviation > error {
            report.push(Severity::Error, "air_fuel_ratio", format!("{message}; outside flammability limits"));
        } else {
            if deviation > warn {
                report.push(Severity::Warning, "air_fuel_ratio", format!("{message}; near flammability limits"));
            }
            if let Some((lo, hi)) = combustible_afr(op.fuel) {
                if op.air_fuel_ratio < lo || op.air_fuel_ratio > hi {
                    report.push(
                        Severity::Error,
                        "air_fuel_ratio",
                        format!(
                            "AFR {:.2} is outside the combustible limits for {} ({lo}-{hi})",
                            op.air_fuel_ratio, op.fuel
                        ),
                    );
                }
            }
        }
    }

    if ambient_ok {
        let rho = op.ambient_pressure_pa() / (287.0 * op.ambient_temperature_k());
        if rho / SEA_LEVEL_DENSITY < 0.8 {
            report.push(
                Severity::Warning,
                "ambient_pressure",
                format!(
                    "air density {:.3} kg/m³ is {:.0}% of sea level; expect reduced performance",
                    rho,
                    rho / SEA_LEVEL_DENSITY * 100.0
                ),
            );
        }
    }

    if geometry_ok && op.ambient_temperature < 0.0 && g.exhaust_length > 150.0 {
        report.push(
            Severity::Info,
            "exhaust_length",
            format!(
                "{} cm exhaust at {} °C may collect condensation",
                g.exhaust_length, op.ambient_temperature
            ),
        );
    }

    if op.fuel == FuelType::Hydrogen {
        if v.valve_type == ValveType::Reed {
            report.push(
                Severity::Info,
                "valve_type",
                "hydrogen flame speed may require faster valve response than reeds provide",
            );
        }
        if geometry_ok && g.chamber_volume_l() > 5.0 {
            report.push(
                Severity::Warning,
                "fuel",
                format!(
                    "hydrogen in a {:.1} L chamber needs extra safety precautions",
                    g.chamber_volume_l()
                ),
            );
        }
    }

    if geometry_ok {
        check_safety(&mut report, config);
        check_manufacturing(&mut report, config);
    }

    report
}

/// Combustible air-fuel band per fuel, where one is tabulated.
pub fn combustible_afr(fuel: FuelType) -> Option<(f64, f64)> {
    match fuel {
        FuelType::Gasoline => Some((8.0, 25.0)),
        FuelType::Propane => Some((10.0, 30.0)),
        FuelType::Hydrogen => Some((15.0, 100.0)),
        FuelType::Kerosene => None,
    }
}

/// Rough organ-pipe estimate of the firing frequency (Hz) from the exhaust
/// and chamber lengths (cm). Used only for feasibility screening.
fn rough_frequency(exhaust_length: f64, chamber_length: f64) -> f64 {
    15000.0 / (exhaust_length * chamber_length).sqrt()
}

fn check_range(report: &mut ValidationReport, field: &'static str, value: f64, lim: Limit, unit: &str) {
    let (emin, emax) = lim.error;
    let (wmin, wmax) = lim.warn;
    let unit = if unit.is_empty() { String::new() } else { format!(" {unit}") };
    if value < emin || value > emax {
        report.push(
            Severity::Error,
            field,
            format!("{value}{unit} is outside the accepted range [{emin}, {emax}]"),
        );
    } else if value < wmin || value > wmax {
        report.push(
            Severity::Warning,
            field,
            format!("{value}{unit} is outside the typical range [{wmin}, {wmax}]"),
        );
    }
}

fn check_geometry(report: &mut ValidationReport, config: &EngineConfiguration, t: &Thresholds) {
    let g = &config.geometry;

    let ld = g.ld_ratio();
    let (ld_min, ld_max) = t.ld_ratio;
    if ld < ld_min {
        report.push(
            Severity::Warning,
            "chamber_length",
            format!("L/D ratio {ld:.2} below {ld_min}; incomplete combustion likely"),
        );
    } else if ld > ld_max {
        report.push(
            Severity::Warning,
            "chamber_length",
            format!("L/D ratio {ld:.2} above {ld_max}; excessive heat loss likely"),
        );
    }

    if g.intake_diameter >= g.chamber_diameter {
        report.push(
            Severity::Error,
            "intake_diameter",
            format!(
                "intake diameter {} cm must be smaller than chamber diameter {} cm",
                g.intake_diameter, g.chamber_diameter
            ),
        );
    }
    if g.exhaust_diameter > 1.2 * g.chamber_diameter {
        report.push(
            Severity::Warning,
            "exhaust_diameter",
            format!(
                "exhaust diameter {} cm is much larger than chamber diameter {} cm",
                g.exhaust_diameter, g.chamber_diameter
            ),
        );
    }

    let pipe_ld = g.exhaust_length / g.exhaust_diameter;
    if !(3.0..=20.0).contains(&pipe_ld) {
        report.push(
            Severity::Warning,
            "exhaust_length",
            format!("exhaust pipe L/D {pipe_ld:.1} outside [3, 20]; poor acoustic tuning"),
        );
    }

    let volume = g.chamber_volume_l();
    if volume < 0.05 {
        report.push(
            Severity::Warning,
            "chamber_volume",
            format!("chamber volume {volume:.3} L is very small; ignition may be unreliable"),
        );
    } else if volume > 50.0 {
        report.push(
            Severity::Warning,
            "chamber_volume",
            format!("chamber volume {volume:.1} L is very large; ignition may be unreliable"),
        );
    }

    let surface_to_volume = g.chamber_surface_m2() * 1.0e4 / volume;
    if surface_to_volume > 2000.0 {
        report.push(
            Severity::Warning,
            "chamber_volume",
            format!("surface/volume {surface_to_volume:.0} cm²/L is high; excessive heat loss likely"),
        );
    } else if surface_to_volume < 200.0 {
        report.push(
            Severity::Info,
            "chamber_volume",
            format!("surface/volume {surface_to_volume:.0} cm²/L is low; wall heat transfer will be poor"),
        );
    }

    let count = config.valves.valve_count;
    if volume < 0.5 && count > 6 {
        report.push(
            Severity::Warning,
            "valve_count",
            format!("{count} valves on a {volume:.2} L chamber will be hard to package"),
        );
    } else if volume > 10.0 && count < 4 {
        report.push(
            Severity::Warning,
            "valve_count",
            format!("{count} valve(s) on a {volume:.1} L chamber may restrict breathing"),
        );
    }

    let rough_f = rough_frequency(g.exhaust_length, g.chamber_length + g.exhaust_length / 3.0);
    if rough_f < 10.0 {
        report.push(
            Severity::Warning,
            "exhaust_length",
            format!("estimated frequency {rough_f:.0} Hz is too low to sustain pulsing"),
        );
    } else if rough_f > 500.0 {
        report.push(
            Severity::Warning,
            "exhaust_length",
            format!("estimated frequency {rough_f:.0} Hz is very high"),
        );
    }
    if volume * 20.0 < 5.0 {
        report.push(
            Severity::Info,
            "chamber_volume",
            format!("a {volume:.2} L chamber will produce very little thrust"),
        );
    }

    if ld > 6.0 && g.area_ratio() < 1.2 {
        report.push(
            Severity::Warning,
            "exhaust_diameter",
            format!("long chamber (L/D {ld:.1}) with a small exhaust scavenges poorly"),
        );
    }

    let valve_ratio = config.valves.valve_area / g.intake_area_cm2();
    let (vr_min, vr_max) = t.valve_to_intake;
    if valve_ratio < vr_min {
        report.push(
            Severity::Warning,
            "valve_area",
            format!("valve/intake area ratio {valve_ratio:.2} below {vr_min}; breathing restricted"),
        );
    } else if valve_ratio > vr_max {
        report.push(
            Severity::Warning,
            "valve_area",
            format!("valve/intake area ratio {valve_ratio:.2} above {vr_max}; valve area oversized"),
        );
    }

    let area_ratio = g.area_ratio();
    if !(1.2..=2.5).contains(&area_ratio) {
        report.push(
            Severity::Info,
            "exhaust_diameter",
            format!("exhaust/intake area ratio {area_ratio:.2} outside the usual [1.2, 2.5]"),
        );
    }
}

fn check_valves(report: &mut ValidationReport, config: &EngineConfiguration) {
    let v = &config.valves;
    let per_valve = v.area_per_valve_cm2();
    if per_valve < 1.0 {
        report.push(
            Severity::Error,
            "valve_area",
            format!("{per_valve:.2} cm² per valve is impractically small"),
        );
    } else if per_valve < 2.0 {
        report.push(
            Severity::Warning,
            "valve_area",
            format!("{per_valve:.2} cm² per valve is hard to manufacture"),
        );
    } else if per_valve > 25.0 {
        report.push(
            Severity::Warning,
            "valve_area",
            format!("{per_valve:.1} cm² per valve is very large; structural problems likely"),
        );
    } else if per_valve > 20.0 {
        report.push(
            Severity::Warning,
            "valve_area",
            format!("{per_valve:.1} cm² per valve is large; check petal stiffness"),
        );
    }

    match v.valve_type {
        ValveType::Reed => {
            if v.valve_count > 12 {
                report.push(
                    Severity::Warning,
                    "valve_count",
                    format!("{} reed valves is unusually many", v.valve_count),
                );
            } else if v.valve_count < 2 {
                report.push(Severity::Info, "valve_count", "single reed valve may limit airflow");
            }
            if per_valve > 15.0 {
                report.push(
                    Severity::Warning,
                    "valve_area",
                    format!("{per_valve:.1} cm² per reed valve is large; petals may flutter"),
                );
            }
        }
        ValveType::Flapper => {
            if v.valve_count > 6 {
                report.push(
                    Severity::Warning,
                    "valve_count",
                    format!("{} flapper valves is unusually many", v.valve_count),
                );
            }
            if per_valve < 5.0 {
                report.push(
                    Severity::Info,
                    "valve_area",
                    format!("{per_valve:.1} cm² per flapper valve is small"),
                );
            }
        }
        ValveType::Rotary => {
            if v.valve_count > 2 {
                report.push(
                    Severity::Warning,
                    "valve_count",
                    format!("{} rotary valves is mechanically complex", v.valve_count),
                );
            } else if v.valve_count > 1 {
                report.push(Severity::Info, "valve_count", "rotary systems usually use a single valve");
            }
        }
    }
}

/// Fire, pressure and structural hazards.
fn check_safety(report: &mut ValidationReport, config: &EngineConfiguration) {
    let g = &config.geometry;
    let op = &config.operating;
    let volume = g.chamber_volume_l();

    match op.fuel {
        FuelType::Hydrogen => {
            if volume > 2.0 {
                report.push(
                    Severity::Error,
                    "fuel",
                    format!("{volume:.1} L hydrogen chamber is an explosion risk"),
                );
            }
            report.push(Severity::Warning, "fuel", "hydrogen needs special handling and ventilation");
        }
        FuelType::Gasoline | FuelType::Kerosene if volume > 20.0 => {
            report.push(
                Severity::Warning,
                "chamber_volume",
                format!("{volume:.1} L chamber with liquid fuel is a fire risk"),
            );
        }
        _ => {}
    }

    if op.ambient_pressure > 110.0 {
        report.push(
            Severity::Warning,
            "ambient_pressure",
            "operation above 110 kPa may exceed structural design limits",
        );
    }
    if op.ambient_temperature > 50.0 {
        report.push(
            Severity::Warning,
            "ambient_temperature",
            "operation above 50 °C may overheat the valves",
        );
    }

    let rough_f = rough_frequency(g.exhaust_length, g.chamber_length);
    if rough_f > 300.0 {
        report.push(
            Severity::Warning,
            "exhaust_length",
            format!("estimated {rough_f:.0} Hz firing rate risks fatigue failure"),
        );
    }
    if g.exhaust_length > 200.0 {
        report.push(
            Severity::Warning,
            "exhaust_length",
            "very long exhaust is hard to mount and prone to vibration",
        );
    }
}

/// Fabrication concerns for sheet-metal construction.
fn check_manufacturing(report: &mut ValidationReport, config: &EngineConfiguration) {
    let g = &config.geometry;
    let v = &config.valves;

    let (small_field, small) = if g.intake_diameter <= g.exhaust_diameter {
        ("intake_diameter", g.intake_diameter)
    } else {
        ("exhaust_diameter", g.exhaust_diameter)
    };
    if small < 5.0 {
        report.push(
            Severity::Warning,
            small_field,
            format!("{small} cm diameter is difficult to form accurately"),
        );
    }

    if g.chamber_diameter > 30.0 {
        report.push(
            Severity::Info,
            "chamber_diameter",
            "large chamber diameter needs thicker walls; expect extra weight",
        );
    } else if g.chamber_diameter < 10.0 {
        report.push(
            Severity::Info,
            "chamber_diameter",
            "small chamber diameter requires tight fabrication tolerances",
        );
    }

    if g.ld_ratio() > 8.0 {
        report.push(
            Severity::Warning,
            "chamber_length",
            format!("L/D {:.1} chamber is difficult to fabricate", g.ld_ratio()),
        );
    }

    if v.valve_count > 10 {
        report.push(
            Severity::Info,
            "valve_count",
            format!("{} valves add manufacturing cost", v.valve_count),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_nest_their_bands() {
        for level in [ValidationLevel::Strict, ValidationLevel::Normal, ValidationLevel::Permissive] {
            let t = level.thresholds();
            for lim in [
                t.chamber_length,
                t.chamber_diameter,
                t.intake_diameter,
                t.exhaust_diameter,
                t.exhaust_length,
                t.valve_count,
                t.valve_area,
                t.ambient_pressure,
                t.ambient_temperature,
            ] {
                assert!(lim.error.0 <= lim.warn.0 && lim.warn.1 <= lim.error.1, "{level}: {lim:?}");
            }
            assert!(t.afr_deviation.0 < t.afr_deviation.1);
        }
    }

    #[test]
    fn level_parses() {
        assert_eq!("Strict".parse::<ValidationLevel>(), Ok(ValidationLevel::Strict));
        assert!("lenient".parse::<ValidationLevel>().is_err());
        assert_eq!(ValidationLevel::default(), ValidationLevel::Normal);
    }

    #[test]
    fn zero_length_is_an_error_and_skips_ratios() {
        let mut cfg = EngineConfiguration::medium();
        cfg.geometry.chamber_diameter = 0.0;
        let report = validate(&cfg);
        assert!(report.has_errors());
        assert!(report.errors().any(|f| f.field == "chamber_diameter"));
        assert!(!report.findings.iter().any(|f| f.message.contains("L/D")));
    }

    fn has(report: &ValidationReport, severity: Severity, field: &str, needle: &str) -> bool {
        report
            .findings
            .iter()
            .any(|f| f.severity == severity && f.field == field && f.message.contains(needle))
    }

    #[test]
    fn gasoline_outside_combustible_band_is_error() {
        let mut cfg = EngineConfiguration::medium();
        cfg.operating.air_fuel_ratio = 7.8;
        let report = validate(&cfg);
        assert!(has(&report, Severity::Error, "air_fuel_ratio", "combustible"));

        cfg.operating.air_fuel_ratio = 8.5;
        let report = validate(&cfg);
        assert!(has(&report, Severity::Warning, "air_fuel_ratio", "flammability"));
        assert!(!report.errors().any(|f| f.field == "air_fuel_ratio"));
    }

    #[test]
    fn kerosene_has_no_combustible_band() {
        assert_eq!(combustible_afr(FuelType::Kerosene), None);
        assert_eq!(combustible_afr(FuelType::Hydrogen), Some((15.0, 100.0)));
    }

    #[test]
    fn tiny_valves_are_errors() {
        let mut cfg = EngineConfiguration::medium();
        cfg.valves.valve_count = 12;
        cfg.valves.valve_area = 6.0;
        let report = validate(&cfg);
        assert!(has(&report, Severity::Error, "valve_area", "per valve"));

        cfg.valves.valve_count = 2;
        cfg.valves.valve_area = 44.0;
        let report = validate(&cfg);
        assert!(has(&report, Severity::Warning, "valve_area", "per valve is large"));
    }

    #[test]
    fn surface_to_volume_bands() {
        let mut thin = EngineConfiguration::medium();
        thin.geometry.chamber_length = 20.0;
        thin.geometry.chamber_diameter = 2.0;
        thin.geometry.intake_diameter = 1.0;
        thin.geometry.exhaust_diameter = 1.5;
        thin.geometry.exhaust_length = 20.0;
        assert!(has(&validate(&thin), Severity::Warning, "chamber_volume", "surface/volume"));

        let mut fat = EngineConfiguration::large();
        fat.geometry.chamber_length = 100.0;
        fat.geometry.chamber_diameter = 30.0;
        assert!(has(&validate(&fat), Severity::Info, "chamber_volume", "surface/volume"));

        assert!(!has(&validate(&EngineConfiguration::medium()), Severity::Warning, "chamber_volume", "surface"));
    }

    #[test]
    fn valve_count_follows_chamber_size() {
        let mut small = EngineConfiguration::medium();
        small.geometry.chamber_length = 9.0;
        small.geometry.chamber_diameter = 8.0;
        small.geometry.intake_diameter = 5.0;
        small.valves.valve_count = 8;
        assert!(has(&validate(&small), Severity::Warning, "valve_count", "package"));

        let mut large = EngineConfiguration::large();
        large.valves.valve_count = 2;
        assert!(has(&validate(&large), Severity::Warning, "valve_count", "restrict"));
    }

    #[test]
    fn cold_long_exhaust_is_info() {
        let mut cfg = EngineConfiguration::medium();
        cfg.operating.ambient_temperature = -5.0;
        cfg.geometry.exhaust_length = 160.0;
        assert!(has(&validate(&cfg), Severity::Info, "exhaust_length", "condensation"));

        cfg.operating.ambient_temperature = 5.0;
        assert!(!has(&validate(&cfg), Severity::Info, "exhaust_length", "condensation"));
    }

    #[test]
    fn long_chamber_with_small_exhaust_warns() {
        let mut cfg = EngineConfiguration::medium();
        cfg.geometry.chamber_length = 100.0;
        cfg.geometry.exhaust_diameter = 8.0;
        assert!(has(&validate(&cfg), Severity::Warning, "exhaust_diameter", "scavenges"));
    }

    #[test]
    fn hydrogen_safety_findings() {
        let cfg = EngineConfiguration::medium().with_fuel(FuelType::Hydrogen);
        let report = validate(&cfg);
        assert!(has(&report, Severity::Error, "fuel", "explosion"));
        assert!(has(&report, Severity::Warning, "fuel", "ventilation"));
        assert!(has(&report, Severity::Info, "valve_type", "hydrogen"));
    }

    #[test]
    fn small_hobby_manufacturing_notes_without_errors() {
        let report = validate(&EngineConfiguration::small_hobby());
        assert!(!report.has_errors(), "{:?}", report.findings);
        assert!(has(&report, Severity::Warning, "intake_diameter", "difficult to form"));
        assert!(has(&report, Severity::Info, "chamber_diameter", "tolerances"));
        assert!(has(&report, Severity::Warning, "exhaust_length", "fatigue"));
    }

    #[test]
    fn rotary_pair_is_info_only() {
        let mut cfg = EngineConfiguration::medium();
        cfg.valves.valve_type = ValveType::Rotary;
        cfg.valves.valve_count = 2;
        let report = validate(&cfg);
        assert!(report
            .infos()
            .any(|f| f.field == "valve_count" && f.message.contains("rotary")));
    }
}
