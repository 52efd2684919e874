//! Engine configuration: geometry, valve system and operating conditions.
//!
//! Inputs use workshop units: lengths in cm, valve area in cm², ambient
//! temperature in °C and pressure in kPa.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::fuel::FuelType;

pub const CELSIUS_TO_KELVIN: f64 = 273.15;

/// Area of a circle of diameter `d` (same unit family, squared).
pub fn circle_area(d: f64) -> f64 {
    PI * (d / 2.0).powi(2)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// Combustion chamber length (cm)
    pub chamber_length: f64,
    /// Combustion chamber diameter (cm)
    pub chamber_diameter: f64,
    /// Intake diameter (cm)
    pub intake_diameter: f64,
    /// Exhaust pipe diameter (cm)
    pub exhaust_diameter: f64,
    /// Exhaust pipe length (cm)
    pub exhaust_length: f64,
}

impl Geometry {
    /// Chamber volume in cm³.
    pub fn chamber_volume_cm3(&self) -> f64 {
        circle_area(self.chamber_diameter) * self.chamber_length
    }

    /// Chamber volume in litres.
    pub fn chamber_volume_l(&self) -> f64 {
        self.chamber_volume_cm3() / 1000.0
    }

    pub fn intake_area_cm2(&self) -> f64 {
        circle_area(self.intake_diameter)
    }

    pub fn exhaust_area_cm2(&self) -> f64 {
        circle_area(self.exhaust_diameter)
    }

    pub fn ld_ratio(&self) -> f64 {
        self.chamber_length / self.chamber_diameter
    }

    /// Exhaust-to-intake area ratio.
    pub fn area_ratio(&self) -> f64 {
        self.exhaust_area_cm2() / self.intake_area_cm2()
    }

    /// Closed-cylinder chamber surface (both end caps) in m².
    pub fn chamber_surface_m2(&self) -> f64 {
        let r = self.chamber_diameter / 200.0;
        let l = self.chamber_length / 100.0;
        2.0 * PI * r * r + 2.0 * PI * r * l
    }

    /// Returns a copy with every linear dimension multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            chamber_length: self.chamber_length * factor,
            chamber_diameter: self.chamber_diameter * factor,
            intake_diameter: self.intake_diameter * factor,
            exhaust_diameter: self.exhaust_diameter * factor,
            exhaust_length: self.exhaust_length * factor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValveType {
    Reed,
    Flapper,
    Rotary,
}

impl ValveType {
    pub const ALL: [ValveType; 3] = [ValveType::Reed, ValveType::Flapper, ValveType::Rotary];

    pub fn name(self) -> &'static str {
        match self {
            ValveType::Reed => "reed",
            ValveType::Flapper => "flapper",
            ValveType::Rotary => "rotary",
        }
    }
}

impl fmt::Display for ValveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValveType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValveType::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown valve type '{s}' (expected reed, flapper or rotary)"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValveSystem {
    pub valve_type: ValveType,
    pub valve_count: u32,
    /// Total open valve area (cm²)
    pub valve_area: f64,
}

impl ValveSystem {
    pub fn area_per_valve_cm2(&self) -> f64 {
        self.valve_area / self.valve_count as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OperatingConditions {
    pub fuel: FuelType,
    pub air_fuel_ratio: f64,
    /// Ambient temperature (°C)
    pub ambient_temperature: f64,
    /// Ambient pressure (kPa)
    pub ambient_pressure: f64,
}

impl OperatingConditions {
    pub fn ambient_temperature_k(&self) -> f64 {
        self.ambient_temperature + CELSIUS_TO_KELVIN
    }

    pub fn ambient_pressure_pa(&self) -> f64 {
        self.ambient_pressure * 1000.0
    }

    /// Φ = stoichiometric AFR / actual AFR.
    pub fn equivalence_ratio(&self) -> f64 {
        self.fuel.properties().stoichiometric_afr / self.air_fuel_ratio
    }
}

/// One complete engine definition. Immutable for the duration of an
/// evaluation; sweeps derive modified copies instead of mutating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EngineConfiguration {
    pub geometry: Geometry,
    pub valves: ValveSystem,
    pub operating: OperatingConditions,
}

impl EngineConfiguration {
    /// Compact design for RC aircraft.
    pub fn small_hobby() -> Self {
        Self {
            geometry: Geometry {
                chamber_length: 30.0,
                chamber_diameter: 8.0,
                intake_diameter: 4.0,
                exhaust_diameter: 5.0,
                exhaust_length: 40.0,
            },
            valves: ValveSystem {
                valve_type: ValveType::Reed,
                valve_count: 2,
                valve_area: 8.0,
            },
            operating: OperatingConditions::standard(FuelType::Gasoline),
        }
    }

    /// Balanced design for general applications.
    pub fn medium() -> Self {
        Self {
            geometry: Geometry {
                chamber_length: 50.0,
                chamber_diameter: 15.0,
                intake_diameter: 8.0,
                exhaust_diameter: 10.0,
                exhaust_length: 80.0,
            },
            valves: ValveSystem {
                valve_type: ValveType::Reed,
                valve_count: 4,
                valve_area: 20.0,
            },
            operating: OperatingConditions::standard(FuelType::Gasoline),
        }
    }

    pub fn large() -> Self {
        Self {
            geometry: Geometry {
                chamber_length: 80.0,
                chamber_diameter: 25.0,
                intake_diameter: 12.0,
                exhaust_diameter: 16.0,
                exhaust_length: 120.0,
            },
            valves: ValveSystem {
                valve_type: ValveType::Reed,
                valve_count: 8,
                valve_area: 40.0,
            },
            operating: OperatingConditions::standard(FuelType::Gasoline),
        }
    }

    /// Same engine with all linear dimensions scaled by `factor` and the
    /// valve area scaled by `factor²`.
    pub fn scaled(&self, factor: f64) -> Self {
        let mut scaled = *self;
        scaled.geometry = self.geometry.scaled(factor);
        scaled.valves.valve_area = self.valves.valve_area * factor * factor;
        scaled
    }

    /// Same engine on another fuel, keeping the equivalence ratio.
    pub fn with_fuel(&self, fuel: FuelType) -> Self {
        let phi = self.operating.equivalence_ratio();
        let mut other = *self;
        other.operating.fuel = fuel;
        other.operating.air_fuel_ratio = fuel.properties().stoichiometric_afr / phi;
        other
    }
}

impl OperatingConditions {
    /// Stoichiometric mixture at 20 °C, 101.3 kPa.
    pub fn standard(fuel: FuelType) -> Self {
        Self {
            fuel,
            air_fuel_ratio: fuel.properties().stoichiometric_afr,
            ambient_temperature: 20.0,
            ambient_pressure: 101.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn derived_geometry_matches_hand_values() {
        let g = EngineConfiguration::medium().geometry;
        assert_relative_eq!(g.chamber_volume_l(), PI * 7.5 * 7.5 * 50.0 / 1000.0, max_relative = 1e-12);
        assert_relative_eq!(g.ld_ratio(), 50.0 / 15.0);
        assert_relative_eq!(g.area_ratio(), 100.0 / 64.0, max_relative = 1e-12);
    }

    #[test]
    fn scaling_preserves_ratios() {
        let base = EngineConfiguration::medium();
        let big = base.scaled(2.0);
        assert_relative_eq!(big.geometry.ld_ratio(), base.geometry.ld_ratio(), max_relative = 1e-12);
        assert_relative_eq!(big.valves.valve_area, 4.0 * base.valves.valve_area);
        assert_relative_eq!(
            big.geometry.chamber_volume_l(),
            8.0 * base.geometry.chamber_volume_l(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn fuel_swap_keeps_equivalence_ratio() {
        let mut cfg = EngineConfiguration::medium();
        cfg.operating.air_fuel_ratio = 13.5;
        let h2 = cfg.with_fuel(FuelType::Hydrogen);
        assert_relative_eq!(
            h2.operating.equivalence_ratio(),
            cfg.operating.equivalence_ratio(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn valve_type_parses() {
        assert_eq!("Reed".parse::<ValveType>(), Ok(ValveType::Reed));
        assert!("poppet".parse::<ValveType>().is_err());
    }
}
