//! Steady-state, cycle-averaged pulse jet performance model.
//!
//! `evaluate` maps one [`EngineConfiguration`] to one [`PerformanceResult`].
//! The pipeline runs in dependency order: derived geometry, Helmholtz
//! frequency, duty cycle, intake mass flow, combustion and isentropic
//! expansion, thrust, and finally the efficiency figures. Every stage is
//! algebraic; nothing is iterated and nothing is cached between calls.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use tracing::{debug, trace};

use crate::error::{finite, positive, DomainError, DomainResult};
use crate::model::{EngineConfiguration, ValveType};

pub const STANDARD_GRAVITY: f64 = 9.81;

/// Empirical constants of the model. All of them are tunable; the defaults
/// reproduce the reference calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConstants {
    /// Specific gas constant of air and products (J/(kg·K))
    pub gas_constant: f64,
    /// Ratio of specific heats of the combustion products
    pub gamma: f64,
    /// Weight of the flame temperature in the sound-speed gas temperature
    pub combustion_temp_weight: f64,
    /// Helmholtz resonator constant K
    pub helmholtz_constant: f64,
    /// End correction, as a multiple of the intake plus exhaust radius
    pub end_correction: f64,
    pub max_duty_cycle: f64,
    /// duty = min(max_duty_cycle, duty_frequency_scale / f)
    pub duty_frequency_scale: f64,
    pub reed_discharge: f64,
    pub flapper_discharge: f64,
    pub rotary_discharge: f64,
    pub combustion_efficiency: f64,
    /// Equivalence ratio at which the combustion multiplier peaks
    pub peak_equivalence_ratio: f64,
    /// Quadratic fall-off of the multiplier for Φ below the peak
    pub lean_falloff: f64,
    /// Quadratic fall-off of the multiplier for Φ above the peak
    pub rich_falloff: f64,
    /// Mean chamber pressure ratio per unit relative temperature rise
    pub pressure_rise_coefficient: f64,
    /// Pressure thrust as a fraction of momentum thrust when unchoked
    pub unchoked_pressure_fraction: f64,
}

impl Default for ModelConstants {
    fn default() -> Self {
        Self {
            gas_constant: 287.0,
            gamma: 1.33,
            combustion_temp_weight: 0.3,
            helmholtz_constant: 0.95,
            end_correction: 0.6,
            max_duty_cycle: 0.4,
            duty_frequency_scale: 50.0,
            reed_discharge: 0.45,
            flapper_discharge: 0.40,
            rotary_discharge: 0.60,
            combustion_efficiency: 0.8,
            peak_equivalence_ratio: 1.1,
            lean_falloff: 1.6,
            rich_falloff: 0.4,
            pressure_rise_coefficient: 0.008,
            unchoked_pressure_fraction: 0.05,
        }
    }
}

impl ModelConstants {
    pub fn discharge_coefficient(&self, valve: ValveType) -> f64 {
        match valve {
            ValveType::Reed => self.reed_discharge,
            ValveType::Flapper => self.flapper_discharge,
            ValveType::Rotary => self.rotary_discharge,
        }
    }

    /// cp = γR/(γ−1)
    pub fn cp(&self) -> f64 {
        self.gamma * self.gas_constant / (self.gamma - 1.0)
    }

    /// Chamber-to-ambient pressure ratio above which the exhaust chokes.
    pub fn critical_pressure_ratio(&self) -> f64 {
        let g = self.gamma;
        ((g + 1.0) / 2.0).powf(g / (g - 1.0))
    }

    /// Combustion temperature multiplier m(Φ). Peaks at 1 for
    /// Φ = `peak_equivalence_ratio`; not floored.
    pub fn equivalence_multiplier(&self, phi: f64) -> f64 {
        let d = phi - self.peak_equivalence_ratio;
        let k = if d < 0.0 {
            self.lean_falloff
        } else {
            self.rich_falloff
        };
        1.0 - k * d * d
    }

    /// Structural sanity of a hand-edited constant set.
    pub fn check(&self) -> DomainResult<()> {
        positive("gas_constant", self.gas_constant)?;
        positive("gamma_minus_one", self.gamma - 1.0)?;
        finite("combustion_temp_weight", self.combustion_temp_weight)?;
        positive("helmholtz_constant", self.helmholtz_constant)?;
        finite("end_correction", self.end_correction)?;
        positive("max_duty_cycle", self.max_duty_cycle)?;
        positive("duty_frequency_scale", self.duty_frequency_scale)?;
        positive("reed_discharge", self.reed_discharge)?;
        positive("flapper_discharge", self.flapper_discharge)?;
        positive("rotary_discharge", self.rotary_discharge)?;
        positive("combustion_efficiency", self.combustion_efficiency)?;
        finite("peak_equivalence_ratio", self.peak_equivalence_ratio)?;
        finite("lean_falloff", self.lean_falloff)?;
        finite("rich_falloff", self.rich_falloff)?;
        finite("pressure_rise_coefficient", self.pressure_rise_coefficient)?;
        finite("unchoked_pressure_fraction", self.unchoked_pressure_fraction)?;
        Ok(())
    }
}

/// Output of one evaluation. Units are carried in the field names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceResult {
    // derived geometry
    pub chamber_volume_l: f64,
    pub chamber_surface_m2: f64,
    /// Volume-to-surface ratio (m)
    pub volume_to_surface_m: f64,
    pub ld_ratio: f64,
    pub intake_area_cm2: f64,
    pub exhaust_area_cm2: f64,
    /// Exhaust area / intake area
    pub area_ratio: f64,
    /// Valve area / intake area
    pub valve_to_intake_ratio: f64,

    // operating point
    pub average_gas_temperature_k: f64,
    pub sound_speed_m_s: f64,
    pub frequency_hz: f64,
    pub duty_cycle: f64,
    pub equivalence_ratio: f64,
    pub combustion_temperature_k: f64,
    pub chamber_pressure_kpa: f64,
    /// Mean chamber pressure above ambient
    pub pressure_rise_kpa: f64,
    pub exit_temperature_k: f64,
    pub exit_pressure_kpa: f64,
    pub choked: bool,

    // mass flow
    pub air_mass_flow_kg_s: f64,
    pub fuel_mass_flow_kg_s: f64,
    pub total_mass_flow_kg_s: f64,
    pub fuel_consumption_kg_h: f64,

    // propulsion
    pub exhaust_velocity_m_s: f64,
    pub momentum_thrust_n: f64,
    pub pressure_thrust_n: f64,
    pub thrust_n: f64,

    // efficiency
    pub thermal_efficiency_pct: f64,
    pub specific_impulse_s: f64,
    /// kg of fuel per N of thrust per hour
    pub specific_fuel_consumption_kg_nh: f64,
    pub power_kw: f64,
    /// Kinetic power of the exhaust jet
    pub jet_power_kw: f64,
}

/// Evaluate `config` with the default model constants.
pub fn evaluate(config: &EngineConfiguration) -> DomainResult<PerformanceResult> {
    evaluate_with(config, &ModelConstants::default())
}

pub fn evaluate_with(
    config: &EngineConfiguration,
    k: &ModelConstants,
) -> DomainResult<PerformanceResult> {
    let g = &config.geometry;
    let v = &config.valves;
    let op = &config.operating;
    let fuel = op.fuel.properties();

    // 1. Inputs and derived geometry (SI from here on)
    let length = positive("chamber_length", g.chamber_length)? / 100.0;
    let diameter = positive("chamber_diameter", g.chamber_diameter)? / 100.0;
    let intake_d = positive("intake_diameter", g.intake_diameter)? / 100.0;
    let exhaust_d = positive("exhaust_diameter", g.exhaust_diameter)? / 100.0;
    let exhaust_len = positive("exhaust_length", g.exhaust_length)? / 100.0;
    let valve_area = positive("valve_area", v.valve_area)? / 1.0e4;
    positive("valve_count", f64::from(v.valve_count))?;
    let afr = positive("air_fuel_ratio", op.air_fuel_ratio)?;
    let t_amb = positive("ambient_temperature", op.ambient_temperature_k())?;
    let p_amb = positive("ambient_pressure", op.ambient_pressure_pa())?;

    let volume = positive("chamber_volume", PI * (diameter / 2.0).powi(2) * length)?;
    let intake_area = PI * (intake_d / 2.0).powi(2);
    let exhaust_area = PI * (exhaust_d / 2.0).powi(2);
    let surface = g.chamber_surface_m2();

    // 2. Sound speed and Helmholtz frequency
    let w = k.combustion_temp_weight;
    let t_avg = positive(
        "average_gas_temperature",
        (1.0 - w) * t_amb + w * fuel.adiabatic_flame_temp_k,
    )?;
    let sound_speed = positive("sound_speed", (k.gamma * k.gas_constant * t_avg).sqrt())?;
    let effective_length = positive(
        "effective_length",
        exhaust_len + k.end_correction * (intake_d / 2.0 + exhaust_d / 2.0),
    )?;
    let frequency = positive(
        "frequency",
        k.helmholtz_constant * sound_speed / (2.0 * PI)
            * (exhaust_area / (volume * effective_length)).sqrt(),
    )?;

    // 3. Duty cycle
    let duty_cycle = k.max_duty_cycle.min(k.duty_frequency_scale / frequency);

    // 4. Intake mass flow
    let rho_air = p_amb / (k.gas_constant * t_amb);
    let v_char = (2.0 * p_amb / rho_air).sqrt();
    let effective_valve_area = valve_area * k.discharge_coefficient(v.valve_type);
    let air_flow = positive(
        "air_mass_flow",
        rho_air * effective_valve_area * v_char * duty_cycle,
    )?;
    let fuel_flow = positive("fuel_mass_flow", air_flow / afr)?;
    let total_flow = air_flow + fuel_flow;

    // 5. Combustion and isentropic expansion to ambient
    let phi = fuel.stoichiometric_afr / afr;
    let multiplier = k.equivalence_multiplier(phi);
    let t_comb = t_amb + (fuel.adiabatic_flame_temp_k - t_amb) * k.combustion_efficiency * multiplier;
    if !t_comb.is_finite() || t_comb <= t_amb {
        return Err(DomainError::NoTemperatureRise {
            combustion_k: t_comb,
            ambient_k: t_amb,
        });
    }
    let pressure_ratio = positive(
        "pressure_ratio",
        1.0 + k.pressure_rise_coefficient * (t_comb - t_amb) / t_amb,
    )?;
    let p_comb = p_amb * pressure_ratio;
    let t_exit = t_comb * pressure_ratio.powf(-(k.gamma - 1.0) / k.gamma);
    let exhaust_velocity = positive("exhaust_velocity", (2.0 * k.cp() * (t_comb - t_exit)).sqrt())?;

    // 6. Thrust
    let momentum_thrust = total_flow * exhaust_velocity;
    let critical = k.critical_pressure_ratio();
    let choked = pressure_ratio > critical;
    let (p_exit, pressure_thrust) = if choked {
        let p_exit = p_comb / critical;
        (p_exit, (p_exit - p_amb) * exhaust_area)
    } else {
        (p_amb, k.unchoked_pressure_fraction * momentum_thrust)
    };
    let thrust = positive("thrust", momentum_thrust + pressure_thrust)?;

    // 7. Efficiency figures
    let jet_power = 0.5 * total_flow * exhaust_velocity.powi(2);
    let fuel_power = fuel_flow * fuel.lower_heating_value_j_kg();
    let thermal_efficiency = finite("thermal_efficiency", jet_power / fuel_power * 100.0)?;
    let specific_impulse = finite("specific_impulse", thrust / (fuel_flow * STANDARD_GRAVITY))?;
    let sfc = finite("specific_fuel_consumption", fuel_flow * 3600.0 / thrust)?;
    let power = finite("power", thrust * exhaust_velocity / 1000.0)?;

    trace!(
        t_avg,
        sound_speed,
        effective_length,
        phi,
        multiplier,
        pressure_ratio,
        "model intermediates"
    );

    let result = PerformanceResult {
        chamber_volume_l: volume * 1000.0,
        chamber_surface_m2: surface,
        volume_to_surface_m: volume / surface,
        ld_ratio: length / diameter,
        intake_area_cm2: intake_area * 1.0e4,
        exhaust_area_cm2: exhaust_area * 1.0e4,
        area_ratio: exhaust_area / intake_area,
        valve_to_intake_ratio: valve_area / intake_area,
        average_gas_temperature_k: t_avg,
        sound_speed_m_s: sound_speed,
        frequency_hz: frequency,
        duty_cycle,
        equivalence_ratio: phi,
        combustion_temperature_k: t_comb,
        chamber_pressure_kpa: p_comb / 1000.0,
        pressure_rise_kpa: (p_comb - p_amb) / 1000.0,
        exit_temperature_k: t_exit,
        exit_pressure_kpa: p_exit / 1000.0,
        choked,
        air_mass_flow_kg_s: air_flow,
        fuel_mass_flow_kg_s: fuel_flow,
        total_mass_flow_kg_s: total_flow,
        fuel_consumption_kg_h: fuel_flow * 3600.0,
        exhaust_velocity_m_s: exhaust_velocity,
        momentum_thrust_n: momentum_thrust,
        pressure_thrust_n: pressure_thrust,
        thrust_n: thrust,
        thermal_efficiency_pct: thermal_efficiency,
        specific_impulse_s: specific_impulse,
        specific_fuel_consumption_kg_nh: sfc,
        power_kw: power,
        jet_power_kw: jet_power / 1000.0,
    };

    debug!(
        fuel = %op.fuel,
        frequency_hz = result.frequency_hz,
        thrust_n = result.thrust_n,
        efficiency_pct = result.thermal_efficiency_pct,
        choked,
        "evaluated configuration"
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn critical_ratio_for_default_gamma() {
        let k = ModelConstants::default();
        assert_relative_eq!(k.critical_pressure_ratio(), 1.8506, epsilon = 1e-3);
    }

    #[test]
    fn multiplier_peaks_at_reference_phi() {
        let k = ModelConstants::default();
        assert_relative_eq!(k.equivalence_multiplier(1.1), 1.0);
        assert!(k.equivalence_multiplier(0.9) < 1.0);
        assert!(k.equivalence_multiplier(1.3) < 1.0);
        // lean side falls faster than rich side
        assert!(k.equivalence_multiplier(0.9) < k.equivalence_multiplier(1.3));
    }

    #[test]
    fn rotary_valves_breathe_best() {
        let k = ModelConstants::default();
        assert!(k.discharge_coefficient(ValveType::Rotary) > k.discharge_coefficient(ValveType::Reed));
        assert!(k.discharge_coefficient(ValveType::Reed) > k.discharge_coefficient(ValveType::Flapper));
    }

    #[test]
    fn default_constants_pass_check() {
        assert!(ModelConstants::default().check().is_ok());
        let bad = ModelConstants {
            gamma: 1.0,
            ..ModelConstants::default()
        };
        assert!(bad.check().is_err());
    }
}
