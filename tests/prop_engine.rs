//! Property-based tests for the performance engine and sweep runner.
//!
//! Covers: positivity over the normal design envelope, determinism,
//! linear valve-area scaling, sweep ordering and failure marking.

use proptest::prelude::*;
use pulsejet::{
    evaluate, sweep, validate, EngineConfiguration, FuelType, Geometry, OperatingConditions,
    SweepField, ValveSystem, ValveType,
};

prop_compose! {
    fn geometry()(
        chamber_length in 10.0f64..100.0,
        chamber_diameter in 5.0f64..30.0,
        intake_diameter in 2.0f64..15.0,
        exhaust_diameter in 3.0f64..20.0,
        exhaust_length in 20.0f64..200.0,
    ) -> Geometry {
        Geometry { chamber_length, chamber_diameter, intake_diameter, exhaust_diameter, exhaust_length }
    }
}

prop_compose! {
    fn valves()(
        kind in 0usize..3,
        valve_count in 1u32..12,
        valve_area in 5.0f64..50.0,
    ) -> ValveSystem {
        ValveSystem { valve_type: ValveType::ALL[kind], valve_count, valve_area }
    }
}

prop_compose! {
    /// AFR within ±30% of stoichiometric for the chosen fuel.
    fn operating()(
        fuel in 0usize..4,
        afr_factor in 0.7f64..1.3,
        ambient_temperature in -20.0f64..50.0,
        ambient_pressure in 80.0f64..120.0,
    ) -> OperatingConditions {
        let fuel = FuelType::ALL[fuel];
        OperatingConditions {
            fuel,
            air_fuel_ratio: fuel.properties().stoichiometric_afr * afr_factor,
            ambient_temperature,
            ambient_pressure,
        }
    }
}

prop_compose! {
    fn engine()(geometry in geometry(), valves in valves(), operating in operating()) -> EngineConfiguration {
        EngineConfiguration { geometry, valves, operating }
    }
}

// ── Engine Invariants ───────────────────────────────────────────────

proptest! {
    /// Every engine in the normal envelope evaluates to positive, finite figures.
    #[test]
    fn normal_envelope_is_positive(cfg in engine()) {
        let r = evaluate(&cfg).unwrap();
        for v in [
            r.chamber_volume_l,
            r.frequency_hz,
            r.duty_cycle,
            r.air_mass_flow_kg_s,
            r.fuel_mass_flow_kg_s,
            r.exhaust_velocity_m_s,
            r.thrust_n,
            r.thermal_efficiency_pct,
            r.specific_impulse_s,
            r.specific_fuel_consumption_kg_nh,
            r.power_kw,
        ] {
            prop_assert!(v.is_finite() && v > 0.0);
        }
        prop_assert!(r.duty_cycle <= 0.4);
        prop_assert!(r.combustion_temperature_k > cfg.operating.ambient_temperature_k());
    }

    /// Identical input gives bit-identical output.
    #[test]
    fn evaluation_is_deterministic(cfg in engine()) {
        prop_assert_eq!(evaluate(&cfg), evaluate(&cfg));
    }

    /// Thrust is proportional to valve area at fixed geometry.
    #[test]
    fn thrust_linear_in_valve_area(cfg in engine(), k in 0.5f64..2.0) {
        let mut bigger = cfg;
        bigger.valves.valve_area *= k;
        let a = evaluate(&cfg).unwrap();
        let b = evaluate(&bigger).unwrap();
        prop_assert!((b.thrust_n / a.thrust_n - k).abs() < 1e-9 * k);
    }

    /// A non-positive dimension is always an error finding.
    #[test]
    fn non_positive_length_is_flagged(cfg in engine(), length in -50.0f64..=0.0) {
        let mut bad = cfg;
        bad.geometry.chamber_length = length;
        let report = validate(&bad);
        prop_assert!(report.errors().any(|f| f.field == "chamber_length"));
        prop_assert!(evaluate(&bad).is_err());
    }
}

// ── Sweep Contract ──────────────────────────────────────────────────

proptest! {
    /// One entry per value, in input order, failures marked rather than dropped.
    #[test]
    fn sweep_keeps_order_and_length(values in prop::collection::vec(-50.0f64..150.0, 0..24)) {
        let base = EngineConfiguration::medium();
        let result = sweep(&base, SweepField::ChamberLength, &values);

        prop_assert_eq!(result.len(), values.len());
        prop_assert_eq!(result.values(), values.clone());
        let expected_failures = values.iter().filter(|v| **v <= 0.0).count();
        prop_assert_eq!(result.failures(), expected_failures);

        let thrust = result.series(|r| r.thrust_n);
        for (t, v) in thrust.iter().zip(&values) {
            prop_assert_eq!(t.is_none(), *v <= 0.0);
        }
    }
}
