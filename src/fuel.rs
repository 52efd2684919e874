//! Static fuel reference data.
//!
//! The table is compiled into the binary and never mutated; every lookup
//! returns a shared `&'static FuelProperties`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fuels the model has reference data for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Gasoline,
    Propane,
    Hydrogen,
    Kerosene,
}

/// Thermochemical reference record for one fuel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FuelProperties {
    pub name: &'static str,
    /// Lower heating value (MJ/kg)
    pub lower_heating_value_mj_kg: f64,
    /// Stoichiometric air-fuel mass ratio
    pub stoichiometric_afr: f64,
    /// Liquid density, or gas density at STP for hydrogen (kg/L)
    pub density_kg_l: f64,
    /// Average molecular weight (g/mol)
    pub molecular_weight: f64,
    /// Autoignition temperature (°C)
    pub autoignition_temp_c: f64,
    pub flash_point_c: f64,
    pub boiling_point_c: f64,
    /// Adiabatic flame temperature at stoichiometric, ambient start (K)
    pub adiabatic_flame_temp_k: f64,
}

impl FuelProperties {
    /// Lower heating value in J/kg.
    pub fn lower_heating_value_j_kg(&self) -> f64 {
        self.lower_heating_value_mj_kg * 1.0e6
    }
}

static GASOLINE: FuelProperties = FuelProperties {
    name: "gasoline",
    lower_heating_value_mj_kg: 44.0,
    stoichiometric_afr: 14.7,
    density_kg_l: 0.75,
    molecular_weight: 100.0,
    autoignition_temp_c: 280.0,
    flash_point_c: -43.0,
    boiling_point_c: 38.0,
    adiabatic_flame_temp_k: 2300.0,
};

static PROPANE: FuelProperties = FuelProperties {
    name: "propane",
    lower_heating_value_mj_kg: 46.4,
    stoichiometric_afr: 15.7,
    density_kg_l: 0.51,
    molecular_weight: 44.0,
    autoignition_temp_c: 470.0,
    flash_point_c: -104.0,
    boiling_point_c: -42.0,
    adiabatic_flame_temp_k: 2260.0,
};

static HYDROGEN: FuelProperties = FuelProperties {
    name: "hydrogen",
    lower_heating_value_mj_kg: 120.0,
    stoichiometric_afr: 34.3,
    density_kg_l: 0.0899,
    molecular_weight: 2.0,
    autoignition_temp_c: 500.0,
    flash_point_c: -253.0,
    boiling_point_c: -253.0,
    adiabatic_flame_temp_k: 2400.0,
};

static KEROSENE: FuelProperties = FuelProperties {
    name: "kerosene",
    lower_heating_value_mj_kg: 43.2,
    stoichiometric_afr: 15.0,
    density_kg_l: 0.82,
    molecular_weight: 170.0,
    autoignition_temp_c: 210.0,
    flash_point_c: 38.0,
    boiling_point_c: 150.0,
    adiabatic_flame_temp_k: 2290.0,
};

impl FuelType {
    pub const ALL: [FuelType; 4] = [
        FuelType::Gasoline,
        FuelType::Propane,
        FuelType::Hydrogen,
        FuelType::Kerosene,
    ];

    pub fn properties(self) -> &'static FuelProperties {
        match self {
            FuelType::Gasoline => &GASOLINE,
            FuelType::Propane => &PROPANE,
            FuelType::Hydrogen => &HYDROGEN,
            FuelType::Kerosene => &KEROSENE,
        }
    }

    pub fn name(self) -> &'static str {
        self.properties().name
    }
}

impl fmt::Display for FuelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown fuel type '{0}' (expected gasoline, propane, hydrogen or kerosene)")]
pub struct UnknownFuel(pub String);

impl FromStr for FuelType {
    type Err = UnknownFuel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FuelType::ALL
            .into_iter()
            .find(|fuel| fuel.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownFuel(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_fuel_has_positive_reference_data() {
        for fuel in FuelType::ALL {
            let p = fuel.properties();
            assert!(p.lower_heating_value_mj_kg > 0.0, "{fuel}");
            assert!(p.stoichiometric_afr > 0.0, "{fuel}");
            assert!(p.density_kg_l > 0.0, "{fuel}");
            assert!(p.molecular_weight > 0.0, "{fuel}");
            assert!(p.adiabatic_flame_temp_k > 1500.0, "{fuel}");
        }
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Gasoline".parse::<FuelType>(), Ok(FuelType::Gasoline));
        assert_eq!(" HYDROGEN ".parse::<FuelType>(), Ok(FuelType::Hydrogen));
        assert!("diesel".parse::<FuelType>().is_err());
    }

    #[test]
    fn lookups_share_one_record() {
        let a = FuelType::Kerosene.properties() as *const FuelProperties;
        let b = FuelType::Kerosene.properties() as *const FuelProperties;
        assert_eq!(a, b);
    }
}
