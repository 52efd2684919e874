use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::PerformanceResult;
use crate::error::DomainError;

const METRIC_COLUMNS: &str = "frequency_hz,duty_cycle,air_mass_flow_kg_s,fuel_mass_flow_kg_s,\
combustion_temperature_k,exhaust_velocity_m_s,momentum_thrust_n,pressure_thrust_n,thrust_n,\
thermal_efficiency_pct,specific_impulse_s,specific_fuel_consumption_kg_nh,power_kw";
const METRIC_COUNT: usize = 13;

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    Ok(())
}

/// Quote a free-text cell if it contains separators or quotes.
fn escape(cell: &str) -> String {
    if cell.contains([',', '"', '\n']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

pub struct CsvWriter {
    w: BufWriter<File>,
    params: usize,
}

impl CsvWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        ensure_parent(path)?;
        let f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        Ok(Self {
            w: BufWriter::new(f),
            params: 0,
        })
    }

    /// `params` names the input columns written before the metrics.
    pub fn write_header(&mut self, params: &[&str]) -> Result<()> {
        self.params = params.len();
        let mut cols = vec!["case"];
        cols.extend_from_slice(params);
        writeln!(self.w, "{},status,{},error", cols.join(","), METRIC_COLUMNS)?;
        Ok(())
    }

    /// Failed points get `status=failed`, empty metric cells and the error text.
    pub fn write_row(
        &mut self,
        case: &str,
        params: &[f64],
        outcome: Result<&PerformanceResult, &DomainError>,
    ) -> Result<()> {
        debug_assert_eq!(params.len(), self.params);
        write!(self.w, "{}", escape(case))?;
        for p in params {
            write!(self.w, ",{p:.6}")?;
        }
        match outcome {
            Ok(r) => writeln!(
                self.w,
                ",ok,{:.4},{:.4},{:.6e},{:.6e},{:.2},{:.4},{:.6},{:.6},{:.6},{:.6},{:.4},{:.6},{:.6},",
                r.frequency_hz,
                r.duty_cycle,
                r.air_mass_flow_kg_s,
                r.fuel_mass_flow_kg_s,
                r.combustion_temperature_k,
                r.exhaust_velocity_m_s,
                r.momentum_thrust_n,
                r.pressure_thrust_n,
                r.thrust_n,
                r.thermal_efficiency_pct,
                r.specific_impulse_s,
                r.specific_fuel_consumption_kg_nh,
                r.power_kw
            )?,
            Err(e) => writeln!(
                self.w,
                ",failed{},{}",
                ",".repeat(METRIC_COUNT),
                escape(&e.to_string())
            )?,
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.w.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::evaluate;
    use crate::model::EngineConfiguration;

    #[test]
    fn failed_rows_keep_column_count() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out.csv");

        let ok = evaluate(&EngineConfiguration::medium()).unwrap();
        let err = DomainError::NonPositive {
            quantity: "chamber_length",
            value: -1.0,
        };

        let mut w = CsvWriter::create(&path).unwrap();
        w.write_header(&["chamber_length"]).unwrap();
        w.write_row("p0", &[50.0], Ok(&ok)).unwrap();
        w.write_row("p1", &[-1.0], Err(&err)).unwrap();
        w.flush().unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        let width = lines[0].split(',').count();
        assert_eq!(lines[1].split(',').count(), width);
        assert!(lines[2].starts_with("p1,-1.000000,failed,"));
        // error message has no comma, so a plain split still lines up
        assert_eq!(lines[2].split(',').count(), width);
        assert!(lines[2].ends_with("chamber_length must be positive (got -1)"));
    }

    #[test]
    fn escapes_separators() {
        assert_eq!(escape("a,b"), "\"a,b\"");
        assert_eq!(escape("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape("plain"), "plain");
    }
}
