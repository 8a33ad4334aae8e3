//! Export helpers for CSV and JSON artifacts.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

pub mod solution {
    use std::io::Write;

    use serde_json::to_writer_pretty;
    use sizing_model::{Solution, SolutionValue};

    use super::ExportError;

    /// Full solution as pretty JSON. Untouched vector elements are written as `null`.
    pub fn write_json(writer: &mut dyn Write, solution: &Solution) -> Result<(), ExportError> {
        to_writer_pretty(&mut *writer, solution)?;
        writeln!(writer)?;
        Ok(())
    }

    /// One row per scalar or vector element: `name,index,value,unit,label`.
    pub fn write_csv(writer: &mut dyn Write, solution: &Solution) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["name", "index", "value", "unit", "label"])?;
        for (name, entry) in &solution.values {
            match &entry.value {
                SolutionValue::Scalar(v) => {
                    let value = v.to_string();
                    csv.write_record([
                        name.as_str(),
                        "",
                        value.as_str(),
                        entry.unit.as_str(),
                        entry.label.as_str(),
                    ])?;
                }
                SolutionValue::Vector(values) => {
                    for (i, v) in values.iter().enumerate() {
                        let index = i.to_string();
                        let value = v.to_string();
                        csv.write_record([
                            name.as_str(),
                            index.as_str(),
                            value.as_str(),
                            entry.unit.as_str(),
                            entry.label.as_str(),
                        ])?;
                    }
                }
            }
        }
        csv.flush()?;
        Ok(())
    }

    /// Constraint sensitivities sorted by decreasing magnitude.
    pub fn write_sensitivities(
        writer: &mut dyn Write,
        solution: &Solution,
    ) -> Result<(), ExportError> {
        let mut rows: Vec<(&String, f64)> =
            solution.sensitivities.iter().map(|(k, v)| (k, *v)).collect();
        rows.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record(["constraint", "sensitivity"])?;
        for (name, value) in rows {
            csv.write_record([name.clone(), value.to_string()])?;
        }
        csv.flush()?;
        Ok(())
    }
}

pub mod table {
    use std::io::Write;

    use serde::Serialize;

    use super::ExportError;

    /// Serialize rows as CSV with a header taken from the field names.
    pub fn write_rows<T: Serialize>(writer: &mut dyn Write, rows: &[T]) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        for row in rows {
            csv.serialize(row)?;
        }
        csv.flush()?;
        Ok(())
    }
}

pub mod sweep {
    use std::io::Write;

    use sizing_model::{ContourResult, SweepResult};

    use super::ExportError;

    /// One row per swept value. Failed points keep their row with empty outputs and the error.
    pub fn write_sweep(
        writer: &mut dyn Write,
        result: &SweepResult,
        outputs: &[&str],
    ) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        let mut header = vec![format!("{} [{}]", result.quantity, result.unit)];
        header.extend(outputs.iter().map(|o| o.to_string()));
        header.push("status".to_string());
        csv.write_record(&header)?;

        for point in &result.points {
            let mut record = vec![point.value.to_string()];
            match &point.outcome {
                Ok(solution) => {
                    record.extend(outputs.iter().map(|o| {
                        solution
                            .scalar(o)
                            .map(|v| v.to_string())
                            .unwrap_or_default()
                    }));
                    record.push("ok".to_string());
                }
                Err(err) => {
                    record.extend(outputs.iter().map(|_| String::new()));
                    record.push(err.to_string());
                }
            }
            csv.write_record(&record)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Long-format contour: `x,y,output` per grid point, empty output for gaps.
    pub fn write_contour(
        writer: &mut dyn Write,
        result: &ContourResult,
        output: &str,
    ) -> Result<(), ExportError> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([
            format!("{} [{}]", result.x.quantity, result.x.unit),
            format!("{} [{}]", result.y.quantity, result.y.unit),
            output.to_string(),
        ])?;
        for (x, y, outcome) in &result.points {
            let value = outcome
                .as_ref()
                .ok()
                .and_then(|s| s.scalar(output))
                .map(|v| v.to_string())
                .unwrap_or_default();
            csv.write_record([x.to_string(), y.to_string(), value])?;
        }
        csv.flush()?;
        Ok(())
    }
}
