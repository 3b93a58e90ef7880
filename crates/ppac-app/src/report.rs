//! JSON and CSV output for run reports and reference series.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::RunReport;
use crate::lotka_volterra::ReferencePoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Json,
    Csv,
}

/// Opens `path` for writing, creating parent directories, or stdout when absent.
pub fn open_output(path: Option<&Path>) -> Result<Box<dyn Write>> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout().lock())),
    }
}

/// Writes run reports; a single report is written as an object, several as an array.
pub fn write_reports<W: Write>(
    writer: &mut W,
    reports: &[RunReport],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => match reports {
            [single] => write_json(writer, single),
            many => write_json(writer, many),
        },
        OutputFormat::Csv => {
            writeln!(writer, "run,generation,prey,predators")?;
            for (run, report) in reports.iter().enumerate() {
                for record in &report.history {
                    writeln!(
                        writer,
                        "{run},{},{},{}",
                        record.generation, record.prey, record.predators
                    )?;
                }
            }
            writer.flush().context("failed to flush report")
        }
    }
}

pub fn write_reference<W: Write>(
    writer: &mut W,
    points: &[ReferencePoint],
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Json => write_json(writer, points),
        OutputFormat::Csv => {
            writeln!(writer, "step,time,prey,predators")?;
            for point in points {
                writeln!(
                    writer,
                    "{},{},{},{}",
                    point.step, point.time, point.prey, point.predators
                )?;
            }
            writer.flush().context("failed to flush reference series")
        }
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(writer: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *writer, value).context("failed to serialize report")?;
    writeln!(writer)?;
    writer.flush().context("failed to flush report")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RunParameters, execute};

    fn report(seed: u64) -> RunReport {
        let params = RunParameters {
            initial_prey: 10,
            initial_predators: 5,
            board_size: 6,
            iterations: Some(3),
            seed: Some(seed),
            ..RunParameters::default()
        };
        execute(&params, None).expect("report")
    }

    #[test]
    fn csv_lists_every_generation_of_every_run() {
        let reports = [report(1), report(2)];
        let mut out = Vec::new();
        write_reports(&mut out, &reports, OutputFormat::Csv).expect("csv");
        let text = String::from_utf8(out).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("run,generation,prey,predators"));
        let rows: Vec<&str> = lines.collect();
        let expected = reports.iter().map(|r| r.history.len()).sum::<usize>();
        assert_eq!(rows.len(), expected);
        assert!(rows[0].starts_with("0,0,10,5"));
    }

    #[test]
    fn single_report_is_written_as_an_object() {
        let single = report(3);
        let mut out = Vec::new();
        write_reports(&mut out, std::slice::from_ref(&single), OutputFormat::Json).expect("json");
        let parsed: RunReport = serde_json::from_slice(&out).expect("parse");
        assert_eq!(parsed, single);

        let mut out = Vec::new();
        write_reports(&mut out, &[report(4), report(5)], OutputFormat::Json).expect("json");
        let parsed: Vec<RunReport> = serde_json::from_slice(&out).expect("parse");
        assert_eq!(parsed.len(), 2);
    }

    #[test]
    fn reference_csv_has_header_and_points() {
        let points = [
            ReferencePoint {
                step: 0,
                time: 0.0,
                prey: 10.0,
                predators: 2.0,
            },
            ReferencePoint {
                step: 1,
                time: 0.5,
                prey: 11.5,
                predators: 2.25,
            },
        ];
        let mut out = Vec::new();
        write_reference(&mut out, &points, OutputFormat::Csv).expect("csv");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "step,time,prey,predators\n0,0,10,2\n1,0.5,11.5,2.25\n"
        );
    }
}
