use anyhow::{Context, Result};
use geoidkit::{elevation, GeoidService, Units};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::Target;

/// Input column names.
pub struct Columns {
    pub lat: String,
    pub lon: String,
    pub height: Option<String>,
}

#[derive(Debug)]
struct Summary {
    rows: u64,
    failed: u64,
    output_path: PathBuf,
}

pub fn run(
    data_dir: Option<PathBuf>,
    cache_size: u64,
    input: PathBuf,
    output: Option<PathBuf>,
    columns: Columns,
    target: Target,
    units: Units,
) -> Result<()> {
    let service = super::build_service(data_dir, cache_size)?;

    let summary = process_csv(&service, &input, output, &columns, target, units, true)?;

    if summary.failed > 0 {
        println!(
            "{} of {} rows could not be converted",
            summary.failed, summary.rows
        );
    }
    println!("Output written to: {}", summary.output_path.display());
    Ok(())
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(format!("{}_geoid.csv", stem))
}

fn column_index(headers: &csv::StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .with_context(|| format!("Column '{}' not found in CSV", name))
}

fn parse_field(record: &csv::StringRecord, idx: usize, what: &str, line: usize) -> Result<f64> {
    record
        .get(idx)
        .with_context(|| format!("Missing {} on row {}", what, line))?
        .trim()
        .parse()
        .with_context(|| format!("Invalid {} on row {}", what, line))
}

fn process_csv(
    service: &GeoidService,
    input: &Path,
    output: Option<PathBuf>,
    columns: &Columns,
    target: Target,
    units: Units,
    show_progress: bool,
) -> Result<Summary> {
    let file = File::open(input).context("Failed to open input file")?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader.headers()?.clone();
    let lat_idx = column_index(&headers, &columns.lat)?;
    let lon_idx = column_index(&headers, &columns.lon)?;
    let height_idx = columns
        .height
        .as_deref()
        .map(|name| column_index(&headers, name))
        .transpose()?;

    let records: Vec<_> = reader.records().collect::<Result<_, _>>()?;

    let mut coords = Vec::with_capacity(records.len());
    let mut heights = Vec::with_capacity(records.len());
    for (i, record) in records.iter().enumerate() {
        let line = i + 2;
        coords.push((
            parse_field(record, lat_idx, "latitude", line)?,
            parse_field(record, lon_idx, "longitude", line)?,
        ));
        if let Some(idx) = height_idx {
            heights.push(parse_field(record, idx, "height", line)?);
        }
    }

    // Grouped by tile inside the service
    let undulations = service.undulations_batch(&coords);

    let pb = if show_progress {
        ProgressBar::new(records.len() as u64)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )?
            .progress_chars("#>-"),
    );

    let output_path = output.unwrap_or_else(|| default_output_path(input));
    let output_file = File::create(&output_path).context("Failed to create output file")?;
    let mut writer = csv::Writer::from_writer(BufWriter::new(output_file));

    let mut new_headers: Vec<&str> = headers.iter().collect();
    new_headers.push("undulation_m");
    if height_idx.is_some() {
        new_headers.push(match target {
            Target::Geoid => "geoid_height",
            Target::Ellipsoid => "ellipsoid_height",
        });
    }
    writer.write_record(&new_headers)?;

    let mut failed = 0u64;
    for (i, record) in records.iter().enumerate() {
        let mut new_record: Vec<String> = record.iter().map(str::to_string).collect();

        match &undulations[i] {
            Ok(n) => {
                new_record.push(format!("{:.4}", n));
                if let Some(&h) = heights.get(i) {
                    let converted = match target {
                        Target::Geoid => elevation::geoid_from_ellipsoid(*n, h, units),
                        Target::Ellipsoid => elevation::ellipsoid_from_geoid(*n, h, units),
                    };
                    new_record.push(format!("{:.4}", converted.height));
                }
            }
            Err(_) => {
                failed += 1;
                new_record.push(String::new());
                if height_idx.is_some() {
                    new_record.push(String::new());
                }
            }
        }

        writer.write_record(&new_record)?;
        pb.inc(1);
    }

    pb.finish_with_message("done");
    writer.flush()?;

    Ok(Summary {
        rows: records.len() as u64,
        failed,
        output_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt::Write as _;
    use tempfile::TempDir;

    /// One-degree `g2018u1.asc` with a constant undulation.
    fn write_tile_u1(dir: &Path, undulation: f64) {
        let mut text = String::from("40.0 230.0 1.0 1.0 19 20 1\n");
        for _ in 0..19 {
            for _ in 0..20 {
                write!(text, "{} ", undulation).unwrap();
            }
            text.push('\n');
        }
        std::fs::write(dir.join("g2018u1.asc"), text).unwrap();
    }

    fn columns(height: Option<&str>) -> Columns {
        Columns {
            lat: "lat".to_string(),
            lon: "lon".to_string(),
            height: height.map(str::to_string),
        }
    }

    #[test]
    fn test_process_csv_undulation_only() {
        let dir = TempDir::new().unwrap();
        write_tile_u1(dir.path(), -21.32);
        let input = dir.path().join("points.csv");
        std::fs::write(&input, "name,lat,lon\na,46.722092,-119.593764\nb,0,0\n").unwrap();

        let service = GeoidService::new(dir.path(), 8);
        let summary = process_csv(
            &service,
            &input,
            None,
            &columns(None),
            Target::Geoid,
            Units::Meters,
            false,
        )
        .unwrap();

        assert_eq!(summary.rows, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.output_path, dir.path().join("points_geoid.csv"));

        let out = std::fs::read_to_string(&summary.output_path).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "name,lat,lon,undulation_m");
        assert_eq!(lines[1], "a,46.722092,-119.593764,-21.3200");
        assert_eq!(lines[2], "b,0,0,");
    }

    #[test]
    fn test_process_csv_geoid_heights_in_feet() {
        let dir = TempDir::new().unwrap();
        write_tile_u1(dir.path(), -20.0);
        let input = dir.path().join("gnss.csv");
        std::fs::write(&input, "lat,lon,h\n46.5,-120.5,100\n").unwrap();
        let output = dir.path().join("out.csv");

        let service = GeoidService::new(dir.path(), 8);
        process_csv(
            &service,
            &input,
            Some(output.clone()),
            &columns(Some("h")),
            Target::Geoid,
            Units::SurveyFeet,
            false,
        )
        .unwrap();

        let out = std::fs::read_to_string(&output).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "lat,lon,h,undulation_m,geoid_height");
        assert_eq!(lines[1], "46.5,-120.5,100,-20.0000,393.7008");
    }

    #[test]
    fn test_process_csv_missing_column() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bad.csv");
        std::fs::write(&input, "latitude,longitude\n1,2\n").unwrap();

        let service = GeoidService::new(dir.path(), 8);
        let err = process_csv(
            &service,
            &input,
            None,
            &columns(None),
            Target::Geoid,
            Units::Meters,
            false,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Column 'lat' not found"));
    }
}
