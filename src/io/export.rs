//! CSV export for per-sample forecasts.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::forecast::SampleForecast;

/// Column header for forecast CSV export.
const HEADER: &str = "index,timestamp,actual_output,prediction,\
                      clear_sky_future,clear_sky_index,error";

/// Exports forecasts to a CSV file at the given path.
///
/// Writes a header row followed by one row per sample in batch order.
/// Produces deterministic output for identical inputs.
///
/// # Arguments
///
/// * `forecasts` - Output of one engine run
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(forecasts: &[SampleForecast], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(forecasts, buf)
}

/// Writes forecasts as CSV to any writer.
///
/// Failed samples leave the numeric forecast columns empty and carry the
/// error text in the last column.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(forecasts: &[SampleForecast], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for f in forecasts {
        let (prediction, clear_sky_future, clear_sky_index, error) = match &f.outcome {
            Ok(p) => (
                format!("{:.6}", p.prediction),
                format!("{:.6}", p.clear_sky_future),
                format!("{:.6}", p.clear_sky_index),
                String::new(),
            ),
            Err(e) => (String::new(), String::new(), String::new(), e.to_string()),
        };
        wtr.write_record(&[
            f.index.to_string(),
            f.timestamp.to_rfc3339(),
            format!("{:.6}", f.actual_output),
            prediction,
            clear_sky_future,
            clear_sky_index,
            error,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::error::ForecastError;
    use crate::forecast::Projection;
    use crate::solar::time::attach_civil_offset;

    fn make_forecast(index: usize, outcome: Result<Projection, ForecastError>) -> SampleForecast {
        let naive = NaiveDate::from_ymd_opt(2024, 6, 21)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid timestamp");
        SampleForecast {
            index,
            timestamp: attach_civil_offset(naive, -120.0),
            actual_output: 500.0,
            outcome,
        }
    }

    fn projection() -> Projection {
        Projection {
            prediction: 512.5,
            clear_sky_future: 20_500.0,
            clear_sky_index: 0.025,
        }
    }

    fn render(forecasts: &[SampleForecast]) -> String {
        let mut buf = Vec::new();
        write_csv(forecasts, &mut buf).ok();
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn header_matches_schema() {
        let output = render(&[make_forecast(0, Ok(projection()))]);
        let first_line = output.lines().next().unwrap_or("");
        assert_eq!(
            first_line,
            "index,timestamp,actual_output,prediction,clear_sky_future,clear_sky_index,error"
        );
    }

    #[test]
    fn row_count_matches_sample_count() {
        let forecasts: Vec<SampleForecast> =
            (0..24).map(|i| make_forecast(i, Ok(projection()))).collect();
        let output = render(&forecasts);
        assert_eq!(output.lines().count(), 25);
    }

    #[test]
    fn successful_row_values() {
        let output = render(&[make_forecast(3, Ok(projection()))]);
        let row = output.lines().nth(1).unwrap_or("");
        assert_eq!(
            row,
            "3,2024-06-21T12:00:00-07:00,500.000000,512.500000,20500.000000,0.025000,"
        );
    }

    #[test]
    fn failed_row_leaves_numbers_empty() {
        let err = ForecastError::DivisionDegenerate { clear_sky: 0.0 };
        let output = render(&[make_forecast(1, Err(err.clone()))]);
        let row = output.lines().nth(1).unwrap_or("");
        assert!(row.starts_with("1,2024-06-21T12:00:00-07:00,500.000000,,,,"));
        assert!(row.ends_with(&err.to_string()));
    }

    #[test]
    fn output_is_deterministic() {
        let forecasts = [
            make_forecast(0, Ok(projection())),
            make_forecast(1, Err(ForecastError::geometry("x"))),
        ];
        assert_eq!(render(&forecasts), render(&forecasts));
    }
}
