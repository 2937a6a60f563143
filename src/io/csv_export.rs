use std::path::Path;

use super::exchange::ExchangeError;
use crate::model::Stream;

/// Export streams to a semicolon-delimited CSV file, in lane order.
///
/// Columns: Stream ; Start Date ; End Date ; Deadlines ; Color
/// Dates are formatted as DD/MM/YYYY.
/// Returns the number of streams written.
pub fn export_streams_csv(streams: &[Stream], path: &Path) -> Result<usize, ExchangeError> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b';')
        .from_path(path)?;
    write_streams(&mut wtr, streams)?;
    wtr.flush()?;
    Ok(streams.len())
}

fn write_streams<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    streams: &[Stream],
) -> Result<(), ExchangeError> {
    wtr.write_record(["Stream", "Start Date", "End Date", "Deadlines", "Color"])?;
    for stream in streams {
        wtr.write_record([
            stream.label.clone(),
            stream.start_date.format("%d/%m/%Y").to_string(),
            stream.end_date.format("%d/%m/%Y").to_string(),
            stream.deadlines.len().to_string(),
            stream.color.to_string(),
        ])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn writes_header_and_rows() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
        let streams = vec![Stream::new("Design; phase 1", start, start + chrono::Duration::days(9), 2)];
        let mut wtr = csv::WriterBuilder::new().delimiter(b';').from_writer(Vec::new());
        write_streams(&mut wtr, &streams).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "Stream;Start Date;End Date;Deadlines;Color");
        assert_eq!(lines[1], "\"Design; phase 1\";04/03/2024;13/03/2024;0;2");
    }
}
