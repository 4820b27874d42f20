use crate::error::Result;
use crate::types::{CellValue, Column, ColumnFormat, SalesRow, SalesTable};
use csv::ReaderBuilder;
use log::{debug, info, warn};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub padded_rows: usize,
    pub truncated_rows: usize,
}

/// Load a sales CSV file. Column formats are fixed here, once, from the
/// header names (or the explicit currency list when given).
pub fn load_table(
    path: impl AsRef<Path>,
    currency_columns: Option<&[String]>,
) -> Result<(SalesTable, LoadReport)> {
    let path = path.as_ref();
    let file = std::fs::File::open(path)?;
    let (table, report) = read_table(file, currency_columns)?;
    info!(
        "Loaded {} rows x {} columns from {}",
        report.total_rows,
        table.columns().len(),
        path.display()
    );
    Ok((table, report))
}

pub fn read_table<R: Read>(
    reader: R,
    currency_columns: Option<&[String]>,
) -> Result<(SalesTable, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_reader(reader);

    let columns: Vec<Column> = rdr
        .headers()?
        .iter()
        .map(|h| {
            let name = h.trim();
            Column::new(name, ColumnFormat::for_header(name, currency_columns))
        })
        .collect();
    debug!(
        "Schema: {}",
        columns
            .iter()
            .map(|c| format!("{} ({:?})", c.name, c.format))
            .collect::<Vec<_>>()
            .join(", ")
    );

    let width = columns.len();
    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        report.total_rows += 1;
        if record.len() < width {
            report.padded_rows += 1;
        } else if record.len() > width {
            report.truncated_rows += 1;
        }
        let cells = record.iter().take(width).map(CellValue::from_field).collect();
        rows.push(SalesRow { cells });
    }
    if report.padded_rows > 0 || report.truncated_rows > 0 {
        warn!(
            "{} short rows padded, {} long rows truncated",
            report.padded_rows, report.truncated_rows
        );
    }

    Ok((SalesTable::new(columns, rows), report))
}
