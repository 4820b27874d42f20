use crate::error::Result;
use crate::sink::ExportedReport;
use crate::types::{number_to_text, CellValue, SalesTable};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

/// Write the table as CSV, header first, nulls as empty fields.
pub fn write_table_csv(path: impl AsRef<Path>, table: &SalesTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(table.column_names())?;
    for row in table.rows() {
        wtr.write_record(row.cells.iter().map(csv_field))?;
    }
    wtr.flush()?;
    Ok(())
}

fn csv_field(value: &CellValue) -> String {
    match value {
        CellValue::Null => String::new(),
        CellValue::Text(s) => s.clone(),
        CellValue::Number(n) => number_to_text(*n),
    }
}

pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Save a rendered report into `dir` under its own file name.
pub fn write_report_file(dir: impl AsRef<Path>, report: &ExportedReport) -> Result<PathBuf> {
    let path = dir.as_ref().join(&report.file_name);
    std::fs::write(&path, &report.bytes)?;
    Ok(path)
}

pub fn preview_table<T>(title: &str, rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    println!("\n{}", title);
    println!();
    preview_table_rows(rows, max_rows);
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().take(max_rows).cloned().collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Column, ColumnFormat, DashboardSummary, SalesRow};
    use pretty_assertions::assert_eq;

    #[test]
    fn csv_round_trips_nulls_and_ids() {
        let table = SalesTable::new(
            vec![
                Column::new("Customer Name", ColumnFormat::Plain),
                Column::new("Sales Rep", ColumnFormat::Plain),
                Column::new("Current Sales", ColumnFormat::Currency),
            ],
            vec![SalesRow {
                cells: vec![
                    CellValue::Null,
                    CellValue::Number(609.0),
                    CellValue::Number(12.5),
                ],
            }],
        );
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("filtered.csv");
        write_table_csv(&path, &table).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Customer Name,Sales Rep,Current Sales\n,609,12.5\n");
    }

    #[test]
    fn writes_summary_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        let summary = DashboardSummary {
            view: "YTD".into(),
            territory: "All".into(),
            agency: "All".into(),
            total_customers: 2,
            total_sales: 10.0,
            budget: 0.0,
            percent_to_goal: 0.0,
        };
        write_json(&path, &summary).unwrap();
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed["total_customers"], 2);
        assert_eq!(parsed["view"], "YTD");
    }

    #[test]
    fn report_file_lands_in_dir() {
        let dir = tempfile::tempdir().unwrap();
        let report = ExportedReport {
            file_name: "All_Proluxe_Report.xlsx".into(),
            content_type: crate::sink::XLSX_CONTENT_TYPE,
            bytes: vec![1, 2, 3],
        };
        let path = write_report_file(dir.path(), &report).unwrap();
        assert_eq!(path, dir.path().join("All_Proluxe_Report.xlsx"));
        assert_eq!(std::fs::read(path).unwrap(), vec![1, 2, 3]);
    }
}
