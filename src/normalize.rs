// Cleans a loaded table before any aggregation.
//
// The caller's table is never touched; a fresh table is returned. Numeric
// coercion is lossy: unparseable amounts become 0 without an error and are
// only counted in the report.
use crate::config::AppConfig;
use crate::error::Result;
use crate::types::{number_to_text, CellValue, ColumnFormat, SalesRow, SalesTable};
use crate::util::parse_f64_safe;
use log::debug;

#[derive(Debug, Clone)]
pub struct NormalizeOptions {
    pub blank_sentinel: String,
    /// String columns where the sentinel means "no value".
    pub key_columns: Vec<String>,
    /// Amount columns coerced even when not formatted as currency.
    pub numeric_columns: Vec<String>,
}

impl NormalizeOptions {
    /// Options for one period view: its sales column, the prior-sales
    /// column and any budget column configured for that view are numeric.
    pub fn for_view(config: &AppConfig, sales_column: &str) -> Self {
        let mut numeric_columns = vec![sales_column.to_string(), config.columns.prior_sales.clone()];
        numeric_columns.extend(
            [&config.views.ytd, &config.views.mtd]
                .into_iter()
                .filter(|v| v.sales_column == sales_column)
                .filter_map(|v| v.budget_column.clone()),
        );
        Self {
            blank_sentinel: config.blank_sentinel.clone(),
            key_columns: vec![
                config.columns.category.clone(),
                config.columns.customer.clone(),
                config.columns.sales_rep.clone(),
            ],
            numeric_columns,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub blanks_replaced: usize,
    pub coerced_to_zero: usize,
    pub missing_to_zero: usize,
}

pub fn normalize(
    table: &SalesTable,
    options: &NormalizeOptions,
) -> Result<(SalesTable, NormalizeReport)> {
    let key_idx = options
        .key_columns
        .iter()
        .map(|c| table.column_index(c))
        .collect::<Result<Vec<_>>>()?;
    let mut numeric_idx: Vec<usize> = table
        .columns()
        .iter()
        .enumerate()
        .filter(|(_, c)| c.format == ColumnFormat::Currency)
        .map(|(i, _)| i)
        .collect();
    for name in &options.numeric_columns {
        let idx = table.column_index(name)?;
        if !numeric_idx.contains(&idx) {
            numeric_idx.push(idx);
        }
    }
    numeric_idx.retain(|i| !key_idx.contains(i));

    let mut report = NormalizeReport::default();
    let rows = table
        .rows()
        .iter()
        .map(|row| {
            let mut cells = row.cells.clone();
            for &i in &key_idx {
                cells[i] = match &cells[i] {
                    CellValue::Text(s) if *s == options.blank_sentinel => {
                        report.blanks_replaced += 1;
                        CellValue::Null
                    }
                    CellValue::Number(n) => CellValue::Text(number_to_text(*n)),
                    other => other.clone(),
                };
            }
            for &i in &numeric_idx {
                cells[i] = match &cells[i] {
                    CellValue::Number(n) => CellValue::Number(*n),
                    CellValue::Text(s) => match parse_f64_safe(Some(s)) {
                        Some(n) => CellValue::Number(n),
                        None => {
                            report.coerced_to_zero += 1;
                            CellValue::Number(0.0)
                        }
                    },
                    CellValue::Null => {
                        report.missing_to_zero += 1;
                        CellValue::Number(0.0)
                    }
                };
            }
            SalesRow { cells }
        })
        .collect();

    debug!(
        "Normalized {} rows: {} blanks removed, {} unparseable and {} missing amounts set to 0",
        table.len(),
        report.blanks_replaced,
        report.coerced_to_zero,
        report.missing_to_zero
    );
    Ok((table.with_rows(rows), report))
}
