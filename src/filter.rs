// Selection layer between the loaded datasets and the report pipeline:
// attaches territory/agency labels to rows and slices the table by the
// user's choices. Every call returns a new table.
use crate::config::{AppConfig, ViewConfig};
use crate::error::{ReportError, Result};
use crate::metrics;
use crate::types::{
    CellValue, Column, ColumnFormat, DashboardSummary, SalesRow, SalesTable, AGENCY_COLUMN,
    REP_NAME_COLUMN,
};
use log::{debug, warn};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PeriodView {
    #[default]
    Ytd,
    Mtd,
}

impl PeriodView {
    pub fn view_config<'a>(&self, config: &'a AppConfig) -> &'a ViewConfig {
        match self {
            PeriodView::Ytd => &config.views.ytd,
            PeriodView::Mtd => &config.views.mtd,
        }
    }
}

/// Current user choices. `None` means "All".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub view: PeriodView,
    pub territory: Option<String>,
    pub agency: Option<String>,
}

impl Selection {
    pub fn territory_label(&self) -> &str {
        self.territory.as_deref().unwrap_or("All")
    }

    pub fn agency_label(&self) -> &str {
        self.agency.as_deref().unwrap_or("All")
    }
}

/// Attach `Rep Name` and `Agency` columns resolved from the configured rep
/// lookup. A rep id with no territory is an error, not an unlabeled group;
/// rows without a rep stay unlabeled.
pub fn enrich(table: &SalesTable, config: &AppConfig) -> Result<SalesTable> {
    let rep_idx = table.column_index(&config.columns.sales_rep)?;

    let mut labels = Vec::with_capacity(table.len());
    let mut unassigned = 0usize;
    for row in table.rows() {
        match row.get(rep_idx).as_key() {
            None => {
                unassigned += 1;
                labels.push((CellValue::Null, CellValue::Null));
            }
            Some(rep) => {
                let territory = config
                    .territory_of(&rep)
                    .ok_or_else(|| ReportError::UnresolvedRep(rep.clone()))?;
                let agency = config
                    .agency_of(&rep)
                    .map_or(CellValue::Null, |a| CellValue::Text(a.to_string()));
                labels.push((CellValue::Text(territory.to_string()), agency));
            }
        }
    }
    if unassigned > 0 {
        warn!("{} rows have no sales rep and match no territory", unassigned);
    }

    let (mut columns, rows) = table.clone().into_parts();
    let rep_name_idx = column_slot(&mut columns, REP_NAME_COLUMN);
    let agency_idx = column_slot(&mut columns, AGENCY_COLUMN);
    let width = columns.len();
    let rows = rows
        .into_iter()
        .zip(labels)
        .map(|(mut row, (territory, agency))| {
            row.cells.resize(width, CellValue::Null);
            row.cells[rep_name_idx] = territory;
            row.cells[agency_idx] = agency;
            row
        })
        .collect();
    Ok(SalesTable::new(columns, rows))
}

/// Index of `name`, appending a plain column when it is not there yet.
fn column_slot(columns: &mut Vec<Column>, name: &str) -> usize {
    match columns.iter().position(|c| c.name == name) {
        Some(idx) => idx,
        None => {
            columns.push(Column::new(name, ColumnFormat::Plain));
            columns.len() - 1
        }
    }
}

fn keep_matching(table: &SalesTable, column: &str, wanted: Option<&str>) -> Result<SalesTable> {
    let Some(wanted) = wanted else {
        return Ok(table.clone());
    };
    let idx = table.column_index(column)?;
    let rows: Vec<SalesRow> = table
        .rows()
        .iter()
        .filter(|r| r.get(idx).as_key().as_deref() == Some(wanted))
        .cloned()
        .collect();
    Ok(table.with_rows(rows))
}

/// Slice an enriched table by territory, then by agency.
pub fn apply(table: &SalesTable, selection: &Selection) -> Result<SalesTable> {
    let by_territory = keep_matching(table, REP_NAME_COLUMN, selection.territory.as_deref())?;
    let filtered = keep_matching(&by_territory, AGENCY_COLUMN, selection.agency.as_deref())?;
    debug!(
        "Selection {}/{} keeps {} of {} rows",
        selection.territory_label(),
        selection.agency_label(),
        filtered.len(),
        table.len()
    );
    Ok(filtered)
}

/// Only the agency column is filtered; used for the export-agency choice.
pub fn for_agency(table: &SalesTable, agency: Option<&str>) -> Result<SalesTable> {
    keep_matching(table, AGENCY_COLUMN, agency)
}

/// Sorted distinct agencies present in the table.
pub fn agencies(table: &SalesTable) -> Result<Vec<String>> {
    let idx = table.column_index(AGENCY_COLUMN)?;
    let set: BTreeSet<String> = table
        .rows()
        .iter()
        .filter_map(|r| r.get(idx).as_key())
        .collect();
    Ok(set.into_iter().collect())
}

/// Budget for the selection: a configured budget column wins, then the
/// agency budget, then the territory (or company-wide) budget.
pub fn budget_for(config: &AppConfig, selection: &Selection, table: &SalesTable) -> Result<f64> {
    if let Some(column) = &selection.view.view_config(config).budget_column {
        return metrics::total(table, column);
    }
    match &selection.agency {
        Some(agency) => Ok(config.agency_budget(agency)),
        None => config.territory_budget(selection.territory.as_deref()),
    }
}

/// Headline numbers for a filtered table.
pub fn dashboard_summary(
    table: &SalesTable,
    config: &AppConfig,
    selection: &Selection,
) -> Result<DashboardSummary> {
    let view = selection.view.view_config(config);
    let total_sales = metrics::total(table, &view.sales_column)?;
    let budget = budget_for(config, selection, table)?;
    Ok(DashboardSummary {
        view: view.label.clone(),
        territory: selection.territory_label().to_string(),
        agency: selection.agency_label().to_string(),
        total_customers: metrics::distinct_count(table, &config.columns.customer)?,
        total_sales,
        budget,
        percent_to_goal: metrics::percent_to_goal(total_sales, budget),
    })
}
