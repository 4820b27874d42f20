use crate::error::{ReportError, Result};
use serde::Serialize;
use tabled::Tabled;

/// Column added by `filter::enrich` holding the territory (sales manager) name.
pub const REP_NAME_COLUMN: &str = "Rep Name";
/// Column added by `filter::enrich` holding the agency name.
pub const AGENCY_COLUMN: &str = "Agency";

#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// Wrap a raw CSV field. Empty fields are null; everything else stays
    /// text exactly as read, so ids like `0609` keep their leading zeros.
    /// Only the normalizer turns amounts into numbers.
    pub fn from_field(raw: &str) -> Self {
        if raw.trim().is_empty() {
            CellValue::Null
        } else {
            CellValue::Text(raw.to_string())
        }
    }

    /// Numeric view of the cell. Anything that is not a number counts as 0.
    pub fn as_f64(&self) -> f64 {
        match self {
            CellValue::Number(n) => *n,
            _ => 0.0,
        }
    }

    /// Grouping key of the cell; nulls never form a group.
    pub fn as_key(&self) -> Option<String> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(number_to_text(*n)),
        }
    }
}

/// Render a number the way an id column reads: `609.0` becomes `"609"`.
pub fn number_to_text(n: f64) -> String {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Display format of a column, fixed when the schema is defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnFormat {
    Plain,
    Currency,
}

impl ColumnFormat {
    /// Decide the format of a header. An explicit currency list wins;
    /// without one, any column whose name mentions "Sales" is currency.
    pub fn for_header(name: &str, currency_columns: Option<&[String]>) -> Self {
        let is_currency = match currency_columns {
            Some(list) => list.iter().any(|c| c == name),
            None => name.contains("Sales"),
        };
        if is_currency {
            ColumnFormat::Currency
        } else {
            ColumnFormat::Plain
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub format: ColumnFormat,
}

impl Column {
    pub fn new(name: impl Into<String>, format: ColumnFormat) -> Self {
        Self {
            name: name.into(),
            format,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRow {
    pub cells: Vec<CellValue>,
}

impl SalesRow {
    pub fn get(&self, idx: usize) -> &CellValue {
        &self.cells[idx]
    }
}

/// Ordered rows sharing one column schema.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SalesTable {
    columns: Vec<Column>,
    rows: Vec<SalesRow>,
}

impl SalesTable {
    /// Build a table, padding short rows with nulls and dropping surplus
    /// cells so every row matches the schema width.
    pub fn new(columns: Vec<Column>, rows: Vec<SalesRow>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut r| {
                r.cells.resize(width, CellValue::Null);
                r
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[SalesRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| ReportError::MissingColumn(name.to_string()))
    }

    /// Fail on the first required column absent from the schema.
    pub fn require_columns(&self, names: &[&str]) -> Result<()> {
        for name in names {
            self.column_index(name)?;
        }
        Ok(())
    }

    /// Same schema, different rows. Used by filters.
    pub fn with_rows(&self, rows: Vec<SalesRow>) -> Self {
        Self::new(self.columns.clone(), rows)
    }

    pub fn into_parts(self) -> (Vec<Column>, Vec<SalesRow>) {
        (self.columns, self.rows)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Descending,
    Ascending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankEntry {
    pub key: String,
    pub value: f64,
}

pub type Ranking = Vec<RankEntry>;

/// Current vs. prior sales for one customer.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomerAggregate {
    pub customer: String,
    pub current: f64,
    pub prior: f64,
    pub dollar_growth: f64,
    /// `None` when prior sales are zero; the ratio is undefined.
    pub percent_growth: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct CustomerSalesRow {
    #[serde(rename = "Customer Name")]
    #[tabled(rename = "Customer Name")]
    pub customer: String,
    #[serde(rename = "Agency")]
    #[tabled(rename = "Agency")]
    pub agency: String,
    #[serde(rename = "Sales ($)")]
    #[tabled(rename = "Sales ($)")]
    pub sales: String,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct AgencySalesRow {
    #[serde(rename = "Agency")]
    #[tabled(rename = "Agency")]
    pub agency: String,
    #[serde(rename = "Sales ($)")]
    #[tabled(rename = "Sales ($)")]
    pub sales: String,
}

#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    pub view: String,
    pub territory: String,
    pub agency: String,
    pub total_customers: usize,
    pub total_sales: f64,
    pub budget: f64,
    pub percent_to_goal: f64,
}
