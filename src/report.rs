// Lays the normalized table, its metrics and the recap text out as a
// three-sheet report description. Nothing here touches the filesystem;
// `sink` turns the description into bytes.
use crate::config::AppConfig;
use crate::error::Result;
use crate::metrics;
use crate::narrative::{generate_narrative, NarrativeInput};
use crate::normalize::{normalize, NormalizeOptions};
use crate::types::{
    CellValue, ColumnFormat, CustomerAggregate, Ranking, SalesTable, SortDirection,
};
use log::{debug, info};

pub const RAW_DATA_SHEET: &str = "Summary";
pub const NARRATIVE_SHEET: &str = "Auto Summary";
pub const DEEP_DIVE_SHEET: &str = "Deep Dive";

const RAW_COLUMN_WIDTH: f64 = 18.0;
const NARRATIVE_COLUMN_WIDTH: f64 = 100.0;
const TOP_CUSTOMERS_COL: u16 = 3;
const BOTTOM_CUSTOMERS_COL: u16 = 6;
const LIST_FIRST_ROW: u32 = 2;
/// Lowest row the client detail title may start on (A20).
const DETAIL_TITLE_ROW: u32 = 19;
/// Rows between the detail title and its header row.
const DETAIL_HEADER_OFFSET: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub row: u32,
    pub col: u16,
}

impl Anchor {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain,
    Currency,
}

impl From<ColumnFormat> for CellStyle {
    fn from(format: ColumnFormat) -> Self {
        match format {
            ColumnFormat::Plain => CellStyle::Plain,
            ColumnFormat::Currency => CellStyle::Currency,
        }
    }
}

/// Inclusive autofilter bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterRange {
    pub first_row: u32,
    pub first_col: u16,
    pub last_row: u32,
    pub last_col: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableRegion {
    pub name: String,
    /// Bold caption written above the table.
    pub title: Option<(Anchor, String)>,
    /// Header row when `header` is set, otherwise the first data row.
    pub origin: Anchor,
    /// Bold column headers.
    pub header: Option<Vec<String>>,
    pub rows: Vec<Vec<CellValue>>,
    pub column_styles: Vec<CellStyle>,
    pub filter: Option<FilterRange>,
}

impl TableRegion {
    pub fn first_data_row(&self) -> u32 {
        self.origin.row + u32::from(self.header.is_some())
    }

    /// Last row the region writes to, caption included.
    pub fn last_row(&self) -> u32 {
        let caption = self.title.as_ref().map_or(0, |(a, _)| a.row);
        let body = match self.rows.len() {
            0 if self.header.is_some() => self.origin.row,
            0 => 0,
            n => self.first_data_row() + n as u32 - 1,
        };
        caption.max(body)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRegion {
    pub anchor: Anchor,
    pub text: String,
    pub wrap: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Table(TableRegion),
    Text(TextRegion),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SheetSpec {
    pub name: String,
    pub column_widths: Vec<(u16, f64)>,
    pub sections: Vec<Section>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub title: String,
    pub sheets: Vec<SheetSpec>,
}

/// What to report on: the agency/territory name and the sales column of
/// the selected period view.
pub struct ReportRequest<'a> {
    pub subject: &'a str,
    pub sales_column: &'a str,
    pub config: &'a AppConfig,
}

/// Everything the assembler lays out, computed fresh per request.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportMetrics {
    pub current_total: f64,
    pub prior_total: f64,
    pub categories: Ranking,
    pub top_customers: Ranking,
    pub bottom_customers: Ranking,
    pub growth: Vec<CustomerAggregate>,
    pub top_growth: Ranking,
    pub top_growth_percent: Ranking,
    pub top_decline: Ranking,
}

pub fn compute_metrics(table: &SalesTable, request: &ReportRequest) -> Result<ReportMetrics> {
    let cols = &request.config.columns;
    let settings = &request.config.report;
    let sales = request.sales_column;

    let growth = metrics::growth(table, &cols.customer, sales, &cols.prior_sales)?;
    let result = ReportMetrics {
        current_total: metrics::total(table, sales)?,
        prior_total: metrics::total(table, &cols.prior_sales)?,
        categories: metrics::category_breakdown(table, &cols.category, sales)?,
        top_customers: metrics::top_n(
            table,
            &cols.customer,
            sales,
            settings.top_customers,
            SortDirection::Descending,
        )?,
        bottom_customers: metrics::top_n(
            table,
            &cols.customer,
            sales,
            settings.top_customers,
            SortDirection::Ascending,
        )?,
        top_growth: metrics::top_growth_by_dollar(&growth, settings.highlight_count),
        top_growth_percent: metrics::top_growth_by_percent(&growth, settings.highlight_count, true),
        top_decline: metrics::top_decline_by_dollar(&growth, settings.highlight_count),
        growth,
    };
    debug!(
        "Percent growth leaders: {}",
        result
            .top_growth_percent
            .iter()
            .map(|e| format!("{} ({:.1}%)", e.key, e.value))
            .collect::<Vec<_>>()
            .join(", ")
    );
    Ok(result)
}

/// Full pipeline: check columns, normalize, compute, narrate, lay out.
/// A missing column aborts before anything is built.
pub fn build_report(table: &SalesTable, request: &ReportRequest) -> Result<ReportArtifact> {
    let cols = &request.config.columns;
    table.require_columns(&[
        cols.customer.as_str(),
        cols.category.as_str(),
        cols.sales_rep.as_str(),
        request.sales_column,
        cols.prior_sales.as_str(),
    ])?;

    let (normalized, _) = normalize(
        table,
        &NormalizeOptions::for_view(request.config, request.sales_column),
    )?;
    let computed = compute_metrics(&normalized, request)?;
    let narrative = generate_narrative(&NarrativeInput {
        subject: request.subject,
        current_total: computed.current_total,
        prior_total: computed.prior_total,
        top_growth: &computed.top_growth,
        top_decline: &computed.top_decline,
        closing_line: &request.config.report.closing_line,
    });

    let artifact = assemble(&normalized, &computed, narrative, request.subject);
    info!(
        "Assembled report for {}: {} rows, {} customers, {} categories",
        request.subject,
        normalized.len(),
        computed.growth.len(),
        computed.categories.len()
    );
    Ok(artifact)
}

pub fn assemble(
    table: &SalesTable,
    computed: &ReportMetrics,
    narrative: String,
    subject: &str,
) -> ReportArtifact {
    ReportArtifact {
        title: format!("{} Report", subject),
        sheets: vec![
            raw_data_sheet(table),
            narrative_sheet(narrative),
            deep_dive_sheet(table, computed),
        ],
    }
}

fn column_styles(table: &SalesTable) -> Vec<CellStyle> {
    table.columns().iter().map(|c| c.format.into()).collect()
}

fn table_rows(table: &SalesTable) -> Vec<Vec<CellValue>> {
    table.rows().iter().map(|r| r.cells.clone()).collect()
}

fn header(table: &SalesTable) -> Vec<String> {
    table.columns().iter().map(|c| c.name.clone()).collect()
}

fn raw_data_sheet(table: &SalesTable) -> SheetSpec {
    let width = table.columns().len() as u16;
    SheetSpec {
        name: RAW_DATA_SHEET.to_string(),
        column_widths: (0..width).map(|c| (c, RAW_COLUMN_WIDTH)).collect(),
        sections: vec![Section::Table(TableRegion {
            name: "Raw Data".into(),
            title: None,
            origin: Anchor::new(0, 0),
            header: Some(header(table)),
            rows: table_rows(table),
            column_styles: column_styles(table),
            filter: None,
        })],
    }
}

fn narrative_sheet(text: String) -> SheetSpec {
    SheetSpec {
        name: NARRATIVE_SHEET.to_string(),
        column_widths: vec![(0, NARRATIVE_COLUMN_WIDTH)],
        sections: vec![Section::Text(TextRegion {
            anchor: Anchor::new(0, 0),
            text,
            wrap: true,
        })],
    }
}

fn ranking_region(name: &str, title: &str, col: u16, ranking: &Ranking) -> TableRegion {
    TableRegion {
        name: name.into(),
        title: Some((Anchor::new(0, col), title.into())),
        origin: Anchor::new(LIST_FIRST_ROW, col),
        header: None,
        rows: ranking
            .iter()
            .map(|e| vec![CellValue::Text(e.key.clone()), CellValue::Number(e.value)])
            .collect(),
        column_styles: vec![CellStyle::Plain, CellStyle::Currency],
        filter: None,
    }
}

fn deep_dive_sheet(table: &SalesTable, computed: &ReportMetrics) -> SheetSpec {
    let upper = vec![
        ranking_region("Category Breakdown", "Best-Selling Product Categories", 0, &computed.categories),
        ranking_region("Top Customers", "Top Dealers", TOP_CUSTOMERS_COL, &computed.top_customers),
        ranking_region(
            "Bottom Customers",
            "Bottom Dealers",
            BOTTOM_CUSTOMERS_COL,
            &computed.bottom_customers,
        ),
    ];

    // Keep one blank row between the lists and the detail block.
    let lowest = upper.iter().map(TableRegion::last_row).max().unwrap_or(0);
    let title_row = DETAIL_TITLE_ROW.max(lowest + 2);
    let header_row = title_row + DETAIL_HEADER_OFFSET;
    let last_col = (table.columns().len() as u16).saturating_sub(1);

    let detail = TableRegion {
        name: "Client Detail".into(),
        title: Some((Anchor::new(title_row, 0), "Client-Level Detail".into())),
        origin: Anchor::new(header_row, 0),
        header: Some(header(table)),
        rows: table_rows(table),
        column_styles: column_styles(table),
        filter: Some(FilterRange {
            first_row: header_row,
            first_col: 0,
            last_row: header_row + table.len() as u32,
            last_col,
        }),
    };

    let mut sections: Vec<Section> = upper.into_iter().map(Section::Table).collect();
    sections.push(Section::Table(detail));
    SheetSpec {
        name: DEEP_DIVE_SHEET.to_string(),
        column_widths: Vec::new(),
        sections,
    }
}
