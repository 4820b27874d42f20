//! Spreadsheet sink: renders a [`ReportArtifact`] to xlsx bytes.
use crate::error::Result;
use crate::report::{CellStyle, ReportArtifact, Section, TableRegion, TextRegion};
use crate::types::CellValue;
use log::info;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, Worksheet};

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const CURRENCY_FORMAT: &str = "$#,##0";

/// A rendered report ready to be saved or streamed.
#[derive(Debug, Clone)]
pub struct ExportedReport {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Reusable cell formats
struct SinkFormats {
    bold: Format,
    currency: Format,
    wrap: Format,
}

impl SinkFormats {
    fn new() -> Self {
        Self {
            bold: Format::new().set_bold(),
            currency: Format::new().set_num_format(CURRENCY_FORMAT),
            wrap: Format::new().set_text_wrap().set_align(FormatAlign::Top),
        }
    }

    fn for_style(&self, style: CellStyle) -> Option<&Format> {
        match style {
            CellStyle::Plain => None,
            CellStyle::Currency => Some(&self.currency),
        }
    }
}

/// `"{agency}_{brand}_Report.xlsx"`, with path separators replaced.
pub fn report_file_name(agency: &str, brand: &str) -> String {
    let safe = |s: &str| s.replace(['/', '\\'], "_");
    format!("{}_{}_Report.xlsx", safe(agency), safe(brand))
}

pub fn export_report(artifact: &ReportArtifact, agency: &str, brand: &str) -> Result<ExportedReport> {
    let bytes = render_xlsx(artifact)?;
    let file_name = report_file_name(agency, brand);
    info!("Rendered {} ({} bytes)", file_name, bytes.len());
    Ok(ExportedReport {
        file_name,
        content_type: XLSX_CONTENT_TYPE,
        bytes,
    })
}

pub fn render_xlsx(artifact: &ReportArtifact) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let formats = SinkFormats::new();

    for sheet in &artifact.sheets {
        let ws = workbook.add_worksheet();
        ws.set_name(sheet.name.as_str())?;
        for &(col, width) in &sheet.column_widths {
            ws.set_column_width(col, width)?;
        }
        for section in &sheet.sections {
            match section {
                Section::Table(region) => write_table(ws, region, &formats)?,
                Section::Text(region) => write_text(ws, region, &formats)?,
            }
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn write_table(ws: &mut Worksheet, region: &TableRegion, formats: &SinkFormats) -> Result<()> {
    if let Some((anchor, title)) = &region.title {
        ws.write_string_with_format(anchor.row, anchor.col, title.as_str(), &formats.bold)?;
    }

    let origin = region.origin;
    if let Some(header) = &region.header {
        for (i, name) in header.iter().enumerate() {
            ws.write_string_with_format(origin.row, origin.col + i as u16, name.as_str(), &formats.bold)?;
        }
    }

    let first = region.first_data_row();
    for (r, cells) in region.rows.iter().enumerate() {
        for (c, value) in cells.iter().enumerate() {
            let style = region
                .column_styles
                .get(c)
                .copied()
                .unwrap_or(CellStyle::Plain);
            write_cell(
                ws,
                first + r as u32,
                origin.col + c as u16,
                value,
                formats.for_style(style),
            )?;
        }
    }

    if let Some(f) = region.filter {
        ws.autofilter(f.first_row, f.first_col, f.last_row, f.last_col)?;
    }
    Ok(())
}

fn write_text(ws: &mut Worksheet, region: &TextRegion, formats: &SinkFormats) -> Result<()> {
    let (row, col) = (region.anchor.row, region.anchor.col);
    if region.wrap {
        ws.write_string_with_format(row, col, region.text.as_str(), &formats.wrap)?;
    } else {
        ws.write_string(row, col, region.text.as_str())?;
    }
    Ok(())
}

fn write_cell(
    ws: &mut Worksheet,
    row: u32,
    col: u16,
    value: &CellValue,
    format: Option<&Format>,
) -> Result<()> {
    // Nulls stay empty cells.
    match (value, format) {
        (CellValue::Null, _) => {}
        (CellValue::Text(s), Some(f)) => {
            ws.write_string_with_format(row, col, s.as_str(), f)?;
        }
        (CellValue::Text(s), None) => {
            ws.write_string(row, col, s.as_str())?;
        }
        (CellValue::Number(n), Some(f)) => {
            ws.write_number_with_format(row, col, *n, f)?;
        }
        (CellValue::Number(n), None) => {
            ws.write_number(row, col, *n)?;
        }
    }
    Ok(())
}
