// Entry point and interactive CLI flow.
//
// The menu lets the user:
// - load the YTD and MTD sales tables named in the configuration,
// - narrow the view (period, sales manager, agency),
// - print the dashboard, export the filtered rows, or build the Excel
//   recap report for one agency.
//
// Usage: sales_report [config.json]
mod config;
mod error;
mod filter;
mod loader;
mod metrics;
mod narrative;
mod normalize;
mod output;
mod report;
mod sink;
mod types;
mod util;

use config::AppConfig;
use error::Result;
use filter::{PeriodView, Selection};
use log::error;
use normalize::NormalizeOptions;
use once_cell::sync::Lazy;
use std::io::{self, Write};
use std::sync::{Mutex, MutexGuard};
use types::{AgencySalesRow, CustomerSalesRow, SalesTable, SortDirection, AGENCY_COLUMN};

// Session state: the loaded tables and the current selection. Aggregates
// are never kept here; every screen recomputes from the selected slice.
static APP_STATE: Lazy<Mutex<AppState>> = Lazy::new(|| Mutex::new(AppState::default()));

#[derive(Default)]
struct AppState {
    data: Option<Datasets>,
    selection: Selection,
}

struct Datasets {
    ytd: SalesTable,
    mtd: SalesTable,
}

fn state() -> MutexGuard<'static, AppState> {
    APP_STATE.lock().unwrap_or_else(|e| e.into_inner())
}

/// Read a single line of input after printing the common "Enter choice:" prompt.
fn read_choice() -> String {
    print!("Enter choice: ");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    io::stdin().read_line(&mut buf).ok();
    buf.trim().to_string()
}

/// Show a numbered list and return the picked index.
fn choose(title: &str, options: &[String]) -> usize {
    loop {
        println!("{}", title);
        for (i, opt) in options.iter().enumerate() {
            println!("[{}] {}", i + 1, opt);
        }
        match read_choice().parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => {
                println!();
                return n - 1;
            }
            _ => println!("Invalid choice. Please enter 1-{}.\n", options.len()),
        }
    }
}

/// `"All"` first, then the given names; picking "All" maps to `None`.
fn choose_with_all(title: &str, names: Vec<String>) -> Option<String> {
    let mut options = vec!["All".to_string()];
    options.extend(names);
    let idx = choose(title, &options);
    if idx == 0 {
        None
    } else {
        Some(options.swap_remove(idx))
    }
}

fn load_view(config: &AppConfig, view: PeriodView) -> Result<SalesTable> {
    let view_cfg = view.view_config(config);
    let (raw, load_report) =
        loader::load_table(&view_cfg.source, config.currency_columns.as_deref())?;
    let (normalized, norm_report) = normalize::normalize(
        &raw,
        &NormalizeOptions::for_view(config, &view_cfg.sales_column),
    )?;
    let enriched = filter::enrich(&normalized, config)?;
    println!(
        "{}: {} rows loaded from {}",
        view_cfg.label,
        util::format_int(load_report.total_rows),
        view_cfg.source.display()
    );
    if norm_report.coerced_to_zero > 0 {
        println!(
            "Note: {} unreadable amounts were counted as $0.",
            util::format_int(norm_report.coerced_to_zero)
        );
    }
    Ok(enriched)
}

fn load_datasets(config: &AppConfig) -> Result<Datasets> {
    Ok(Datasets {
        ytd: load_view(config, PeriodView::Ytd)?,
        mtd: load_view(config, PeriodView::Mtd)?,
    })
}

/// Handle option [1]: load, clean and label both period tables.
fn handle_load(config: &AppConfig) {
    match load_datasets(config) {
        Ok(data) => {
            println!();
            state().data = Some(data);
        }
        Err(e) => {
            error!("Load failed: {}", e);
            eprintln!("Failed to load data: {}\n", e);
        }
    }
}

/// Table for the selected period view, unfiltered.
fn view_table() -> Option<(SalesTable, Selection)> {
    let st = state();
    let data = st.data.as_ref()?;
    let table = match st.selection.view {
        PeriodView::Ytd => data.ytd.clone(),
        PeriodView::Mtd => data.mtd.clone(),
    };
    Some((table, st.selection.clone()))
}

fn require_data() -> Option<(SalesTable, Selection)> {
    let found = view_table();
    if found.is_none() {
        println!("Error: No data loaded. Please load the data first (option 1).\n");
    }
    found
}

fn handle_select_view(config: &AppConfig) {
    let options = vec![config.views.ytd.label.clone(), config.views.mtd.label.clone()];
    let view = match choose("Select View", &options) {
        0 => PeriodView::Ytd,
        _ => PeriodView::Mtd,
    };
    state().selection.view = view;
}

fn handle_select_territory(config: &AppConfig) {
    let names = config.territory_names().into_iter().map(String::from).collect();
    let territory = choose_with_all("Select Sales Manager", names);
    state().selection.territory = territory;
}

fn handle_select_agency() -> Result<()> {
    let Some((table, _)) = require_data() else {
        return Ok(());
    };
    let agency = choose_with_all("Filter by Agency", filter::agencies(&table)?);
    state().selection.agency = agency;
    Ok(())
}

fn customer_rows(
    table: &SalesTable,
    config: &AppConfig,
    sales_column: &str,
    n: usize,
    direction: SortDirection,
) -> Result<Vec<CustomerSalesRow>> {
    let keys = [config.columns.customer.as_str(), AGENCY_COLUMN];
    let groups = metrics::top_groups(table, &keys, sales_column, n, direction)?;
    Ok(groups
        .into_iter()
        .map(|(key, sales)| CustomerSalesRow {
            customer: key[0].clone(),
            agency: key[1].clone(),
            sales: util::format_currency(sales, 2),
        })
        .collect())
}

/// Handle option [5]: headline numbers, top/bottom customers, agency totals.
fn handle_dashboard(config: &AppConfig) -> Result<()> {
    let Some((table, selection)) = require_data() else {
        return Ok(());
    };
    let filtered = filter::apply(&table, &selection)?;
    let summary = filter::dashboard_summary(&filtered, config, &selection)?;
    let sales_column = &selection.view.view_config(config).sales_column;

    println!(
        "Now Viewing: {} Performance ({} / {})\n",
        summary.view, summary.territory, summary.agency
    );
    println!("Customers:  {}", util::format_int(summary.total_customers));
    println!("Sales:      {}", util::format_currency(summary.total_sales, 2));
    println!("Budget:     {}", util::format_currency(summary.budget, 2));
    println!("% to Goal:  {}%", util::format_number(summary.percent_to_goal, 1));
    if filtered.is_empty() {
        println!("\n(no rows match the current selection)\n");
        return Ok(());
    }

    let n = config.report.top_customers;
    let top = customer_rows(&filtered, config, sales_column, n, SortDirection::Descending)?;
    output::preview_table(&format!("Top {} Customers by Sales", n), &top, n);
    let bottom = customer_rows(&filtered, config, sales_column, n, SortDirection::Ascending)?;
    output::preview_table(&format!("Bottom {} Customers by Sales", n), &bottom, n);

    let agencies: Vec<AgencySalesRow> = metrics::top_n(
        &filtered,
        AGENCY_COLUMN,
        sales_column,
        usize::MAX,
        SortDirection::Ascending,
    )?
    .into_iter()
    .map(|e| AgencySalesRow {
        agency: e.key,
        sales: util::format_currency(e.value, 0),
    })
    .collect();
    output::preview_table("Agency Sales Comparison", &agencies, agencies.len());
    Ok(())
}

/// Handle option [6]: filtered rows as CSV plus the headline numbers as JSON.
fn handle_export_data(config: &AppConfig) -> Result<()> {
    let Some((table, selection)) = require_data() else {
        return Ok(());
    };
    let filtered = filter::apply(&table, &selection)?;
    let label = &selection.view.view_config(config).label;
    let csv_path = format!("Filtered_{}_{}_Sales.csv", config.brand, label);
    output::write_table_csv(&csv_path, &filtered)?;
    let summary = filter::dashboard_summary(&filtered, config, &selection)?;
    output::write_json("summary.json", &summary)?;
    println!(
        "Exported {} rows to {} (summary in summary.json)\n",
        util::format_int(filtered.len()),
        csv_path
    );
    Ok(())
}

/// Handle option [7]: build and save the Excel recap for one agency.
fn handle_generate_report(config: &AppConfig) -> Result<()> {
    let Some((table, selection)) = require_data() else {
        return Ok(());
    };
    let filtered = filter::apply(&table, &selection)?;
    let export_agency =
        choose_with_all("Select Agency to Export", filter::agencies(&filtered)?);
    let subject = export_agency.as_deref().unwrap_or("All");
    let export_table = filter::for_agency(&filtered, export_agency.as_deref())?;

    println!("Generating report...");
    let artifact = report::build_report(
        &export_table,
        &report::ReportRequest {
            subject,
            sales_column: &selection.view.view_config(config).sales_column,
            config,
        },
    )?;
    let exported = sink::export_report(&artifact, subject, &config.brand)?;
    let path = output::write_report_file(".", &exported)?;
    println!(
        "Report saved to {} ({}, {} bytes)\n",
        path.display(),
        exported.content_type,
        util::format_int(exported.bytes.len())
    );
    Ok(())
}

fn report_failure(result: Result<()>) {
    if let Err(e) = result {
        error!("{}", e);
        eprintln!("Error: {}\n", e);
    }
}

fn main() {
    env_logger::init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let config = match AppConfig::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration {}: {}", config_path, e);
            std::process::exit(1);
        }
    };

    loop {
        let selection = state().selection.clone();
        println!(
            "{} Sales Dashboard ({} | {} | {})",
            config.brand,
            selection.view.view_config(&config).label,
            selection.territory_label(),
            selection.agency_label()
        );
        println!("[1] Load the data");
        println!("[2] Select view");
        println!("[3] Select sales manager");
        println!("[4] Select agency");
        println!("[5] Show dashboard");
        println!("[6] Export filtered data");
        println!("[7] Generate Excel report");
        println!("[0] Exit\n");
        match read_choice().as_str() {
            "1" => handle_load(&config),
            "2" => handle_select_view(&config),
            "3" => handle_select_territory(&config),
            "4" => report_failure(handle_select_agency()),
            "5" => report_failure(handle_dashboard(&config)),
            "6" => report_failure(handle_export_data(&config)),
            "7" => report_failure(handle_generate_report(&config)),
            "0" => {
                println!("Exiting the program.");
                break;
            }
            _ => println!("Invalid choice. Please enter 0-7.\n"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::Path;

    fn shipped_config() -> AppConfig {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join(config::DEFAULT_CONFIG_PATH);
        AppConfig::load(path).unwrap()
    }

    #[test]
    fn shipped_config_and_sample_data_load() {
        let cfg = shipped_config();
        let data = load_datasets(&cfg).unwrap();
        assert_eq!(data.ytd.len(), 9);
        assert_eq!(data.mtd.len(), 6);
        assert_eq!(
            filter::agencies(&data.ytd).unwrap(),
            vec!["Morris-Tait", "New Era", "NuTech", "Phoenix"]
        );
    }

    #[test]
    fn agency_report_end_to_end() {
        let cfg = shipped_config();
        let data = load_datasets(&cfg).unwrap();
        let selection = Selection {
            territory: Some("Cole".into()),
            ..Selection::default()
        };
        let filtered = filter::apply(&data.ytd, &selection).unwrap();
        let export = filter::for_agency(&filtered, Some("Morris-Tait")).unwrap();
        assert_eq!(export.len(), 2);

        let artifact = report::build_report(
            &export,
            &report::ReportRequest {
                subject: "Morris-Tait",
                sales_column: &cfg.views.ytd.sales_column,
                config: &cfg,
            },
        )
        .unwrap();
        let exported = sink::export_report(&artifact, "Morris-Tait", &cfg.brand).unwrap();
        assert_eq!(exported.file_name, "Morris-Tait_Proluxe_Report.xlsx");
        assert_eq!(&exported.bytes[..2], b"PK");
    }

    #[test]
    fn customer_rows_rank_by_customer_and_agency() {
        let cfg = shipped_config();
        let data = load_datasets(&cfg).unwrap();
        let rows = customer_rows(
            &data.ytd,
            &cfg,
            &cfg.views.ytd.sales_column,
            2,
            SortDirection::Descending,
        )
        .unwrap();
        assert_eq!(rows[0].customer, "Bright Homes");
        assert_eq!(rows[0].sales, "$48,250.00");
        assert_eq!(rows[1].customer, "Coastal Electric");
        assert_eq!(rows[1].agency, "NuTech");
    }
}
