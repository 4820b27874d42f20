// Report configuration loaded from JSON at startup.
//
// Rep ids, territories, agencies and budgets live here instead of in code.
// The loaded value is validated once and then only read.
use crate::error::{ReportError, Result};
use log::{debug, info};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "config/proluxe.json";
pub const DEFAULT_BLANK_SENTINEL: &str = "(Blanks)";
pub const DEFAULT_CLOSING_LINE: &str = "🔥 Product to plug: Rhyme Downlights. Sleek, simple, and a showroom favorite.\n    Let’s lean into wins, check in on our quiet ones, and light it up ⚡";

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Company name used in report file names.
    pub brand: String,
    #[serde(default = "default_blank_sentinel")]
    pub blank_sentinel: String,
    #[serde(default)]
    pub columns: ColumnNames,
    pub views: PeriodViews,
    /// Explicit currency columns. When absent, columns mentioning "Sales" are currency.
    #[serde(default)]
    pub currency_columns: Option<Vec<String>>,
    pub territories: BTreeMap<String, TerritoryConfig>,
    pub all_budget: f64,
    /// Rep id -> agency name.
    #[serde(default)]
    pub rep_agencies: BTreeMap<String, String>,
    /// Agency name -> budget.
    #[serde(default)]
    pub agency_budgets: BTreeMap<String, f64>,
    #[serde(default)]
    pub report: ReportSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnNames {
    pub customer: String,
    pub category: String,
    pub sales_rep: String,
    pub prior_sales: String,
}

impl Default for ColumnNames {
    fn default() -> Self {
        Self {
            customer: "Customer Name".into(),
            category: "Category 1".into(),
            sales_rep: "Sales Rep".into(),
            prior_sales: "Prior Sales".into(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PeriodViews {
    pub ytd: ViewConfig,
    pub mtd: ViewConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ViewConfig {
    pub label: String,
    /// CSV file holding this view's rows, relative to the config file.
    pub source: PathBuf,
    pub sales_column: String,
    #[serde(default)]
    pub budget_column: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TerritoryConfig {
    pub reps: Vec<String>,
    pub budget: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub top_customers: usize,
    pub highlight_count: usize,
    pub closing_line: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            top_customers: 10,
            highlight_count: 3,
            closing_line: DEFAULT_CLOSING_LINE.to_string(),
        }
    }
}

fn default_blank_sentinel() -> String {
    DEFAULT_BLANK_SENTINEL.to_string()
}

impl AppConfig {
    /// Read, parse and validate a config file. View sources are resolved
    /// relative to the file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config = Self::from_json(&text)?;
        if let Some(base) = path.parent() {
            for view in [&mut config.views.ytd, &mut config.views.mtd] {
                if view.source.is_relative() {
                    view.source = base.join(&view.source);
                }
            }
        }
        info!(
            "Loaded configuration for {} from {} ({} territories, {} agencies)",
            config.brand,
            path.display(),
            config.territories.len(),
            config.agency_budgets.len()
        );
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: AppConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ReportError::InvalidConfig(msg));

        if self.blank_sentinel.is_empty() {
            return invalid("blank sentinel must not be empty".into());
        }
        for view in [&self.views.ytd, &self.views.mtd] {
            if view.sales_column.trim().is_empty() {
                return invalid(format!("view {} has no sales column", view.label));
            }
        }
        if self.report.top_customers == 0 || self.report.highlight_count == 0 {
            return invalid("ranking sizes must be greater than zero".into());
        }
        check_budget("all territories", self.all_budget)?;

        let mut owner: HashMap<&str, &str> = HashMap::new();
        for (name, territory) in &self.territories {
            check_budget(name, territory.budget)?;
            for rep in &territory.reps {
                if let Some(prev) = owner.insert(rep.as_str(), name.as_str()) {
                    return invalid(format!(
                        "rep {} is assigned to both {} and {}",
                        rep, prev, name
                    ));
                }
            }
        }
        for (rep, agency) in &self.rep_agencies {
            if !owner.contains_key(rep.as_str()) {
                return invalid(format!(
                    "rep {} ({}) is not assigned to any territory",
                    rep, agency
                ));
            }
            if !self.agency_budgets.contains_key(agency) {
                return invalid(format!("agency {} has no budget", agency));
            }
        }
        for (agency, budget) in &self.agency_budgets {
            check_budget(agency, *budget)?;
        }
        debug!("Configuration validated: {} reps resolved", owner.len());
        Ok(())
    }

    /// Territory (sales manager) owning a rep id.
    pub fn territory_of(&self, rep: &str) -> Option<&str> {
        self.territories
            .iter()
            .find(|(_, t)| t.reps.iter().any(|r| r == rep))
            .map(|(name, _)| name.as_str())
    }

    pub fn agency_of(&self, rep: &str) -> Option<&str> {
        self.rep_agencies.get(rep).map(String::as_str)
    }

    pub fn territory_names(&self) -> Vec<&str> {
        self.territories.keys().map(String::as_str).collect()
    }

    /// Budget for one territory, or for all territories when `None`.
    pub fn territory_budget(&self, territory: Option<&str>) -> Result<f64> {
        match territory {
            None => Ok(self.all_budget),
            Some(name) => self
                .territories
                .get(name)
                .map(|t| t.budget)
                .ok_or_else(|| ReportError::UnknownTerritory(name.to_string())),
        }
    }

    /// Unlisted agencies have no budget.
    pub fn agency_budget(&self, agency: &str) -> f64 {
        self.agency_budgets.get(agency).copied().unwrap_or(0.0)
    }
}

fn check_budget(name: &str, budget: f64) -> Result<()> {
    if !budget.is_finite() || budget < 0.0 {
        return Err(ReportError::InvalidConfig(format!(
            "budget for {} must be a non-negative number, got {}",
            name, budget
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE: &str = r#"{
        "brand": "Proluxe",
        "views": {
            "ytd": { "label": "YTD", "source": "ytd.csv", "sales_column": "Current Sales" },
            "mtd": { "label": "MTD", "source": "mtd.csv", "sales_column": "FY25 Current MTD",
                     "budget_column": "Proluxe FY25 Monthly Budget" }
        },
        "territories": {
            "Cole": { "reps": ["609", "617"], "budget": 1000.0 },
            "Jake": { "reps": ["601"], "budget": 500.0 },
            "Proluxe": { "reps": ["Home"], "budget": 250.0 }
        },
        "all_budget": 1750.0,
        "rep_agencies": { "609": "Morris-Tait", "617": "NuTech", "601": "New Era" },
        "agency_budgets": { "Morris-Tait": 800.0, "NuTech": 200.0, "New Era": 0.0 }
    }"#;

    pub(crate) fn sample_config() -> AppConfig {
        AppConfig::from_json(SAMPLE).unwrap()
    }

    #[test]
    fn parses_with_defaults() {
        let cfg = sample_config();
        assert_eq!(cfg.blank_sentinel, "(Blanks)");
        assert_eq!(cfg.columns.customer, "Customer Name");
        assert_eq!(cfg.report.top_customers, 10);
        assert_eq!(cfg.report.highlight_count, 3);
        assert_eq!(cfg.territory_of("617"), Some("Cole"));
        assert_eq!(cfg.territory_of("Home"), Some("Proluxe"));
        assert_eq!(cfg.agency_of("Home"), None);
        assert_eq!(cfg.territory_of("999"), None);
    }

    #[test]
    fn budgets_by_scope() {
        let cfg = sample_config();
        assert_eq!(cfg.territory_budget(None).unwrap(), 1750.0);
        assert_eq!(cfg.territory_budget(Some("Jake")).unwrap(), 500.0);
        assert!(matches!(
            cfg.territory_budget(Some("Nobody")),
            Err(ReportError::UnknownTerritory(_))
        ));
        assert_eq!(cfg.agency_budget("NuTech"), 200.0);
        assert_eq!(cfg.agency_budget("Unknown"), 0.0);
    }

    #[test]
    fn rejects_rep_in_two_territories() {
        let text = SAMPLE.replace(r#"["601"]"#, r#"["601", "609"]"#);
        assert!(matches!(
            AppConfig::from_json(&text),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_agency_rep_without_territory() {
        let text = SAMPLE.replace(r#""601": "New Era""#, r#""601": "New Era", "700": "PSG""#);
        let err = AppConfig::from_json(&text).unwrap_err();
        assert!(err.to_string().contains("700"));
    }

    #[test]
    fn rejects_agency_without_budget() {
        let text = SAMPLE.replace(r#", "New Era": 0.0"#, "");
        assert!(matches!(
            AppConfig::from_json(&text),
            Err(ReportError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_negative_budget() {
        let text = SAMPLE.replace("\"budget\": 500.0", "\"budget\": -1.0");
        assert!(AppConfig::from_json(&text).is_err());
    }

    #[test]
    fn load_resolves_sources_next_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let cfg = AppConfig::load(&path).unwrap();
        assert_eq!(cfg.views.ytd.source, dir.path().join("ytd.csv"));
        assert_eq!(cfg.views.mtd.budget_column.as_deref(), Some("Proluxe FY25 Monthly Budget"));
    }
}
