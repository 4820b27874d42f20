use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Required column missing from input table: {0}")]
    MissingColumn(String),

    #[error("Sales rep {0} is not assigned to any territory in the configuration")]
    UnresolvedRep(String),

    #[error("Unknown territory: {0}")]
    UnknownTerritory(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
}

pub type Result<T> = std::result::Result<T, ReportError>;
