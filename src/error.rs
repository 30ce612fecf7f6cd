use thiserror::Error;

use crate::solver::NoClosedFormReason;

pub type Result<T> = std::result::Result<T, RequestError>;

/// Shown when the declared order does not match the supplied lists.
pub const COUNT_MISMATCH: &str = "número de coeficientes o valores iniciales incorrecto";

/// Shown when the solver ran but could not close the recurrence.
pub const NO_CLOSED_FORM: &str = "No se pudo encontrar una solución cerrada.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("parse error: {0}")]
    Parse(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("no closed form: {0}")]
    NoClosedForm(NoClosedFormReason),
    #[error("solver failure: {0}")]
    SolverFailure(String),
    #[error("render failure: {0}")]
    RenderFailure(String),
    #[error("request cancelled")]
    Cancelled,
}

impl RequestError {
    pub fn count_mismatch() -> Self {
        RequestError::Validation(COUNT_MISMATCH.to_string())
    }

    /// The text the presentation layer shows in place of a formula.
    pub fn display_message(&self) -> String {
        match self {
            RequestError::Parse(msg) => format!("Error: {msg}"),
            RequestError::Validation(msg) => format!("Error: {msg}."),
            RequestError::NoClosedForm(_) => NO_CLOSED_FORM.to_string(),
            RequestError::SolverFailure(msg) => format!("Error: {msg}"),
            RequestError::RenderFailure(msg) => format!("Error: {msg}"),
            RequestError::Cancelled => "Cancelado.".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}
