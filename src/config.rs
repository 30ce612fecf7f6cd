use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::render::Canvas;
use crate::solver::SolverOptions;

/// Settings read from a TOML file; every field has a default.
///
/// ```toml
/// [render]
/// width = 1000
/// height = 250
/// font_size = 32.0
///
/// [solver]
/// index_symbol = "n"
/// factor_search_limit = 200000
/// verify_terms = 16
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub render: RenderConfig,
    pub solver: SolverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub width: u32,
    pub height: u32,
    pub font_size: f64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        let canvas = Canvas::default();
        RenderConfig {
            width: canvas.width,
            height: canvas.height,
            font_size: canvas.font_size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub index_symbol: String,
    pub factor_search_limit: usize,
    pub verify_terms: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let options = SolverOptions::default();
        SolverConfig {
            index_symbol: options.index_symbol,
            factor_search_limit: options.factor_search_limit,
            verify_terms: options.verify_terms,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses and validates.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.width == 0 || self.render.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "render.width/render.height",
                reason: "canvas must have a positive size".to_string(),
            });
        }
        if !(self.render.font_size.is_finite() && self.render.font_size > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "render.font_size",
                reason: format!("expected a positive size, got {}", self.render.font_size),
            });
        }

        let mut symbol = self.solver.index_symbol.chars();
        let single_letter = matches!(
            (symbol.next(), symbol.next()),
            (Some(c), None) if c.is_ascii_alphabetic()
        );
        // `f` would collide with the sequence name and `i` with the imaginary unit
        if !single_letter || matches!(self.solver.index_symbol.as_str(), "f" | "i") {
            return Err(ConfigError::InvalidValue {
                field: "solver.index_symbol",
                reason: format!(
                    "expected a single ASCII letter other than f and i, got '{}'",
                    self.solver.index_symbol
                ),
            });
        }
        if self.solver.factor_search_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "solver.factor_search_limit",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.render.width,
            height: self.render.height,
            font_size: self.render.font_size,
        }
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions::from(&self.solver)
    }
}

impl From<&SolverConfig> for SolverOptions {
    fn from(config: &SolverConfig) -> Self {
        SolverOptions {
            index_symbol: config.index_symbol.clone(),
            factor_search_limit: config.factor_search_limit,
            verify_terms: config.verify_terms,
        }
    }
}
