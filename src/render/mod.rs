//! Typesetting a closed form onto a fixed canvas.

mod svg;

use thiserror::Error;
use tracing::debug;

use crate::error::{RequestError, Result};
use crate::format::{latex, pretty};
use crate::solver::ClosedForm;

pub use svg::SvgTypesetter;

/// Drawing surface of a fixed size in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub font_size: f64,
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas {
            width: 1000,
            height: 250,
            font_size: 32.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedFormula {
    /// `f_n = ...` as given to the typesetter.
    pub latex: String,
    pub plain: String,
    pub svg: String,
    pub canvas: Canvas,
}

/// What the presentation layer shows for one request.
#[derive(Clone, Debug, PartialEq)]
pub enum FormulaArtifact {
    Image(RenderedFormula),
    Message(String),
}

impl FormulaArtifact {
    pub fn is_image(&self) -> bool {
        matches!(self, FormulaArtifact::Image(_))
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            FormulaArtifact::Message(msg) => Some(msg),
            FormulaArtifact::Image(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unbalanced braces at offset {0}")]
    UnbalancedBraces(usize),
    #[error("unsupported command \\{0}")]
    UnknownCommand(String),
    #[error("missing argument for {0}")]
    MissingArgument(String),
    #[error("unexpected '{0}' at offset {1}")]
    Unexpected(char, usize),
}

impl From<RenderError> for RequestError {
    fn from(err: RenderError) -> Self {
        RequestError::RenderFailure(err.to_string())
    }
}

/// Turns a LaTeX math string into a drawing of the canvas size.
pub trait Typesetter: Send + Sync {
    fn typeset(&self, latex: &str, canvas: &Canvas) -> std::result::Result<String, RenderError>;
}

/// Typesets `f_n = <closed form>`.
pub fn render_closed_form(
    closed: &ClosedForm,
    typesetter: &dyn Typesetter,
    canvas: &Canvas,
) -> Result<RenderedFormula> {
    let expr = closed.to_expr();
    let index = closed.index_symbol();
    let source = format!("f_{index} = {}", latex(&expr));
    debug!(latex = %source, "typesetting");
    let svg = typesetter.typeset(&source, canvas)?;
    Ok(RenderedFormula {
        latex: source,
        plain: format!("f({index}) = {}", pretty(&expr)),
        svg,
        canvas: canvas.clone(),
    })
}
