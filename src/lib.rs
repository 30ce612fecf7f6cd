//! Closed-form solutions for linear homogeneous recurrences with constant rational
//! coefficients, from raw user input to a typeset formula.

pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod expr;
pub mod factor;
pub mod field;
pub mod format;
pub mod logging;
pub mod parser;
pub mod pipeline;
pub mod polynomial;
pub mod recurrence;
pub mod render;
pub mod solver;

pub use cancel::CancelToken;
pub use config::{Config, RenderConfig, SolverConfig};
pub use dispatch::{DisplaySlot, DisplayState, Dispatcher, PENDING_TEXT, Ticket, Update};
pub use error::{ConfigError, RequestError, Result};
pub use expr::{Expr, Rational};
pub use factor::{Factor, FactorKind, Factorization, factor_polynomial};
pub use field::{Field, Surd};
pub use format::{latex, pretty};
pub use parser::{parse_order, parse_rational, parse_rational_list, parse_request};
pub use pipeline::{Pipeline, Request, Solution, Stage, guard, solve};
pub use polynomial::{CoeffOps, Poly, Polynomial};
pub use recurrence::RecurrenceSpec;
pub use render::{
    Canvas, FormulaArtifact, RenderError, RenderedFormula, SvgTypesetter, Typesetter,
    render_closed_form,
};
pub use solver::{
    ClosedForm, Component, NoClosedFormReason, SolveOutcome, SolverOptions, solve_recurrence,
};
