//! Parse, solve, render: one request from raw text to a display artifact.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::config::Config;
use crate::error::{RequestError, Result};
use crate::parser::parse_request;
use crate::recurrence::RecurrenceSpec;
use crate::render::{Canvas, FormulaArtifact, RenderedFormula, SvgTypesetter, Typesetter, render_closed_form};
use crate::solver::{ClosedForm, SolveOutcome, SolverOptions, solve_recurrence};

/// The three raw strings a user submits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub order: String,
    pub coefficients: String,
    pub initial_values: String,
}

impl Request {
    pub fn new(
        order: impl Into<String>,
        coefficients: impl Into<String>,
        initial_values: impl Into<String>,
    ) -> Self {
        Request {
            order: order.into(),
            coefficients: coefficients.into(),
            initial_values: initial_values.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Idle,
    Parsing,
    Solving,
    Rendering,
    Done,
    Failed,
}

#[derive(Clone, Debug)]
pub struct Solution {
    pub spec: RecurrenceSpec,
    pub closed_form: ClosedForm,
    pub formula: RenderedFormula,
}

#[derive(Clone)]
pub struct Pipeline {
    options: SolverOptions,
    canvas: Canvas,
    typesetter: Arc<dyn Typesetter>,
}

impl Default for Pipeline {
    fn default() -> Self {
        Pipeline::new(&Config::default())
    }
}

impl Pipeline {
    pub fn new(config: &Config) -> Self {
        Pipeline {
            options: config.solver_options(),
            canvas: config.canvas(),
            typesetter: Arc::new(SvgTypesetter),
        }
    }

    pub fn with_typesetter(mut self, typesetter: Arc<dyn Typesetter>) -> Self {
        self.typesetter = typesetter;
        self
    }

    pub fn options(&self) -> &SolverOptions {
        &self.options
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn run(&self, request: &Request, cancel: &CancelToken) -> Result<Solution> {
        self.run_observed(request, cancel, |_| {})
    }

    /// Runs the stages in order, reporting each transition to `observe`.
    /// The last reported stage is `Done` or `Failed`, also when a stage
    /// panics.
    pub fn run_observed(
        &self,
        request: &Request,
        cancel: &CancelToken,
        mut observe: impl FnMut(Stage),
    ) -> Result<Solution> {
        let result = guard(|| self.run_stages(request, cancel, &mut observe));
        match &result {
            Ok(solution) => {
                info!(recurrence = %solution.spec, closed_form = %solution.closed_form, "request solved");
                observe(Stage::Done);
            }
            Err(RequestError::Cancelled) => {
                debug!("request cancelled");
                observe(Stage::Failed);
            }
            Err(err) => {
                warn!(error = %err, "request failed");
                observe(Stage::Failed);
            }
        }
        result
    }

    fn run_stages(
        &self,
        request: &Request,
        cancel: &CancelToken,
        observe: &mut impl FnMut(Stage),
    ) -> Result<Solution> {
        observe(Stage::Parsing);
        debug!(order = %request.order, coefficients = %request.coefficients, initial = %request.initial_values, "parsing");
        let spec = parse_request(&request.order, &request.coefficients, &request.initial_values)?;
        cancel.check()?;

        observe(Stage::Solving);
        debug!(recurrence = %spec, "solving");
        let closed_form = match solve_recurrence(&spec, &self.options, cancel)? {
            SolveOutcome::Solved(closed_form) => closed_form,
            SolveOutcome::NoClosedForm(reason) => return Err(RequestError::NoClosedForm(reason)),
        };
        cancel.check()?;

        observe(Stage::Rendering);
        let formula = render_closed_form(&closed_form, self.typesetter.as_ref(), &self.canvas)?;

        Ok(Solution {
            spec,
            closed_form,
            formula,
        })
    }

    /// Runs the request and turns any failure into the message shown in place
    /// of the formula.
    pub fn solve(&self, request: &Request, cancel: &CancelToken) -> FormulaArtifact {
        match self.run(request, cancel) {
            Ok(solution) => FormulaArtifact::Image(solution.formula),
            Err(err) => FormulaArtifact::Message(err.display_message()),
        }
    }
}

/// Runs `f`, reporting a panic inside it as a [`RequestError::SolverFailure`]
/// carrying the panic message.
pub fn guard<T>(f: impl FnOnce() -> Result<T>) -> Result<T> {
    panic::catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unexpected panic".to_string());
        Err(RequestError::SolverFailure(message))
    })
}

/// Synchronous entry point with the default configuration.
pub fn solve(order: &str, coefficients: &str, initial_values: &str) -> FormulaArtifact {
    Pipeline::default().solve(
        &Request::new(order, coefficients, initial_values),
        &CancelToken::new(),
    )
}
