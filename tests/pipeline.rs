use std::sync::Arc;

use recsolve::{
    CancelToken, Canvas, Config, FormulaArtifact, Pipeline, RenderError, Request, RequestError,
    Stage, Typesetter, guard, solve,
};

struct BrokenTypesetter;

impl Typesetter for BrokenTypesetter {
    fn typeset(&self, _latex: &str, _canvas: &Canvas) -> Result<String, RenderError> {
        Err(RenderError::UnbalancedBraces(0))
    }
}

struct PanickingTypesetter;

impl Typesetter for PanickingTypesetter {
    fn typeset(&self, _latex: &str, _canvas: &Canvas) -> Result<String, RenderError> {
        panic!("typesetter exploded");
    }
}

fn stages(pipeline: &Pipeline, request: Request) -> Vec<Stage> {
    let mut seen = Vec::new();
    let _ = pipeline.run_observed(&request, &CancelToken::new(), |stage| seen.push(stage));
    seen
}

#[test]
fn powers_of_two_render_an_image() {
    let FormulaArtifact::Image(formula) = solve("1", "2", "1") else {
        panic!("expected an image");
    };
    assert_eq!(formula.latex, "f_n = 2^{n}");
    assert_eq!(formula.plain, "f(n) = 2^n");
    assert!(formula.svg.starts_with("<svg"));
    assert_eq!(formula.canvas, Canvas::default());
}

#[test]
fn fibonacci_is_not_reported_unsolvable() {
    let artifact = solve("2", "1,1", "0,1");
    assert!(artifact.is_image());
}

#[test]
fn short_decimals_are_accepted() {
    let FormulaArtifact::Image(formula) = solve("1", ".5", "1") else {
        panic!("expected an image");
    };
    assert_eq!(formula.plain, "f(n) = (1/2)^n");
}

#[test]
fn failures_become_messages() {
    assert_eq!(
        solve("2", "1", "0,1"),
        FormulaArtifact::Message(
            "Error: número de coeficientes o valores iniciales incorrecto.".to_string()
        )
    );
    assert_eq!(
        solve("3", "1,1,1", "0,0,1"),
        FormulaArtifact::Message("No se pudo encontrar una solución cerrada.".to_string())
    );
    assert_eq!(
        solve("x", "1", "1"),
        FormulaArtifact::Message("Error: invalid order 'x'".to_string())
    );
    assert_eq!(
        solve("1", "1/0", "1").message(),
        Some("Error: zero denominator in '1/0'")
    );
}

#[test]
fn lifecycle_of_each_outcome() {
    let pipeline = Pipeline::default();
    assert_eq!(
        stages(&pipeline, Request::new("1", "2", "1")),
        vec![Stage::Parsing, Stage::Solving, Stage::Rendering, Stage::Done]
    );
    assert_eq!(
        stages(&pipeline, Request::new("2", "1", "1")),
        vec![Stage::Parsing, Stage::Failed]
    );
    assert_eq!(
        stages(&pipeline, Request::new("3", "1,1,1", "0,0,1")),
        vec![Stage::Parsing, Stage::Solving, Stage::Failed]
    );

    let broken = Pipeline::default().with_typesetter(Arc::new(BrokenTypesetter));
    assert_eq!(
        stages(&broken, Request::new("1", "2", "1")),
        vec![Stage::Parsing, Stage::Solving, Stage::Rendering, Stage::Failed]
    );
}

#[test]
fn render_failure_is_recoverable() {
    let pipeline = Pipeline::default().with_typesetter(Arc::new(BrokenTypesetter));
    let request = Request::new("1", "2", "1");
    let err = pipeline.run(&request, &CancelToken::new()).unwrap_err();
    assert_eq!(
        err,
        RequestError::RenderFailure("unbalanced braces at offset 0".to_string())
    );
    assert_eq!(
        pipeline.solve(&request, &CancelToken::new()),
        FormulaArtifact::Message("Error: unbalanced braces at offset 0".to_string())
    );
}

#[test]
fn configuration_reaches_solver_and_renderer() {
    let config = Config::from_toml_str(
        r#"
        [render]
        width = 640
        height = 160

        [solver]
        index_symbol = "k"
        "#,
    )
    .unwrap();
    let pipeline = Pipeline::new(&config);
    let solution = pipeline
        .run(&Request::new("1", "3", "2"), &CancelToken::new())
        .unwrap();
    assert_eq!(solution.formula.latex, "f_k = 2 \\cdot 3^{k}");
    assert_eq!(solution.formula.plain, "f(k) = 2*3^k");
    assert_eq!(solution.formula.canvas.width, 640);
    assert!(solution.formula.svg.contains("height=\"160\""));
}

#[test]
fn cancelled_request_stops_early() {
    let cancel = CancelToken::new();
    cancel.cancel();
    let result = Pipeline::default().run(&Request::new("2", "1,1", "0,1"), &cancel);
    assert_eq!(result.unwrap_err(), RequestError::Cancelled);
}

#[test]
fn same_input_same_output() {
    assert_eq!(solve("2", "1,1", "0,1"), solve("2", "1,1", "0,1"));
    assert_eq!(solve("3", "1,1,1", "0,0,1"), solve("3", "1,1,1", "0,0,1"));
}

#[test]
fn panics_become_solver_failures() {
    let result: recsolve::Result<()> = guard(|| panic!("static message"));
    assert_eq!(
        result,
        Err(RequestError::SolverFailure("static message".to_string()))
    );

    let detail = 42;
    let result: recsolve::Result<()> = guard(|| panic!("formatted {detail}"));
    assert_eq!(
        result,
        Err(RequestError::SolverFailure("formatted 42".to_string()))
    );

    let result: recsolve::Result<()> = guard(|| std::panic::panic_any(7_u32));
    assert_eq!(
        result,
        Err(RequestError::SolverFailure("unexpected panic".to_string()))
    );

    assert_eq!(guard(|| Ok(5)), Ok(5));
    assert_eq!(
        guard::<()>(|| Err(RequestError::Cancelled)),
        Err(RequestError::Cancelled)
    );
}

#[test]
fn panic_while_rendering_fails_the_request() {
    let pipeline = Pipeline::default().with_typesetter(Arc::new(PanickingTypesetter));
    assert_eq!(
        stages(&pipeline, Request::new("1", "2", "1")),
        vec![Stage::Parsing, Stage::Solving, Stage::Rendering, Stage::Failed]
    );
    assert_eq!(
        pipeline.solve(&Request::new("1", "2", "1"), &CancelToken::new()),
        FormulaArtifact::Message("Error: typesetter exploded".to_string())
    );
}
