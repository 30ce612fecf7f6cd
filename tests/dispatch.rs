use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use std::time::Duration;

use recsolve::{
    Canvas, Dispatcher, DisplayState, FormulaArtifact, PENDING_TEXT, Pipeline, RenderError,
    Request, Typesetter,
};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Holds every typeset call until the test releases it.
struct GatedTypesetter {
    gate: Mutex<Receiver<()>>,
}

impl GatedTypesetter {
    fn new() -> (Self, Sender<()>) {
        let (release, gate) = mpsc::channel();
        (
            GatedTypesetter {
                gate: Mutex::new(gate),
            },
            release,
        )
    }
}

impl Typesetter for GatedTypesetter {
    fn typeset(&self, latex: &str, _canvas: &Canvas) -> Result<String, RenderError> {
        let gate = self.gate.lock().map_err(|_| RenderError::Unexpected('?', 0))?;
        let _ = gate.recv();
        Ok(format!("<svg>{latex}</svg>"))
    }
}

struct PanickingTypesetter;

impl Typesetter for PanickingTypesetter {
    fn typeset(&self, _latex: &str, _canvas: &Canvas) -> Result<String, RenderError> {
        panic!("typesetter exploded");
    }
}

#[test]
fn pending_text_until_the_result_arrives() {
    let mut dispatcher = Dispatcher::new(Pipeline::default());
    assert_eq!(dispatcher.slot().state(), &DisplayState::Idle);
    assert_eq!(dispatcher.slot().status_text(), None);

    let ticket = dispatcher.submit(Request::new("1", "2", "1"));
    assert_eq!(dispatcher.slot().state(), &DisplayState::Pending(ticket));
    assert_eq!(dispatcher.slot().status_text(), Some(PENDING_TEXT));

    assert!(dispatcher.wait_for(ticket, TIMEOUT));
    let Some(FormulaArtifact::Image(formula)) = dispatcher.slot().artifact() else {
        panic!("expected an image");
    };
    assert_eq!(formula.plain, "f(n) = 2^n");
    assert_eq!(dispatcher.slot().status_text(), None);
}

#[test]
fn failures_show_their_message() {
    let mut dispatcher = Dispatcher::new(Pipeline::default());
    let ticket = dispatcher.submit(Request::new("2", "1", "0,1"));
    assert!(dispatcher.wait_for(ticket, TIMEOUT));
    assert_eq!(
        dispatcher.slot().status_text(),
        Some("Error: número de coeficientes o valores iniciales incorrecto.")
    );

    let ticket = dispatcher.submit(Request::new("3", "1,1,1", "0,0,1"));
    assert!(dispatcher.wait_for(ticket, TIMEOUT));
    assert_eq!(
        dispatcher.slot().artifact(),
        Some(&FormulaArtifact::Message(
            "No se pudo encontrar una solución cerrada.".to_string()
        ))
    );
}

#[test]
fn tickets_increase() {
    let mut dispatcher = Dispatcher::new(Pipeline::default());
    assert_eq!(dispatcher.latest(), None);
    let first = dispatcher.submit(Request::new("1", "2", "1"));
    let second = dispatcher.submit(Request::new("1", "3", "1"));
    assert!(second > first);
    assert_eq!(second.id(), first.id() + 1);
    assert_eq!(dispatcher.latest(), Some(second));
}

#[test]
fn latest_submission_wins() {
    let (typesetter, release) = GatedTypesetter::new();
    let pipeline = Pipeline::default().with_typesetter(Arc::new(typesetter));
    let mut dispatcher = Dispatcher::new(pipeline);

    let first = dispatcher.submit(Request::new("1", "2", "1"));
    let second = dispatcher.submit(Request::new("1", "3", "1"));
    assert!(!dispatcher.wait_for(first, Duration::from_millis(10)));

    // one release per worker that may reach the typesetter
    release.send(()).unwrap();
    release.send(()).unwrap();
    assert!(dispatcher.wait_for(second, TIMEOUT));

    let Some(FormulaArtifact::Image(formula)) = dispatcher.slot().artifact() else {
        panic!("expected an image");
    };
    assert_eq!(formula.plain, "f(n) = 3^n");
    assert!(matches!(dispatcher.slot().state(), DisplayState::Ready(t, _) if *t == second));

    // a late result for the first ticket never replaces the second
    std::thread::sleep(Duration::from_millis(50));
    dispatcher.pump();
    assert!(matches!(dispatcher.slot().state(), DisplayState::Ready(t, _) if *t == second));
}

#[test]
fn pump_applies_arrived_results() {
    let mut dispatcher = Dispatcher::new(Pipeline::default());
    assert!(!dispatcher.pump());

    let ticket = dispatcher.submit(Request::new("2", "1,1", "0,1"));
    let mut shown = false;
    for _ in 0..600 {
        if dispatcher.pump() {
            shown = true;
            break;
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(shown, "result never arrived");
    assert!(matches!(dispatcher.slot().state(), DisplayState::Ready(t, _) if *t == ticket));
    assert!(!dispatcher.pump());
}

#[test]
fn waiting_on_a_shown_ticket_returns_immediately() {
    let mut dispatcher = Dispatcher::new(Pipeline::default());
    let ticket = dispatcher.submit(Request::new("1", "2", "1"));
    assert!(dispatcher.wait_for(ticket, TIMEOUT));
    assert!(dispatcher.wait_for(ticket, Duration::ZERO));
}

#[test]
fn worker_panic_still_reaches_the_display() {
    let pipeline = Pipeline::default().with_typesetter(Arc::new(PanickingTypesetter));
    let mut dispatcher = Dispatcher::new(pipeline);
    let ticket = dispatcher.submit(Request::new("1", "2", "1"));
    assert!(dispatcher.wait_for(ticket, TIMEOUT));
    assert_eq!(
        dispatcher.slot().status_text(),
        Some("Error: typesetter exploded")
    );
}
