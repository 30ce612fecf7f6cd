//! Off-thread solving with a single display target.
//!
//! Each submission runs the pipeline on its own worker thread. Results come
//! back over a channel and are applied to the [`DisplaySlot`] only by the
//! thread that owns the [`Dispatcher`]; an update for anything but the latest
//! ticket is dropped.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::cancel::CancelToken;
use crate::error::RequestError;
use crate::pipeline::{Pipeline, Request};
use crate::render::FormulaArtifact;

/// Shown while the latest request is still running.
pub const PENDING_TEXT: &str = "Calculando expresión...";

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl Ticket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

#[derive(Clone, Debug)]
pub struct Update {
    pub ticket: Ticket,
    pub artifact: FormulaArtifact,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum DisplayState {
    #[default]
    Idle,
    Pending(Ticket),
    Ready(Ticket, FormulaArtifact),
}

/// What the presentation layer currently shows.
#[derive(Debug, Default)]
pub struct DisplaySlot {
    state: DisplayState,
}

impl DisplaySlot {
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn artifact(&self) -> Option<&FormulaArtifact> {
        match &self.state {
            DisplayState::Ready(_, artifact) => Some(artifact),
            _ => None,
        }
    }

    /// The status line: the pending text, a failure message, or nothing when
    /// a formula is shown.
    pub fn status_text(&self) -> Option<&str> {
        match &self.state {
            DisplayState::Idle => None,
            DisplayState::Pending(_) => Some(PENDING_TEXT),
            DisplayState::Ready(_, artifact) => artifact.message(),
        }
    }

    fn begin(&mut self, ticket: Ticket) {
        self.state = DisplayState::Pending(ticket);
    }

    fn apply(&mut self, update: Update) -> bool {
        match self.state {
            DisplayState::Pending(current) if current == update.ticket => {
                self.state = DisplayState::Ready(update.ticket, update.artifact);
                true
            }
            _ => {
                debug!(ticket = update.ticket.id(), "dropping superseded result");
                false
            }
        }
    }
}

pub struct Dispatcher {
    pipeline: Arc<Pipeline>,
    next_ticket: u64,
    current: Option<(Ticket, CancelToken)>,
    sender: Sender<Update>,
    receiver: Receiver<Update>,
    slot: DisplaySlot,
}

impl Dispatcher {
    pub fn new(pipeline: Pipeline) -> Self {
        let (sender, receiver) = mpsc::channel();
        Dispatcher {
            pipeline: Arc::new(pipeline),
            next_ticket: 0,
            current: None,
            sender,
            receiver,
            slot: DisplaySlot::default(),
        }
    }

    /// Starts `request` on a fresh worker and supersedes whatever ran before.
    /// Never blocks.
    pub fn submit(&mut self, request: Request) -> Ticket {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        if let Some((previous, token)) = self.current.take() {
            debug!(ticket = previous.id(), "superseded");
            token.cancel();
        }
        let cancel = CancelToken::new();
        self.current = Some((ticket, cancel.clone()));
        self.slot.begin(ticket);

        let pipeline = Arc::clone(&self.pipeline);
        let sender = self.sender.clone();
        let spawned = thread::Builder::new()
            .name(format!("recsolve-worker-{}", ticket.id()))
            .spawn(move || {
                let artifact = match pipeline.run(&request, &cancel) {
                    Ok(solution) => FormulaArtifact::Image(solution.formula),
                    Err(RequestError::Cancelled) => return,
                    Err(err) => FormulaArtifact::Message(err.display_message()),
                };
                if cancel.is_cancelled() {
                    return;
                }
                // the dispatcher may be gone by now
                let _ = sender.send(Update { ticket, artifact });
            });

        if let Err(err) = spawned {
            error!(error = %err, "failed to start worker");
            let message = RequestError::SolverFailure(err.to_string()).display_message();
            self.slot.apply(Update {
                ticket,
                artifact: FormulaArtifact::Message(message),
            });
        }
        ticket
    }

    /// Applies every result that has already arrived. Returns whether the
    /// display changed.
    pub fn pump(&mut self) -> bool {
        let mut changed = false;
        while let Ok(update) = self.receiver.try_recv() {
            changed |= self.slot.apply(update);
        }
        changed
    }

    /// Blocks until the result for `ticket` is shown or `timeout` passes.
    /// Returns `false` on timeout or if `ticket` is no longer the latest.
    pub fn wait_for(&mut self, ticket: Ticket, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.is_shown(ticket) {
                return true;
            }
            if self.latest() != Some(ticket) {
                return false;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(update) => {
                    self.slot.apply(update);
                }
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => {
                    return self.is_shown(ticket);
                }
            }
        }
    }

    pub fn latest(&self) -> Option<Ticket> {
        self.current.as_ref().map(|(ticket, _)| *ticket)
    }

    pub fn slot(&self) -> &DisplaySlot {
        &self.slot
    }

    fn is_shown(&self, ticket: Ticket) -> bool {
        matches!(self.slot.state(), DisplayState::Ready(shown, _) if *shown == ticket)
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        if let Some((_, token)) = self.current.take() {
            token.cancel();
        }
    }
}
