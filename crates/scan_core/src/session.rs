//! Single-owner actor around [`LookupController`].
//!
//! Camera detections, UI intents and lookup completions all arrive as
//! messages on the actor task, so the controller is only ever touched from one
//! place. Snapshots are republished on a `watch` channel after every change.

use std::sync::Arc;

use shared::{
    domain::{DecodedCode, ItemRecord},
    error::LookupError,
};
use tokio::{
    sync::{mpsc, oneshot, watch},
    task::JoinHandle,
};
use tracing::{debug, error, info};

use crate::{
    admission::{AdmissionDecision, RejectReason},
    controller::{LookupController, LookupTicket},
    error::ControllerError,
    lookup::ItemLookup,
    state::ScanSnapshot,
};

const INTENT_QUEUE_CAPACITY: usize = 64;

enum ScanIntent {
    Scan {
        code: DecodedCode,
        reply: oneshot::Sender<AdmissionDecision>,
    },
    DismissAlert {
        reply: oneshot::Sender<bool>,
    },
    Reset {
        reply: oneshot::Sender<Result<(), ControllerError>>,
    },
}

struct LookupCompleted {
    ticket: LookupTicket,
    result: Result<Vec<ItemRecord>, LookupError>,
}

#[derive(Clone)]
pub struct ScanSessionHandle {
    intents: mpsc::Sender<ScanIntent>,
    snapshots: watch::Receiver<ScanSnapshot>,
}

impl ScanSessionHandle {
    /// Delivers one camera detection. Returns the admission decision.
    pub async fn scan(&self, code: DecodedCode) -> Result<AdmissionDecision, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.send(ScanIntent::Scan { code, reply }).await?;
        rx.await.map_err(|_| ControllerError::SessionClosed)
    }

    pub async fn dismiss_alert(&self) -> Result<bool, ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.send(ScanIntent::DismissAlert { reply }).await?;
        rx.await.map_err(|_| ControllerError::SessionClosed)
    }

    pub async fn reset(&self) -> Result<(), ControllerError> {
        let (reply, rx) = oneshot::channel();
        self.send(ScanIntent::Reset { reply }).await?;
        rx.await.map_err(|_| ControllerError::SessionClosed)?
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ScanSnapshot> {
        self.snapshots.clone()
    }

    /// Waits until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&ScanSnapshot) -> bool,
    ) -> Result<ScanSnapshot, ControllerError> {
        let mut rx = self.snapshots.clone();
        let snapshot = rx
            .wait_for(predicate)
            .await
            .map_err(|_| ControllerError::SessionClosed)?;
        Ok(snapshot.clone())
    }

    async fn send(&self, intent: ScanIntent) -> Result<(), ControllerError> {
        self.intents
            .send(intent)
            .await
            .map_err(|_| ControllerError::SessionClosed)
    }
}

pub struct ScanSession {
    controller: LookupController,
    lookup: Arc<dyn ItemLookup>,
    intents: mpsc::Receiver<ScanIntent>,
    completions_tx: mpsc::UnboundedSender<LookupCompleted>,
    completions_rx: mpsc::UnboundedReceiver<LookupCompleted>,
    snapshots: watch::Sender<ScanSnapshot>,
}

impl ScanSession {
    /// Starts the actor on the current tokio runtime. The task ends once every
    /// handle has been dropped.
    pub fn spawn(lookup: Arc<dyn ItemLookup>) -> (ScanSessionHandle, JoinHandle<()>) {
        let controller = LookupController::new();
        let (intents_tx, intents_rx) = mpsc::channel(INTENT_QUEUE_CAPACITY);
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let (snapshots_tx, snapshots_rx) = watch::channel(controller.snapshot());

        let session = Self {
            controller,
            lookup,
            intents: intents_rx,
            completions_tx,
            completions_rx,
            snapshots: snapshots_tx,
        };
        let task = tokio::spawn(session.run());

        (
            ScanSessionHandle {
                intents: intents_tx,
                snapshots: snapshots_rx,
            },
            task,
        )
    }

    async fn run(mut self) {
        info!("scan session started");
        loop {
            tokio::select! {
                intent = self.intents.recv() => match intent {
                    Some(intent) => self.handle_intent(intent),
                    None => break,
                },
                Some(done) = self.completions_rx.recv() => self.handle_completion(done),
            }
        }
        info!("scan session stopped");
    }

    fn handle_intent(&mut self, intent: ScanIntent) {
        match intent {
            ScanIntent::Scan { code, reply } => {
                let decision = self.handle_scan(&code);
                let _ = reply.send(decision);
            }
            ScanIntent::DismissAlert { reply } => {
                let dismissed = self.controller.dismiss_alert();
                if dismissed {
                    self.publish();
                }
                let _ = reply.send(dismissed);
            }
            ScanIntent::Reset { reply } => {
                let result = self.controller.reset();
                if result.is_ok() {
                    self.publish();
                }
                let _ = reply.send(result);
            }
        }
    }

    fn handle_scan(&mut self, code: &DecodedCode) -> AdmissionDecision {
        let (decision, ticket) = self.controller.scan_and_begin(code);
        if decision == AdmissionDecision::Reject(RejectReason::AlreadyLocked) {
            return decision;
        }
        if let Some(ticket) = ticket {
            self.start_lookup(ticket);
        }
        self.publish();
        decision
    }

    /// Runs the lookup on its own task. A lookup that panics or is aborted
    /// still reports back as a transport failure so the cycle terminates.
    fn start_lookup(&self, ticket: LookupTicket) {
        let lookup = Arc::clone(&self.lookup);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let request = tokio::spawn(async move { lookup.lookup(ticket.item_id()).await });
            let result = match request.await {
                Ok(result) => result,
                Err(err) => {
                    error!(cycle = ticket.cycle(), error = %err, "lookup task died");
                    Err(LookupError::Transport(format!("lookup task failed: {err}")))
                }
            };
            let _ = completions.send(LookupCompleted { ticket, result });
        });
    }

    fn handle_completion(&mut self, done: LookupCompleted) {
        match self.controller.complete_lookup(done.ticket, done.result) {
            Ok(state) => {
                debug!(cycle = done.ticket.cycle(), state = state.name(), "lookup applied");
                self.publish();
            }
            Err(err) => error!(error = %err, "discarded lookup completion"),
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.controller.snapshot());
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
