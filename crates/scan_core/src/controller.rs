//! Cycle state machine for scan-to-lookup.
//!
//! `LookupController` is synchronous and owns no I/O: callers feed it scan
//! events, start the lookup it asks for, and hand the lookup outcome back with
//! the ticket it issued. `session::ScanSession` is the async driver.

use shared::{
    domain::{DecodedCode, ItemId, ItemRecord},
    error::LookupError,
};
use tracing::{debug, info, warn};

use crate::{
    admission::{admit, AdmissionDecision, RejectReason},
    error::ControllerError,
    state::{AlertMessage, CycleState, ScanSnapshot},
};

/// Names the single lookup a cycle is allowed to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupTicket {
    cycle: u64,
    item_id: ItemId,
}

impl LookupTicket {
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn item_id(&self) -> ItemId {
        self.item_id
    }
}

#[derive(Debug, Default)]
pub struct LookupController {
    state: CycleState,
    item: Option<ItemRecord>,
    alert: Option<AlertMessage>,
    cycle: u64,
}

impl LookupController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> CycleState {
        self.state
    }

    pub fn item(&self) -> Option<&ItemRecord> {
        self.item.as_ref()
    }

    pub fn alert(&self) -> Option<&AlertMessage> {
        self.alert.as_ref()
    }

    pub fn snapshot(&self) -> ScanSnapshot {
        ScanSnapshot {
            state: self.state,
            item: self.item.clone(),
            alert: self.alert.clone(),
        }
    }

    /// Runs admission and applies `Idle -> Locked` on accept.
    pub fn handle_scan(&mut self, code: &DecodedCode) -> AdmissionDecision {
        let decision = admit(code, &self.state);
        match decision {
            AdmissionDecision::Accept(item_id) => {
                self.cycle += 1;
                self.state = CycleState::Locked(item_id);
                self.item = None;
                self.alert = None;
                info!(
                    cycle = self.cycle,
                    item_id = item_id.0,
                    symbology = %code.symbology,
                    "scan accepted"
                );
            }
            AdmissionDecision::Reject(RejectReason::InvalidPayload) => {
                warn!(symbology = %code.symbology, "rejected non-numeric scan payload");
                self.alert = Some(AlertMessage::invalid_code());
            }
            AdmissionDecision::Reject(RejectReason::AlreadyLocked) => {
                debug!(state = self.state.name(), "scan dropped while cycle is active");
            }
        }
        decision
    }

    pub fn begin_lookup(&mut self, item_id: ItemId) -> Result<LookupTicket, ControllerError> {
        match self.state {
            CycleState::Locked(locked) if locked == item_id => Ok(self.enter_loading(item_id)),
            state => Err(ControllerError::InvalidTransition {
                action: "begin lookup",
                state,
            }),
        }
    }

    /// `handle_scan` followed by `begin_lookup` in one step. An accepted scan
    /// always comes back with the ticket for its lookup, so the cycle can
    /// never be left sitting in `Locked`.
    pub fn scan_and_begin(&mut self, code: &DecodedCode) -> (AdmissionDecision, Option<LookupTicket>) {
        let decision = self.handle_scan(code);
        let ticket = match decision {
            AdmissionDecision::Accept(item_id) => Some(self.enter_loading(item_id)),
            AdmissionDecision::Reject(_) => None,
        };
        (decision, ticket)
    }

    fn enter_loading(&mut self, item_id: ItemId) -> LookupTicket {
        self.state = CycleState::Loading(item_id);
        debug!(cycle = self.cycle, item_id = item_id.0, "lookup started");
        LookupTicket {
            cycle: self.cycle,
            item_id,
        }
    }

    /// Applies the outcome of the lookup issued for `ticket`.
    ///
    /// Only the first record of a non-empty result is kept.
    pub fn complete_lookup(
        &mut self,
        ticket: LookupTicket,
        result: Result<Vec<ItemRecord>, LookupError>,
    ) -> Result<CycleState, ControllerError> {
        if ticket.cycle != self.cycle {
            return Err(ControllerError::StaleCompletion {
                ticket_cycle: ticket.cycle,
            });
        }
        if self.state != CycleState::Loading(ticket.item_id) {
            return Err(ControllerError::InvalidTransition {
                action: "complete lookup",
                state: self.state,
            });
        }

        let item_id = ticket.item_id;
        match result {
            Ok(records) => match records.into_iter().next() {
                Some(record) => {
                    info!(cycle = self.cycle, item_id = item_id.0, name = %record.name, "item resolved");
                    self.state = CycleState::Resolved(item_id);
                    self.item = Some(record);
                }
                None => {
                    info!(cycle = self.cycle, item_id = item_id.0, "no item found");
                    self.state = CycleState::NotFound(item_id);
                    self.item = None;
                    self.alert = Some(AlertMessage::not_found());
                }
            },
            Err(err) => {
                warn!(cycle = self.cycle, item_id = item_id.0, error = %err, "item lookup failed");
                self.state = CycleState::Failed(item_id);
                self.item = None;
                self.alert = Some(AlertMessage::lookup_failed(&err));
            }
        }
        Ok(self.state)
    }

    /// "Scan again". Valid from terminal states and, as a no-op, from `Idle`.
    pub fn reset(&mut self) -> Result<(), ControllerError> {
        if self.state.is_in_flight() {
            return Err(ControllerError::InvalidTransition {
                action: "reset",
                state: self.state,
            });
        }
        if !self.state.is_idle() {
            debug!(cycle = self.cycle, from = self.state.name(), "cycle reset");
        }
        self.state = CycleState::Idle;
        self.item = None;
        self.alert = None;
        Ok(())
    }

    /// Returns whether an alert was visible.
    pub fn dismiss_alert(&mut self) -> bool {
        self.alert.take().is_some()
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
