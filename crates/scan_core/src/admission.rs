//! Scan admission: whether a decoded code may start a new lookup cycle.

use shared::domain::{DecodedCode, ItemId};

use crate::state::CycleState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    InvalidPayload,
    AlreadyLocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionDecision {
    Accept(ItemId),
    Reject(RejectReason),
}

/// Decides admission without touching `state`.
///
/// The lock check runs before payload parsing, so any scan arriving outside
/// `Idle` is `AlreadyLocked` even when its payload is garbage. The caller owns
/// the `Idle -> Locked` transition and must apply it in the same step that
/// observes `Accept`.
pub fn admit(code: &DecodedCode, state: &CycleState) -> AdmissionDecision {
    if !state.is_idle() {
        return AdmissionDecision::Reject(RejectReason::AlreadyLocked);
    }
    match code.item_id() {
        Ok(id) => AdmissionDecision::Accept(id),
        Err(_) => AdmissionDecision::Reject(RejectReason::InvalidPayload),
    }
}

#[cfg(test)]
mod tests {
    use shared::domain::Symbology;

    use super::*;

    const NON_IDLE: [CycleState; 5] = [
        CycleState::Locked(ItemId(1)),
        CycleState::Loading(ItemId(1)),
        CycleState::Resolved(ItemId(1)),
        CycleState::NotFound(ItemId(1)),
        CycleState::Failed(ItemId(1)),
    ];

    #[test]
    fn accepts_numeric_payload_when_idle() {
        let code = DecodedCode::new("1024", Symbology::Code128);
        assert_eq!(
            admit(&code, &CycleState::Idle),
            AdmissionDecision::Accept(ItemId(1024))
        );
    }

    #[test]
    fn rejects_non_numeric_payload_when_idle() {
        for payload in ["abc", "", "12-34", "-1", "https://example.com/item/5"] {
            assert_eq!(
                admit(&DecodedCode::qr(payload), &CycleState::Idle),
                AdmissionDecision::Reject(RejectReason::InvalidPayload),
                "payload {payload:?}"
            );
        }
    }

    #[test]
    fn any_non_idle_state_rejects_as_locked_regardless_of_payload() {
        for state in NON_IDLE {
            for payload in ["10", "abc"] {
                assert_eq!(
                    admit(&DecodedCode::qr(payload), &state),
                    AdmissionDecision::Reject(RejectReason::AlreadyLocked),
                    "state {state:?} payload {payload:?}"
                );
            }
        }
    }
}
