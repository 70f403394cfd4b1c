//! Two-step confirmation gate for `Assigned → InProgress`.
//!
//! # Invariants
//!
//! - **Single slot**: at most one tag is pending confirmation per caller
//!   session. Requesting confirmation for a different tag silently
//!   replaces the previous pending tag; no write occurs for the
//!   displaced one. Deliberate simplification — concurrent confirmation
//!   flows for multiple records are out of scope.
//! - **No write before confirm**: requesting and cancelling are pure
//!   slot mutations. Only a confirm for the *same* tag id releases the
//!   transition to the caller.
//! - **Cancel is idempotent**: cancelling an empty slot is a no-op, and
//!   cancel-then-re-request reaches the same states as never cancelling.

use uuid::Uuid;

/// The single-slot "pending confirmation" value object.
///
/// Owned by the caller session, not ambient state; every rule about the
/// slot is a method on this type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmSlot {
    pending: Option<Uuid>,
}

impl ConfirmSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// The tag currently pending confirmation, if any.
    pub fn pending(&self) -> Option<Uuid> {
        self.pending
    }

    /// `true` when `id` is the pending tag.
    pub fn is_pending(&self, id: &Uuid) -> bool {
        self.pending.as_ref() == Some(id)
    }

    /// Mark `id` as pending confirmation, replacing any previous pending
    /// tag. Returns the displaced id so callers can log the replacement.
    pub fn request(&mut self, id: Uuid) -> Option<Uuid> {
        let displaced = self.pending.filter(|prev| *prev != id);
        self.pending = Some(id);
        displaced
    }

    /// Discard the pending state. No write has occurred and none will.
    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Confirm the pending tag. Succeeds only when `id` matches the
    /// pending slot; the slot is cleared on success so a second confirm
    /// for the same id requires a fresh request.
    pub fn confirm(&mut self, id: &Uuid) -> bool {
        if self.is_pending(id) {
            self.pending = None;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn confirm_requires_matching_pending_id() {
        let mut slot = ConfirmSlot::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        assert!(!slot.confirm(&a), "nothing pending yet");

        slot.request(a);
        assert!(!slot.confirm(&b), "different id must not confirm");
        assert!(slot.is_pending(&a), "failed confirm leaves slot intact");
        assert!(slot.confirm(&a));
        assert_eq!(slot.pending(), None, "confirm clears the slot");
    }

    #[test]
    fn requesting_second_tag_displaces_first_without_confirming_it() {
        let mut slot = ConfirmSlot::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        slot.request(a);
        let displaced = slot.request(b);
        assert_eq!(displaced, Some(a));
        assert!(slot.is_pending(&b));
        assert!(!slot.confirm(&a), "displaced tag cannot be confirmed");
        assert!(slot.confirm(&b));
    }

    #[test]
    fn re_requesting_same_tag_reports_no_displacement() {
        let mut slot = ConfirmSlot::new();
        let a = Uuid::new_v4();
        slot.request(a);
        assert_eq!(slot.request(a), None);
        assert!(slot.is_pending(&a));
    }

    #[test]
    fn cancel_then_re_request_is_equivalent_to_never_cancelling() {
        let mut slot = ConfirmSlot::new();
        let a = Uuid::new_v4();

        slot.request(a);
        slot.cancel();
        assert_eq!(slot.pending(), None);
        assert!(!slot.confirm(&a), "cancelled request cannot confirm");

        slot.request(a);
        assert!(slot.confirm(&a), "re-request reaches the same state");
    }

    #[test]
    fn cancel_on_empty_slot_is_a_noop() {
        let mut slot = ConfirmSlot::new();
        slot.cancel();
        assert_eq!(slot.pending(), None);
    }
}
