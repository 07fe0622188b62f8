use crate::rental::models::BookingState;

/// Guards booking lifecycle transitions
pub struct BookingStateMachine;

impl BookingStateMachine {
    /// Check if a state transition is valid
    ///
    /// # Valid Transitions
    /// - Proposed → Active (validation passed), Cancelled (validation failed)
    /// - Active → Cancelled, Completed
    /// - Cancelled and Completed are terminal
    ///
    /// Re-entering the current state is rejected.
    pub fn is_valid_transition(from: BookingState, to: BookingState) -> bool {
        matches!(
            (from, to),
            (BookingState::Proposed, BookingState::Active)
                | (BookingState::Proposed, BookingState::Cancelled)
                | (BookingState::Active, BookingState::Cancelled)
                | (BookingState::Active, BookingState::Completed)
        )
    }

    /// Attempt to transition from one state to another
    ///
    /// # Returns
    /// `Ok(to)` if the transition is valid, `Err(message)` otherwise
    pub fn transition(from: BookingState, to: BookingState) -> Result<BookingState, String> {
        if Self::is_valid_transition(from, to) {
            Ok(to)
        } else {
            Err(format!(
                "Invalid booking state transition from {} to {}",
                from, to
            ))
        }
    }

    pub fn is_terminal(state: BookingState) -> bool {
        matches!(state, BookingState::Cancelled | BookingState::Completed)
    }
}
