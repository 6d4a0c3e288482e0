use crate::dom::{Document, DomError};
use tracing::debug;

/// Membership of one class on one element, as observed in a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassState {
    Applied,
    Cleared,
    Missing, // Element id does not resolve
}

impl ClassState {
    /// Reads the current membership of `class_name` on `element_id`
    pub fn observe(document: &dyn Document, element_id: &str, class_name: &str) -> ClassState {
        match document.has_class(element_id, class_name) {
            Ok(true) => ClassState::Applied,
            Ok(false) => ClassState::Cleared,
            Err(DomError::ElementNotFound { .. }) | Err(DomError::EmptyClassName) => {
                ClassState::Missing
            }
        }
    }

    /// Returns the state a toggle would produce
    pub fn toggle(self) -> ClassState {
        match self {
            ClassState::Applied => ClassState::Cleared,
            ClassState::Cleared => ClassState::Applied,
            ClassState::Missing => ClassState::Missing,
        }
    }

    /// Returns true if the element exists
    pub fn is_known(self) -> bool {
        matches!(self, ClassState::Applied | ClassState::Cleared)
    }
}

/// Pure negation; callers apply the matching class change themselves
pub fn flip_boolean(current: bool) -> bool {
    !current
}

/// Page-wide state owned by the page and threaded through every handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageState {
    counter: u64,
    card_flipped: bool,
}

impl PageState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of handler invocations that completed
    pub fn counter(&self) -> u64 {
        self.counter
    }

    pub fn card_flipped(&self) -> bool {
        self.card_flipped
    }

    /// Records one completed handler and returns the new count
    pub fn count_call(&mut self) -> u64 {
        self.counter += 1;
        debug!("Handler counter: {}", self.counter);
        self.counter
    }

    /// Records the card's flip state after a flip has been applied
    pub fn set_card_flipped(&mut self, flipped: bool) {
        self.card_flipped = flipped;
    }
}
