use crate::config::{Button, PageConfig};
use crate::controller::ToggleController;
use crate::dom::{Document, DomError, MemoryDocument};
use crate::revert::RevertHandle;
use crate::state::{flip_boolean, PageState};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("no button named '{0}'")]
    UnknownButton(String),
    #[error("{a} + {b} does not fit in an i64")]
    SumOverflow { a: i64, b: i64 },
    #[error(transparent)]
    Dom(#[from] DomError),
}

/// What a button press did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PressOutcome {
    Toggled {
        element: String,
        class: String,
        present: bool,
    },
    Reset {
        element: String,
    },
    Flipped {
        flipped: bool,
    },
    Scheduled {
        element: String,
        class: String,
        delay: Duration,
    },
    Displayed {
        message: String,
    },
}

/// Adds two numbers; the return-value demo displays the result.
/// Returns `None` when the sum overflows.
pub fn calculate_sum(a: i64, b: i64) -> Option<i64> {
    a.checked_add(b)
}

/// Buttons of one page bound to a document, plus the page state they share.
pub struct Page {
    config: Arc<PageConfig>,
    controller: ToggleController,
    state: PageState,
    reverts: Vec<RevertHandle>,
}

impl Page {
    /// Builds an in-memory document from the configured elements
    pub fn new(config: Arc<PageConfig>) -> (Self, MemoryDocument) {
        let document = MemoryDocument::new();
        for element in &config.elements {
            document.insert_element(&element.id, element.classes.iter().cloned(), &element.content);
        }
        let page = Self::with_document(config, Arc::new(document.clone()));
        (page, document)
    }

    pub fn with_document(config: Arc<PageConfig>, document: Arc<dyn Document>) -> Self {
        let controller = ToggleController::with_policy(document, config.revert_policy);
        Self {
            config,
            controller,
            state: PageState::new(),
            reverts: Vec::new(),
        }
    }

    pub fn config(&self) -> &PageConfig {
        &self.config
    }

    pub fn state(&self) -> PageState {
        self.state
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        self.controller.document()
    }

    /// Dispatches the named button. The counter moves only when the press
    /// succeeds.
    pub fn press(&mut self, button_name: &str) -> Result<PressOutcome, PageError> {
        let config = Arc::clone(&self.config);
        let button = config
            .button(button_name)
            .ok_or_else(|| PageError::UnknownButton(button_name.to_string()))?;
        info!("Button pressed: {}", button_name);

        let outcome = match button {
            Button::Toggle {
                element,
                class,
                on_text,
                off_text,
                ..
            } => self.toggle(element, class, on_text.as_deref(), off_text.as_deref())?,
            Button::Reset {
                element,
                classes,
                text,
                ..
            } => {
                self.controller.reset_classes(element, classes, text)?;
                PressOutcome::Reset {
                    element: element.clone(),
                }
            }
            Button::Flip { element, class, .. } => PressOutcome::Flipped {
                flipped: self.flip(element, class)?,
            },
            Button::Animate {
                element,
                class,
                duration_ms,
                ..
            } => {
                let handle = self
                    .controller
                    .schedule_revert(element, class, Duration::from_millis(*duration_ms))?;
                let outcome = PressOutcome::Scheduled {
                    element: handle.element().to_string(),
                    class: handle.class_name().to_string(),
                    delay: handle.delay(),
                };
                self.reverts.retain(|h| !h.is_finished());
                self.reverts.push(handle);
                outcome
            }
            Button::Simple { .. } => self.simple_function()?,
            Button::Params { first, second, .. } => self.function_with_params(first, second)?,
            Button::Sum { a, b, .. } => self.show_return_value(*a, *b)?,
            Button::Scope { .. } => self.demonstrate_scope()?,
        };

        self.state.count_call();
        Ok(outcome)
    }

    fn toggle(
        &self,
        element: &str,
        class: &str,
        on_text: Option<&str>,
        off_text: Option<&str>,
    ) -> Result<PressOutcome, DomError> {
        let present = self.controller.toggle_class(element, class)?;
        let text = if present { on_text } else { off_text };
        if let Some(text) = text {
            self.document().set_content(element, text)?;
        }
        Ok(PressOutcome::Toggled {
            element: element.to_string(),
            class: class.to_string(),
            present,
        })
    }

    /// Flips the class and records the result as the page flag.
    ///
    /// The starting point is the class as the document holds it, so other
    /// buttons touching the same class cannot leave the flag stale. A missing
    /// element leaves both untouched.
    fn flip(&mut self, element: &str, class: &str) -> Result<bool, DomError> {
        if !self.document().contains(element) {
            warn!("Flip target '{}' not found", element);
            return Err(DomError::ElementNotFound {
                id: element.to_string(),
            });
        }

        let flipped = flip_boolean(self.document().has_class(element, class)?);
        if flipped {
            self.document().add_class(element, class)?;
        } else {
            self.document().remove_class(element, class)?;
        }
        self.state.set_card_flipped(flipped);

        info!("Card flip state: {}", flipped);
        Ok(flipped)
    }

    /// Writes `message` into the result display
    pub fn display_result(&self, message: &str) -> Result<(), DomError> {
        let html = format!("<strong>Result:</strong> {message}");
        self.document().set_content(&self.config.result_display, &html)
    }

    fn displayed(&self, message: String) -> Result<PressOutcome, DomError> {
        self.display_result(&message)?;
        Ok(PressOutcome::Displayed { message })
    }

    fn simple_function(&self) -> Result<PressOutcome, DomError> {
        let local_message = "This is a simple function!";
        let calls = self.state.counter() + 1;
        debug!("Local message: {}, calls: {}", local_message, calls);
        self.displayed(format!("{local_message} (Called {calls} times)"))
    }

    fn function_with_params(&self, first: &str, second: &str) -> Result<PressOutcome, DomError> {
        let combined = format!("You passed: \"{first}\" and \"{second}\"");
        let char_count = first.chars().count() + second.chars().count();
        debug!("Parameters: {:?}, {:?} ({} chars)", first, second, char_count);
        self.displayed(format!("{combined}. Total characters: {char_count}"))
    }

    fn show_return_value(&self, a: i64, b: i64) -> Result<PressOutcome, PageError> {
        let Some(sum) = calculate_sum(a, b) else {
            warn!("Sum of {} and {} overflows", a, b);
            return Err(PageError::SumOverflow { a, b });
        };
        debug!("Returned value: {}", sum);
        Ok(self.displayed(format!("Function returned: {sum} ({a} + {b})"))?)
    }

    fn demonstrate_scope(&self) -> Result<PressOutcome, DomError> {
        let local_var = "I'm a local variable!";
        let local_constant = 42;
        let report = format!(
            "<strong>Local Variables:</strong><br>\
             Local Variable: {local_var}<br>\
             Local Constant: {local_constant}<br><br>\
             <strong>Global Variables:</strong><br>\
             Global Counter: {}<br>\
             Card Flipped: {}",
            self.state.counter(),
            self.state.card_flipped()
        );
        self.displayed(report)
    }

    /// Reverts scheduled by this page that have not fired or been cancelled
    pub fn pending_reverts(&self) -> usize {
        self.reverts.iter().filter(|h| !h.is_finished()).count()
    }

    /// Cancels every pending revert, leaving their classes applied
    pub fn cancel_reverts(&mut self) {
        for handle in self.reverts.drain(..) {
            handle.cancel();
        }
    }

    /// Waits until every scheduled revert has fired or been cancelled
    pub async fn settle(&mut self) -> usize {
        let mut fired = 0;
        for handle in self.reverts.drain(..) {
            if handle.wait().await {
                fired += 1;
            }
        }
        debug!("Settled {} reverts", fired);
        fired
    }
}
