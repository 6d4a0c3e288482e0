use crate::dom::{Document, DomError};
use crate::revert::{PendingReverts, RevertHandle, RevertPolicy};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Flips, clears and time-limits class membership on document elements.
///
/// Every operation resolves the element first and mutates nothing when the id
/// is unknown.
#[derive(Clone)]
pub struct ToggleController {
    document: Arc<dyn Document>,
    policy: RevertPolicy,
    pending: PendingReverts,
}

impl ToggleController {
    pub fn new(document: Arc<dyn Document>) -> Self {
        Self::with_policy(document, RevertPolicy::default())
    }

    pub fn with_policy(document: Arc<dyn Document>, policy: RevertPolicy) -> Self {
        Self {
            document,
            policy,
            pending: PendingReverts::default(),
        }
    }

    pub fn document(&self) -> &Arc<dyn Document> {
        &self.document
    }

    pub fn policy(&self) -> RevertPolicy {
        self.policy
    }

    fn require(&self, element_id: &str) -> Result<(), DomError> {
        if self.document.contains(element_id) {
            Ok(())
        } else {
            warn!("Element '{}' not found", element_id);
            Err(DomError::ElementNotFound {
                id: element_id.to_string(),
            })
        }
    }

    /// Adds the class if absent, removes it if present; returns whether it is
    /// now present
    pub fn toggle_class(&self, element_id: &str, class_name: &str) -> Result<bool, DomError> {
        if class_name.trim().is_empty() {
            return Err(DomError::EmptyClassName);
        }
        self.require(element_id)?;

        let present = if self.document.has_class(element_id, class_name)? {
            self.document.remove_class(element_id, class_name)?;
            false
        } else {
            self.document.add_class(element_id, class_name)?;
            true
        };

        info!("Toggled '{}' on '{}': present={}", class_name, element_id, present);
        Ok(present)
    }

    /// Removes every listed class unconditionally and replaces the content
    pub fn reset_classes(
        &self,
        element_id: &str,
        class_names: &[String],
        content: &str,
    ) -> Result<(), DomError> {
        if class_names.iter().any(|c| c.trim().is_empty()) {
            return Err(DomError::EmptyClassName);
        }
        self.require(element_id)?;

        for class_name in class_names {
            self.document.remove_class(element_id, class_name)?;
        }
        self.document.set_content(element_id, content)?;

        info!("Reset {:?} on '{}'", class_names, element_id);
        Ok(())
    }

    /// Adds the class now and removes it once `delay` has elapsed.
    ///
    /// Must be called from within a tokio runtime; the removal runs as a task
    /// on it.
    pub fn schedule_revert(
        &self,
        element_id: &str,
        class_name: &str,
        delay: Duration,
    ) -> Result<RevertHandle, DomError> {
        if class_name.trim().is_empty() {
            return Err(DomError::EmptyClassName);
        }
        self.require(element_id)?;
        self.document.add_class(element_id, class_name)?;

        // Deadline is fixed at the call; the task holds off until it has been
        // registered so `finish` can never run ahead of `replace`
        let deadline = Instant::now() + delay;
        let (registered_tx, registered_rx) = oneshot::channel::<()>();
        let generation = self.pending.next_generation();
        let task = {
            let document = Arc::clone(&self.document);
            let pending = self.pending.clone();
            let element = element_id.to_string();
            let class = class_name.to_string();
            tokio::spawn(async move {
                let _ = registered_rx.await;
                tokio::time::sleep_until(deadline).await;
                match document.remove_class(&element, &class) {
                    Ok(()) => debug!("Reverted '{}' on '{}' after {:?}", class, element, delay),
                    Err(e) => warn!("Revert of '{}' on '{}' skipped: {}", class, element, e),
                }
                pending.finish(&element, &class, generation);
            })
        };

        if self.policy == RevertPolicy::Replace
            && self
                .pending
                .replace(element_id, class_name, generation, task.abort_handle())
        {
            debug!("Replaced pending revert of '{}' on '{}'", class_name, element_id);
        }
        let _ = registered_tx.send(());

        info!(
            "Applied '{}' on '{}', reverting in {}ms",
            class_name,
            element_id,
            delay.as_millis()
        );
        Ok(RevertHandle::new(element_id, class_name, delay, task))
    }
}
