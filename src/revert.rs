use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, warn};

/// How overlapping reverts on the same (element, class) pair interact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RevertPolicy {
    /// Every call keeps its own timer; the earliest one to fire removes the
    /// class even while a later call's window is still open
    #[default]
    Independent,
    /// A new call aborts the pending timer for the same pair
    Replace,
}

/// Handle to a scheduled class removal
#[derive(Debug)]
pub struct RevertHandle {
    element: String,
    class_name: String,
    delay: Duration,
    task: JoinHandle<()>,
}

impl RevertHandle {
    pub(crate) fn new(element: &str, class_name: &str, delay: Duration, task: JoinHandle<()>) -> Self {
        Self {
            element: element.to_string(),
            class_name: class_name.to_string(),
            delay,
            task,
        }
    }

    pub fn element(&self) -> &str {
        &self.element
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Cancels the removal; has no effect once it has fired
    pub fn cancel(&self) {
        debug!("Cancelling revert of '{}' on '{}'", self.class_name, self.element);
        self.task.abort();
    }

    /// True once the timer fired or was cancelled
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the timer; returns true if the class was removed by it and
    /// false if it was cancelled
    pub async fn wait(self) -> bool {
        match self.task.await {
            Ok(()) => true,
            Err(e) if e.is_cancelled() => false,
            Err(e) => {
                warn!("Revert of '{}' on '{}' panicked: {}", self.class_name, self.element, e);
                false
            }
        }
    }
}

type RevertKey = (String, String);

/// Pending revert timers per (element, class), used by [`RevertPolicy::Replace`].
///
/// Each entry carries a generation so a finished timer only clears its own
/// registration and never a newer one.
#[derive(Debug, Clone, Default)]
pub(crate) struct PendingReverts {
    inner: Arc<Mutex<PendingInner>>,
}

#[derive(Debug, Default)]
struct PendingInner {
    next_generation: u64,
    timers: HashMap<RevertKey, (u64, AbortHandle)>,
}

impl PendingReverts {
    /// Reserves a generation for a new timer on the pair
    pub(crate) fn next_generation(&self) -> u64 {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.next_generation += 1;
        inner.next_generation
    }

    /// Registers a timer, aborting and returning true if one was pending
    pub(crate) fn replace(&self, element: &str, class_name: &str, generation: u64, abort: AbortHandle) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (element.to_string(), class_name.to_string());
        match inner.timers.insert(key, (generation, abort)) {
            Some((_, previous)) if !previous.is_finished() => {
                previous.abort();
                true
            }
            _ => false,
        }
    }

    /// Drops the registration if it still belongs to `generation`
    pub(crate) fn finish(&self, element: &str, class_name: &str, generation: u64) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let key = (element.to_string(), class_name.to_string());
        if inner.timers.get(&key).is_some_and(|(current, _)| *current == generation) {
            inner.timers.remove(&key);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).timers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_default_is_independent() {
        assert_eq!(RevertPolicy::default(), RevertPolicy::Independent);
    }

    #[test]
    fn test_policy_parses_from_yaml() {
        let policy: RevertPolicy = serde_yaml::from_str("replace").unwrap();
        assert_eq!(policy, RevertPolicy::Replace);
        let policy: RevertPolicy = serde_yaml::from_str("independent").unwrap();
        assert_eq!(policy, RevertPolicy::Independent);
    }

    #[tokio::test]
    async fn test_pending_replace_aborts_previous() {
        let pending = PendingReverts::default();
        let first = tokio::spawn(std::future::pending::<()>());
        let second = tokio::spawn(std::future::pending::<()>());

        let gen1 = pending.next_generation();
        assert!(!pending.replace("box", "grow", gen1, first.abort_handle()));
        let gen2 = pending.next_generation();
        assert!(pending.replace("box", "grow", gen2, second.abort_handle()));

        assert!(first.await.unwrap_err().is_cancelled());

        // Stale generation must not clear the newer registration
        pending.finish("box", "grow", gen1);
        assert_eq!(pending.len(), 1);
        pending.finish("box", "grow", gen2);
        assert_eq!(pending.len(), 0);

        second.abort();
    }
}
