use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, warn};

/// Errors raised by document operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("element '{id}' not found")]
    ElementNotFound { id: String },
    #[error("class name must not be empty")]
    EmptyClassName,
}

/// Capability surface the controller needs from a DOM-like environment.
///
/// Every element-scoped call fails with [`DomError::ElementNotFound`] when the
/// id does not resolve, and in that case mutates nothing.
pub trait Document: Send + Sync {
    fn contains(&self, id: &str) -> bool;
    fn has_class(&self, id: &str, class_name: &str) -> Result<bool, DomError>;
    fn add_class(&self, id: &str, class_name: &str) -> Result<(), DomError>;
    fn remove_class(&self, id: &str, class_name: &str) -> Result<(), DomError>;
    /// Class tokens of the element in sorted order
    fn classes(&self, id: &str) -> Result<Vec<String>, DomError>;
    fn set_content(&self, id: &str, content: &str) -> Result<(), DomError>;
    fn content(&self, id: &str) -> Result<String, DomError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Element {
    classes: BTreeSet<String>,
    content: String,
}

/// In-memory document keyed by element id.
///
/// Clones share the same element table, so a revert task holding a clone sees
/// the same elements as the page that scheduled it.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: Arc<RwLock<HashMap<String, Element>>>,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts (or replaces) an element with the given classes and content
    pub fn insert_element<I, S>(&self, id: &str, classes: I, content: &str)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let element = Element {
            classes: classes.into_iter().map(Into::into).collect(),
            content: content.to_string(),
        };
        let mut elements = self.elements.write().unwrap_or_else(PoisonError::into_inner);
        if elements.insert(id.to_string(), element).is_some() {
            warn!("Replaced existing element '{}'", id);
        } else {
            debug!("Inserted element '{}'", id);
        }
    }

    /// Ids of all elements, sorted
    pub fn element_ids(&self) -> Vec<String> {
        let elements = self.elements.read().unwrap_or_else(PoisonError::into_inner);
        let mut ids: Vec<String> = elements.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn element_count(&self) -> usize {
        self.elements.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn with_element<T>(&self, id: &str, f: impl FnOnce(&Element) -> T) -> Result<T, DomError> {
        let elements = self.elements.read().unwrap_or_else(PoisonError::into_inner);
        elements
            .get(id)
            .map(f)
            .ok_or_else(|| DomError::ElementNotFound { id: id.to_string() })
    }

    fn with_element_mut<T>(
        &self,
        id: &str,
        f: impl FnOnce(&mut Element) -> T,
    ) -> Result<T, DomError> {
        let mut elements = self.elements.write().unwrap_or_else(PoisonError::into_inner);
        elements
            .get_mut(id)
            .map(f)
            .ok_or_else(|| DomError::ElementNotFound { id: id.to_string() })
    }
}

fn check_class_name(class_name: &str) -> Result<(), DomError> {
    if class_name.trim().is_empty() {
        return Err(DomError::EmptyClassName);
    }
    Ok(())
}

impl Document for MemoryDocument {
    fn contains(&self, id: &str) -> bool {
        self.with_element(id, |_| ()).is_ok()
    }

    fn has_class(&self, id: &str, class_name: &str) -> Result<bool, DomError> {
        self.with_element(id, |element| element.classes.contains(class_name))
    }

    fn add_class(&self, id: &str, class_name: &str) -> Result<(), DomError> {
        check_class_name(class_name)?;
        let added = self.with_element_mut(id, |element| {
            element.classes.insert(class_name.to_string())
        })?;
        debug!("add_class '{}' on '{}' (changed: {})", class_name, id, added);
        Ok(())
    }

    fn remove_class(&self, id: &str, class_name: &str) -> Result<(), DomError> {
        check_class_name(class_name)?;
        let removed = self.with_element_mut(id, |element| element.classes.remove(class_name))?;
        debug!("remove_class '{}' on '{}' (changed: {})", class_name, id, removed);
        Ok(())
    }

    fn classes(&self, id: &str) -> Result<Vec<String>, DomError> {
        self.with_element(id, |element| element.classes.iter().cloned().collect())
    }

    fn set_content(&self, id: &str, content: &str) -> Result<(), DomError> {
        self.with_element_mut(id, |element| element.content = content.to_string())?;
        debug!("Set content of '{}': {}", id, content);
        Ok(())
    }

    fn content(&self, id: &str) -> Result<String, DomError> {
        self.with_element(id, |element| element.content.clone())
    }
}
