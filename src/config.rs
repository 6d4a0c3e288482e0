use crate::revert::RevertPolicy;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// Default page layout, compiled in
const EMBEDDED_CONFIG: &str = include_str!("../page.yaml");

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PageConfig {
    /// Element that receives `display_result` messages
    pub result_display: String,
    #[serde(default)]
    pub revert_policy: RevertPolicy,
    pub elements: Vec<ElementConfig>,
    pub buttons: Vec<Button>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ElementConfig {
    pub id: String,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Button {
    /// Flips one class and writes the matching text into the element
    Toggle {
        name: String,
        element: String,
        class: String,
        #[serde(default)]
        on_text: Option<String>,
        #[serde(default)]
        off_text: Option<String>,
    },
    Reset {
        name: String,
        element: String,
        classes: Vec<String>,
        #[serde(default)]
        text: String,
    },
    /// Flips the page flag and mirrors it as a class
    Flip {
        name: String,
        element: String,
        class: String,
    },
    /// Applies a class that is removed again after `duration_ms`
    Animate {
        name: String,
        element: String,
        class: String,
        duration_ms: u64,
    },
    Simple {
        name: String,
    },
    Params {
        name: String,
        first: String,
        second: String,
    },
    Sum {
        name: String,
        a: i64,
        b: i64,
    },
    Scope {
        name: String,
    },
}

impl Button {
    pub fn name(&self) -> &str {
        match self {
            Button::Toggle { name, .. }
            | Button::Reset { name, .. }
            | Button::Flip { name, .. }
            | Button::Animate { name, .. }
            | Button::Simple { name }
            | Button::Params { name, .. }
            | Button::Sum { name, .. }
            | Button::Scope { name } => name,
        }
    }

    /// Element the button acts on, if any
    pub fn element(&self) -> Option<&str> {
        match self {
            Button::Toggle { element, .. }
            | Button::Reset { element, .. }
            | Button::Flip { element, .. }
            | Button::Animate { element, .. } => Some(element.as_str()),
            Button::Simple { .. }
            | Button::Params { .. }
            | Button::Sum { .. }
            | Button::Scope { .. } => None,
        }
    }

    fn class_names(&self) -> Vec<&str> {
        match self {
            Button::Toggle { class, .. }
            | Button::Flip { class, .. }
            | Button::Animate { class, .. } => vec![class.as_str()],
            Button::Reset { classes, .. } => classes.iter().map(String::as_str).collect(),
            _ => Vec::new(),
        }
    }
}

impl PageConfig {
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: PageConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn button(&self, name: &str) -> Option<&Button> {
        self.buttons.iter().find(|b| b.name() == name)
    }

    /// Checks ids and names are unique and every reference resolves
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for element in &self.elements {
            if !ids.insert(element.id.as_str()) {
                bail!("duplicate element id '{}'", element.id);
            }
            if element.classes.iter().any(|c| c.trim().is_empty()) {
                bail!("element '{}' has an empty class name", element.id);
            }
        }

        if !ids.contains(self.result_display.as_str()) {
            bail!("result display element '{}' is not declared", self.result_display);
        }

        let mut names = HashSet::new();
        for button in &self.buttons {
            if !names.insert(button.name()) {
                bail!("duplicate button name '{}'", button.name());
            }
            if let Some(element) = button.element() {
                if !ids.contains(element) {
                    bail!("button '{}' targets unknown element '{}'", button.name(), element);
                }
            }
            if button.class_names().iter().any(|c| c.trim().is_empty()) {
                bail!("button '{}' has an empty class name", button.name());
            }
        }
        Ok(())
    }
}

/// Loads the page layout from `path`, or the embedded layout when `None`
pub fn load_config(path: Option<&str>) -> Result<PageConfig> {
    match path {
        Some(path) => {
            tracing::info!("Loading page configuration from {}", path);
            let yaml = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read page configuration {path}"))?;
            PageConfig::parse(&yaml).with_context(|| format!("invalid page configuration {path}"))
        }
        None => {
            tracing::info!("Using embedded page configuration");
            PageConfig::parse(EMBEDDED_CONFIG)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_config_is_valid() {
        let config = load_config(None).unwrap();
        assert_eq!(config.result_display, "result-display");
        assert_eq!(config.revert_policy, RevertPolicy::Independent);
        assert_eq!(config.elements.len(), 3);
        assert!(config.button("Slide").is_some());
        assert!(config.button("Flip Card").is_some());
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
result_display: out
revert_policy: replace
elements:
  - id: out
  - id: box
    classes: [base]
    content: "hi"
buttons:
  - type: toggle
    name: "Slide"
    element: box
    class: slide-right
    on_text: "Slid right!"
  - type: reset
    name: "Reset"
    element: box
    classes: [slide-right, grow]
  - type: animate
    name: "Pulse"
    element: box
    class: grow
    duration_ms: 250
  - type: sum
    name: "Sum"
    a: 2
    b: 3
"#;

        let config = PageConfig::parse(yaml).unwrap();
        assert_eq!(config.revert_policy, RevertPolicy::Replace);
        assert_eq!(config.elements[1].classes, vec!["base".to_string()]);
        assert_eq!(config.elements[0].content, "");

        match &config.buttons[0] {
            Button::Toggle { class, on_text, off_text, .. } => {
                assert_eq!(class, "slide-right");
                assert_eq!(on_text.as_deref(), Some("Slid right!"));
                assert!(off_text.is_none());
            }
            _ => panic!("Expected toggle button"),
        }

        match &config.buttons[1] {
            Button::Reset { classes, text, .. } => {
                assert_eq!(classes.len(), 2);
                assert_eq!(text, "");
            }
            _ => panic!("Expected reset button"),
        }

        match &config.buttons[2] {
            Button::Animate { duration_ms, .. } => assert_eq!(*duration_ms, 250),
            _ => panic!("Expected animate button"),
        }

        assert_eq!(config.buttons[3].element(), None);
    }

    #[test]
    fn test_rejects_unknown_element() {
        let yaml = r#"
result_display: out
elements:
  - id: out
buttons:
  - type: flip
    name: "Flip"
    element: card
    class: flipped
"#;
        let err = PageConfig::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("unknown element 'card'"));
    }

    #[test]
    fn test_rejects_duplicate_button_names() {
        let yaml = r#"
result_display: out
elements:
  - id: out
buttons:
  - type: simple
    name: "Go"
  - type: scope
    name: "Go"
"#;
        let err = PageConfig::parse(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate button name"));
    }

    #[test]
    fn test_rejects_empty_class_name() {
        let yaml = r#"
result_display: out
elements:
  - id: out
buttons:
  - type: toggle
    name: "Bad"
    element: out
    class: ""
"#;
        assert!(PageConfig::parse(yaml).is_err());
    }

    #[test]
    fn test_rejects_missing_result_display() {
        let yaml = r#"
result_display: nowhere
elements: []
buttons: []
"#;
        assert!(PageConfig::parse(yaml).is_err());
    }

    #[test]
    fn test_load_missing_file() {
        assert!(load_config(Some("/definitely/not/here.yaml")).is_err());
    }
}
