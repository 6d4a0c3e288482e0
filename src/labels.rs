use crate::config::Button;
use crate::dom::Document;
use crate::state::ClassState;
use tracing::debug;

/// Class a button reflects in its label, if it has one
fn tracked_class(button: &Button) -> Option<(&str, &str)> {
    match button {
        Button::Toggle { element, class, .. } | Button::Flip { element, class, .. } => {
            Some((element.as_str(), class.as_str()))
        }
        _ => None,
    }
}

/// Checks if a button's label carries a state indicator
pub fn is_toggle_button(button: &Button) -> bool {
    tracked_class(button).is_some()
}

/// Gets the display name for a button, with a state indicator for toggles
pub fn button_label(button: &Button, document: &dyn Document) -> String {
    let Some((element, class)) = tracked_class(button) else {
        return button.name().to_string();
    };

    let state = ClassState::observe(document, element, class);
    debug!("Label for '{}' in state {:?}", button.name(), state);
    match state {
        ClassState::Applied => format!("{} ●", button.name()),
        ClassState::Cleared => format!("{} ○", button.name()),
        ClassState::Missing => format!("{} ?", button.name()),
    }
}

/// Gets the state description for a toggle button
pub fn state_description(button: &Button, document: &dyn Document) -> Option<&'static str> {
    let (element, class) = tracked_class(button)?;
    Some(match ClassState::observe(document, element, class) {
        ClassState::Applied => "Currently applied",
        ClassState::Cleared => "Currently cleared",
        ClassState::Missing => "Element missing",
    })
}
