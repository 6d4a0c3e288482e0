pub mod config;
pub mod controller;
pub mod dom;
pub mod input;
pub mod labels;
pub mod page;
pub mod revert;
pub mod state;


pub use config::{Button, ElementConfig, PageConfig, load_config};
pub use controller::ToggleController;
pub use dom::{Document, DomError, MemoryDocument};
pub use input::{EventSource, LineEvents, PageEvent, RunSummary, ScriptedEvents, run_page};
pub use labels::{button_label, is_toggle_button, state_description};
pub use page::{Page, PageError, PressOutcome, calculate_sum};
pub use revert::{RevertHandle, RevertPolicy};
pub use state::{ClassState, PageState, flip_boolean};
