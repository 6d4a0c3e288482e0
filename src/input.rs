use crate::labels::button_label;
use crate::page::{Page, PageError};
use anyhow::Result;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};
use tracing::{error, info, warn};

/// One line of input to the page loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent {
    Press(String),
    /// Let pending timers run for the given time
    Wait(Duration),
    /// Report every button label
    State,
}

impl PageEvent {
    /// Parses an input line; blank lines and `#` comments yield `None`
    pub fn parse(line: &str) -> Option<PageEvent> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        if line == "state" {
            return Some(PageEvent::State);
        }
        if let Some(ms) = line.strip_prefix("wait ") {
            match ms.trim().parse::<u64>() {
                Ok(ms) => return Some(PageEvent::Wait(Duration::from_millis(ms))),
                Err(e) => warn!("Treating '{}' as a button name: {}", line, e),
            }
        }
        Some(PageEvent::Press(line.to_string()))
    }
}

/// Source of page events, e.g. stdin or a scripted list
#[async_trait::async_trait]
pub trait EventSource: Send {
    async fn next_event(&mut self) -> Result<Option<PageEvent>>;
}

/// Reads events line by line from an async reader
pub struct LineEvents<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin + Send> LineEvents<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait::async_trait]
impl<R: AsyncBufRead + Unpin + Send> EventSource for LineEvents<R> {
    async fn next_event(&mut self) -> Result<Option<PageEvent>> {
        while let Some(line) = self.lines.next_line().await? {
            if let Some(event) = PageEvent::parse(&line) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }
}

/// Fixed list of events, replayed in order
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    events: VecDeque<PageEvent>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = PageEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

#[async_trait::async_trait]
impl EventSource for ScriptedEvents {
    async fn next_event(&mut self) -> Result<Option<PageEvent>> {
        Ok(self.events.pop_front())
    }
}

/// Counts of what the loop did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub presses: usize,
    pub failures: usize,
    pub reverts_fired: usize,
}

/// Feeds events into the page until the source ends, then waits for pending
/// reverts. Failed presses are logged and do not stop the loop.
pub async fn run_page(page: &mut Page, source: &mut dyn EventSource) -> Result<RunSummary> {
    let mut summary = RunSummary::default();

    while let Some(event) = source.next_event().await? {
        match event {
            PageEvent::Press(name) => match page.press(&name) {
                Ok(outcome) => {
                    summary.presses += 1;
                    info!("{} -> {:?}", name, outcome);
                }
                Err(e @ PageError::UnknownButton(_)) => {
                    summary.failures += 1;
                    warn!("{}", e);
                }
                Err(e) => {
                    summary.failures += 1;
                    error!("Button '{}' failed: {}", name, e);
                }
            },
            PageEvent::Wait(duration) => tokio::time::sleep(duration).await,
            PageEvent::State => {
                for button in &page.config().buttons {
                    info!("{}", button_label(button, page.document().as_ref()));
                }
                info!("Handler counter: {}", page.state().counter());
            }
        }
    }

    summary.reverts_fired = page.settle().await;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Document;
    use std::sync::Arc;

    #[test]
    fn test_parse_events() {
        assert_eq!(PageEvent::parse("  Slide "), Some(PageEvent::Press("Slide".to_string())));
        assert_eq!(
            PageEvent::parse("wait 250"),
            Some(PageEvent::Wait(Duration::from_millis(250)))
        );
        assert_eq!(PageEvent::parse("state"), Some(PageEvent::State));
        assert_eq!(PageEvent::parse(""), None);
        assert_eq!(PageEvent::parse("# comment"), None);
        assert_eq!(
            PageEvent::parse("wait soon"),
            Some(PageEvent::Press("wait soon".to_string()))
        );
    }

    #[tokio::test]
    async fn test_line_events_skip_blanks() {
        let input: &[u8] = b"Slide\n\n# note\nwait 10\n";
        let mut source = LineEvents::new(input);

        assert_eq!(
            source.next_event().await.unwrap(),
            Some(PageEvent::Press("Slide".to_string()))
        );
        assert_eq!(
            source.next_event().await.unwrap(),
            Some(PageEvent::Wait(Duration::from_millis(10)))
        );
        assert_eq!(source.next_event().await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_page_counts_presses_and_failures() {
        let config = crate::config::load_config(None).unwrap();
        let (mut page, doc) = Page::new(Arc::new(config));
        let mut source = ScriptedEvents::new([
            PageEvent::Press("Slide".to_string()),
            PageEvent::Press("Nope".to_string()),
            PageEvent::Press("Pulse".to_string()),
            PageEvent::State,
            PageEvent::Wait(Duration::from_millis(100)),
        ]);

        let summary = run_page(&mut page, &mut source).await.unwrap();
        assert_eq!(
            summary,
            RunSummary {
                presses: 2,
                failures: 1,
                reverts_fired: 1,
            }
        );
        assert_eq!(doc.classes("animated-box").unwrap(), vec!["slide-right"]);
        assert_eq!(page.state().counter(), 2);
    }
}
