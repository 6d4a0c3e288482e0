use anyhow::Result;
use class_toggles::{load_config, run_page, Document, LineEvents, Page};
use std::sync::Arc;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

// Single-threaded runtime: handlers and revert timers share one event queue
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting class toggles");

    let config_path = std::env::var("PAGE_CONFIG").ok();
    let config = Arc::new(load_config(config_path.as_deref())?);

    info!("Number of elements: {}", config.elements.len());
    info!("Number of buttons: {}", config.buttons.len());
    info!("Revert policy: {:?}", config.revert_policy);

    let (mut page, document) = Page::new(config);
    let mut source = LineEvents::new(BufReader::new(tokio::io::stdin()));

    info!("Reading button presses from stdin (one name per line, `wait <ms>`, `state`)");
    let summary = run_page(&mut page, &mut source).await?;

    for id in document.element_ids() {
        info!("{}: classes={:?}", id, document.classes(&id)?);
    }
    info!(
        "Done: {} presses, {} failures, {} reverts fired, counter {}",
        summary.presses,
        summary.failures,
        summary.reverts_fired,
        page.state().counter()
    );

    Ok(())
}
