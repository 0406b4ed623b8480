//! CLI Commands

pub mod config;
pub mod demo;
pub mod watch;

use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use hrdesk_client::{ViewHandle, ViewSpec, ViewState};

/// Longest a command waits for one view refresh
const REFRESH_TIMEOUT: Duration = Duration::from_secs(30);

/// Wait until the view shows data from a fetch issued after this call
pub async fn refreshed<S: ViewSpec>(handle: &mut ViewHandle<S>) -> Result<ViewState<S::Item>> {
    let before = handle.current().sequence;
    handle.refresh_now();
    tokio::time::timeout(REFRESH_TIMEOUT, async {
        loop {
            match handle.changed().await {
                Some(state) if state.sequence > before => return Ok(state),
                Some(_) => continue,
                None => return Err(anyhow!("view loop stopped")),
            }
        }
    })
    .await
    .context("timed out waiting for view refresh")?
}

/// Wait for the first successful sync of a freshly spawned view
pub async fn synced<S: ViewSpec>(handle: &mut ViewHandle<S>) -> Result<ViewState<S::Item>> {
    tokio::time::timeout(REFRESH_TIMEOUT, async {
        loop {
            match handle.changed().await {
                Some(state) if state.is_synced() => return Ok(state),
                Some(_) => continue,
                None => return Err(anyhow!("view loop stopped")),
            }
        }
    })
    .await
    .context("timed out waiting for first sync")?
}
