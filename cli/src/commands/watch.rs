//! Watch commands

use std::sync::Arc;

use anyhow::{anyhow, Result};
use hrdesk_client::{
    HttpPortalApi, NotificationSource, NotificationView, PollingSynchronizer, PortalApi, SnapshotSource,
    SyncConfig, TicketFilter, TicketListSource, TicketScope, TicketView, ViewHandle, ViewKind, ViewScope,
    ViewSpec, ViewState,
};
use hrdesk_tickets::Side;
use tracing::{info, warn};

use crate::output::OutputFormat;
use crate::WatchCommands;

pub struct Endpoint {
    pub api_url: Option<String>,
    pub api_token: Option<String>,
    pub sync: SyncConfig,
}

impl Endpoint {
    fn connect(&self) -> Result<Arc<dyn PortalApi>> {
        let url = self
            .api_url
            .as_deref()
            .ok_or_else(|| anyhow!("no API URL: pass --api-url, set HRDESK_API_URL or run `hrdesk config set api_url <url>`"))?;
        let api = HttpPortalApi::new(url, self.api_token.as_deref(), self.sync.request_timeout())?;
        Ok(Arc::new(api))
    }
}

pub async fn handle(target: WatchCommands, endpoint: Endpoint, format: OutputFormat) -> Result<()> {
    let api = endpoint.connect()?;
    let scope = ViewScope::new("watch");

    match target {
        WatchCommands::Tickets { scope: which, search } => {
            let which = TicketScope::from(which);
            let (view, side, kind) = match which {
                TicketScope::Mine => (TicketView::my_tickets(), Side::Employee, ViewKind::TicketList),
                TicketScope::All => (TicketView::admin_queue(), Side::Admin, ViewKind::AdminQueue),
            };
            let filter = TicketFilter { search, ..view.filter.clone() };
            let view = view.with_filter(filter);
            let source = TicketListSource::new(api, which);
            watch(&scope, source, view, endpoint.sync.period(kind), |state| {
                format.tickets(&state.items, side)
            })
            .await;
        }
        WatchCommands::Notifications { all } => {
            let view = if all { NotificationView::default() } else { NotificationView::bell() };
            let source = NotificationSource::new(api);
            watch(&scope, source, view, endpoint.sync.period(ViewKind::NotificationBell), |state| {
                format.notifications(&state.items)
            })
            .await;
        }
    }

    scope.close().await;
    Ok(())
}

/// Print every refresh until Ctrl-C
async fn watch<Src, S>(
    scope: &ViewScope,
    source: Src,
    spec: S,
    period: std::time::Duration,
    print: impl Fn(&ViewState<S::Item>),
) where
    Src: SnapshotSource<Item = S::Item>,
    S: ViewSpec,
{
    info!(view = source.name(), period_secs = period.as_secs(), "watching, Ctrl-C to stop");
    let mut handle: ViewHandle<S> = PollingSynchronizer::spawn(scope, Arc::new(source), spec, period);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            state = handle.changed() => match state {
                Some(state) if state.last_error.is_some() => {
                    warn!(failures = state.consecutive_failures, "refresh failed, showing last good data");
                }
                Some(state) => print(&state),
                None => break,
            },
        }
    }
}
