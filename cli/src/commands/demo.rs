//! Demo command
//!
//! Walks one ticket through its lifecycle on an in-memory portal while the
//! employee's list, the admin queue and the admin's bell poll in the
//! background.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use hrdesk_client::{
    ApiError, LocalPortalApi, MutationClient, NotificationSource, NotificationView, PollingSynchronizer,
    PortalApi, SyncConfig, TicketListSource, TicketScope, TicketView, ViewKind, ViewScope,
};
use hrdesk_common::{
    Actor, InMemoryDirectory, Member, OrgId, OrganizationSummary, OrganizationType, Role, UserId,
};
use hrdesk_tickets::{
    CreateTicketCommand, PortalServices, Priority, ReconcileReport, Side, TicketStatus, TicketType,
};
use tabled::Tabled;
use tracing::info;

use super::{refreshed, synced};
use crate::output::OutputFormat;

const ORG: &str = "acme";

fn seed_directory() -> Result<InMemoryDirectory> {
    let dir = InMemoryDirectory::new();
    let acme = OrgId::new(ORG)?;
    dir.add_organization(OrganizationSummary {
        id: acme.clone(),
        name: "Acme Staffing".into(),
        org_type: OrganizationType::Vendor,
    });
    for (id, name, role) in [
        ("alice", "Alice Admin", Role::OrgAdmin),
        ("arjun", "Arjun Admin", Role::OrgAdmin),
        ("emma", "Emma Employee", Role::Employee),
    ] {
        dir.add_member(
            &acme,
            Member {
                user_id: UserId::new(id)?,
                display_name: name.into(),
                role,
            },
        )?;
    }
    Ok(dir)
}

fn actor(id: &str, role: Role) -> Result<Actor> {
    Ok(Actor::new(UserId::new(id)?, role, OrgId::new(ORG)?))
}

#[derive(Tabled)]
struct ProjectionRow {
    #[tabled(rename = "Projection")]
    projection: String,
    #[tabled(rename = "Unread")]
    unread: u32,
}

fn projection_rows(report: &ReconcileReport) -> Vec<ProjectionRow> {
    let mut rows = vec![
        ProjectionRow {
            projection: "employee counter".into(),
            unread: report.employee_counter,
        },
        ProjectionRow {
            projection: "submitter ledger rows".into(),
            unread: report.submitter_unread_rows,
        },
        ProjectionRow {
            projection: "admin counter".into(),
            unread: report.admin_counter,
        },
    ];
    rows.extend(report.admin_unread_rows.iter().map(|(admin, unread)| ProjectionRow {
        projection: format!("ledger rows for {}", admin),
        unread: *unread,
    }));
    rows
}

pub async fn run(sync: &SyncConfig, format: OutputFormat) -> Result<()> {
    let (services, _store) = PortalServices::in_memory(Arc::new(seed_directory()?));

    let emma_api: Arc<dyn PortalApi> = Arc::new(LocalPortalApi::new(services.clone(), actor("emma", Role::Employee)?));
    let alice_api: Arc<dyn PortalApi> = Arc::new(LocalPortalApi::new(services.clone(), actor("alice", Role::OrgAdmin)?));
    let arjun_api: Arc<dyn PortalApi> = Arc::new(LocalPortalApi::new(services.clone(), actor("arjun", Role::OrgAdmin)?));
    let emma = MutationClient::new(emma_api.clone(), sync);
    let alice = MutationClient::new(alice_api.clone(), sync);
    let arjun = MutationClient::new(arjun_api, sync);

    let employee_screen = ViewScope::new("employee/tickets");
    let admin_screen = ViewScope::new("admin/queue");

    let mut my_tickets = PollingSynchronizer::spawn(
        &employee_screen,
        Arc::new(TicketListSource::new(emma_api.clone(), TicketScope::Mine)),
        TicketView::my_tickets(),
        sync.period(ViewKind::TicketList),
    );
    let mut queue = PollingSynchronizer::spawn(
        &admin_screen,
        Arc::new(TicketListSource::new(alice_api.clone(), TicketScope::All)),
        TicketView::admin_queue(),
        sync.period(ViewKind::AdminQueue),
    );
    let mut bell = PollingSynchronizer::spawn(
        &admin_screen,
        Arc::new(NotificationSource::new(alice_api.clone())),
        NotificationView::bell(),
        sync.period(ViewKind::NotificationBell),
    );
    synced(&mut my_tickets).await?;
    synced(&mut queue).await?;
    synced(&mut bell).await?;

    format.heading("1. emma reports a broken laptop");
    let ticket = emma
        .create_ticket(
            CreateTicketCommand::new("Laptop broken", "Screen stays black after the update", TicketType::Asset)
                .priority(Priority::Medium)
                .target(ORG),
        )
        .await?;
    format.tickets(std::slice::from_ref(&ticket), Side::Employee);

    format.heading("2. alice's queue picks it up");
    let state = refreshed(&mut queue).await?;
    format.tickets(&state.items, Side::Admin);
    let seen = state
        .items
        .iter()
        .find(|t| t.id() == ticket.id())
        .cloned()
        .context("new ticket missing from the admin queue")?;

    format.heading("3. alice starts work");
    let ticket = alice.transition(&seen, TicketStatus::InProgress).await?;
    alice.mark_read(ticket.id()).await?;
    format.history(&alice_api.get_history(ticket.id()).await?);

    format.heading("4. emma's list flags the update");
    format.tickets(&refreshed(&mut my_tickets).await?.items, Side::Employee);

    format.heading("5. emma opens the ticket");
    emma.mark_read(ticket.id()).await?;
    let current = emma_api.get_ticket(ticket.id()).await?;
    info!(
        ticket = %current.ticket_number(),
        employee_unread = current.unread_count_for_employee(),
        admin_unread = current.unread_count_for_admin(),
        "ticket read by submitter"
    );
    format.tickets(&refreshed(&mut my_tickets).await?.items, Side::Employee);

    format.heading("6. emma escalates and alice's bell rings");
    let ticket = emma.escalate(ticket.id()).await?;
    format.tickets(std::slice::from_ref(&ticket), Side::Employee);
    format.notifications(&refreshed(&mut bell).await?.items);

    format.heading("7. conversation");
    emma.add_comment(ticket.id(), "Thanks. Is there a loaner I can use today?").await?;
    alice.add_comment(ticket.id(), "Yes, pick one up at the front desk.").await?;
    format.comments(&emma_api.list_comments(ticket.id()).await?);

    format.heading("8. arjun acts on a stale copy");
    match arjun.transition(&seen, TicketStatus::Rejected).await {
        Err(ApiError::Conflict(reason)) => info!(%reason, "stale transition rejected"),
        Err(e) => return Err(e.into()),
        Ok(_) => bail!("stale transition was accepted"),
    }
    format.tickets(&refreshed(&mut queue).await?.items, Side::Admin);

    format.heading("9. unread projections");
    let report = services.tracker.reconcile(ticket.id()).await?;
    format.print(&report, projection_rows(&report));
    if !report.is_consistent() {
        bail!("unread projections drifted by {}", report.drift());
    }

    employee_screen.close().await;
    admin_screen.close().await;
    Ok(())
}
