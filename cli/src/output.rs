//! Output formatting

use clap::ValueEnum;
use colored::Colorize;
use hrdesk_tickets::{AuditNote, Notification, Priority, Side, Ticket, TicketComment, TicketHistory, TicketStatus};
use serde::Serialize;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Print `data` as JSON/YAML, or as a table of `rows`
    pub fn print<T: Serialize, R: Tabled>(&self, data: &T, rows: impl IntoIterator<Item = R>) {
        match self {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(data).unwrap_or_default());
            }
            OutputFormat::Yaml => {
                println!("{}", serde_yaml::to_string(data).unwrap_or_default());
            }
            OutputFormat::Table => {
                println!("{}", Table::new(rows));
            }
        }
    }

    pub fn tickets(&self, tickets: &[Ticket], side: Side) {
        self.print(&tickets, tickets.iter().map(|t| TicketRow::new(t, side)));
    }

    pub fn notifications(&self, rows: &[Notification]) {
        self.print(&rows, rows.iter().map(NotificationRow::from));
    }

    pub fn history(&self, rows: &[TicketHistory]) {
        self.print(&rows, rows.iter().map(HistoryRow::from));
    }

    pub fn comments(&self, rows: &[TicketComment]) {
        self.print(&rows, rows.iter().map(CommentRow::from));
    }

    /// Section header on stdout, table mode only
    pub fn heading(&self, text: &str) {
        if matches!(self, OutputFormat::Table) {
            println!("\n{}", text.bold());
        }
    }
}

fn status_cell(status: TicketStatus) -> String {
    let text = status.as_str();
    match status {
        TicketStatus::Open => text.cyan().to_string(),
        TicketStatus::InProgress => text.blue().to_string(),
        TicketStatus::Resolved | TicketStatus::Closed => text.green().to_string(),
        TicketStatus::Rejected => text.red().to_string(),
        _ => text.yellow().to_string(),
    }
}

fn priority_cell(priority: Priority) -> String {
    match priority {
        Priority::Critical => priority.as_str().red().bold().to_string(),
        Priority::High => priority.as_str().yellow().to_string(),
        _ => priority.as_str().to_string(),
    }
}

#[derive(Tabled)]
pub struct TicketRow {
    #[tabled(rename = "Number")]
    number: String,
    #[tabled(rename = "Subject")]
    subject: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Escalated")]
    escalated: String,
    #[tabled(rename = "Unread")]
    unread: u32,
    #[tabled(rename = "Version")]
    version: u64,
}

impl TicketRow {
    fn new(ticket: &Ticket, side: Side) -> Self {
        Self {
            number: ticket.ticket_number().to_string(),
            subject: ticket.subject().to_string(),
            status: status_cell(ticket.status()),
            priority: priority_cell(ticket.priority()),
            escalated: if ticket.is_escalated() { "yes".red().to_string() } else { "no".into() },
            unread: ticket.unread_for(side),
            version: ticket.version(),
        }
    }
}

#[derive(Tabled)]
pub struct NotificationRow {
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Priority")]
    priority: String,
    #[tabled(rename = "Read")]
    read: String,
    #[tabled(rename = "Created")]
    created: String,
}

impl From<&Notification> for NotificationRow {
    fn from(n: &Notification) -> Self {
        Self {
            title: n.title().to_string(),
            category: n.category().to_string(),
            priority: priority_cell(n.priority()),
            read: if n.is_read() { "yes".into() } else { "no".bold().to_string() },
            created: n.created_at().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct HistoryRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "By")]
    by: String,
    #[tabled(rename = "Note")]
    note: String,
    #[tabled(rename = "At")]
    at: String,
}

impl From<&TicketHistory> for HistoryRow {
    fn from(h: &TicketHistory) -> Self {
        Self {
            from: h.old_status.as_str().to_string(),
            to: h.new_status.as_str().to_string(),
            by: h.changed_by.to_string(),
            note: match &h.note {
                Some(AuditNote::Escalated) => "escalated".to_string(),
                Some(AuditNote::Assigned { assignee }) => format!("assigned to {}", assignee),
                None => String::new(),
            },
            at: h.changed_at.format("%H:%M:%S").to_string(),
        }
    }
}

#[derive(Tabled)]
pub struct CommentRow {
    #[tabled(rename = "Sender")]
    sender: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Sent")]
    sent: String,
}

impl From<&TicketComment> for CommentRow {
    fn from(c: &TicketComment) -> Self {
        Self {
            sender: c.sender.to_string(),
            message: c.message.clone(),
            sent: c.sent_at.format("%H:%M:%S").to_string(),
        }
    }
}
