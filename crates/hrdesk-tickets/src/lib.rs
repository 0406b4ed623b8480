//! HR Desk Ticket Core
//!
//! Support-ticket lifecycle combined with its unread/notification signal,
//! laid out in the same hexagonal style as the rest of the platform.
//!
//! ## Architecture
//!
//! - **Domain Layer**: the `Ticket` aggregate and its status state machine,
//!   the append-only history and comment log, ledger `Notification`s
//! - **Application Layer**: ticket and notification services, unread tracker
//! - **Ports Layer**: use-case traits (inbound), store traits (outbound)
//! - **Infrastructure Layer**: in-memory store used by tests and the demo
//!
//! ## Consistency
//!
//! Every state-changing ticket operation is committed as one
//! [`TicketMutation`]: the ticket with its bumped unread counter, the audit
//! rows and one ledger row per recipient land together or not at all.

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use application::{
    viewer_side, CreateTicketCommand, NotificationService, Page, PageRequest, PortalServices,
    ReconcileReport, TicketService, TransitionCommand, UnreadSummary, UnreadTracker,
};
pub use domain::aggregates::{
    AuditNote, NewNotification, Notification, Ticket, TicketComment, TicketDraft, TicketError,
    TicketHistory,
};
pub use domain::events::{DomainEvent, NotificationEvent, TicketEvent};
pub use domain::value_objects::{
    Category, CommentId, EntityType, HistoryId, NotificationId, Priority, RefEntity, Side,
    TicketId, TicketNumber, TicketStatus, TicketType,
};
pub use infrastructure::persistence::{InMemoryPortalStore, TracingEventPublisher};
pub use ports::inbound::{NotificationUseCases, TicketUseCases, UseCaseError};
pub use ports::outbound::{
    EventPublisher, NotificationLedgerStore, ReadReceipt, RepositoryError, TicketMutation,
    TicketStore,
};
