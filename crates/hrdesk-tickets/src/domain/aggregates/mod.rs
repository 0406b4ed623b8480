//! Aggregates module

pub mod history;
pub mod notification;
pub mod ticket;

pub use history::{AuditNote, TicketComment, TicketHistory};
pub use notification::{NewNotification, Notification};
pub use ticket::{Ticket, TicketDraft, TicketError};
