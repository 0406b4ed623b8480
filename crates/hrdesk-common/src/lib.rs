//! HR Desk Common - Shared types for the ticket and notification core
//!
//! This crate provides the pieces every other HR desk crate leans on:
//! - Identity: actors, roles and the view-as override
//! - Capability policy: who may target, manage and list tickets of an organization
//! - Directory: organization summaries and membership lookup
//!
//! Identity/session management and the directory itself are external
//! collaborators; this crate only defines the contracts the core consumes
//! plus in-memory implementations used by tests and the scenario runner.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod directory;
pub mod identity;
pub mod value_objects;

pub use directory::{
    Directory, DirectoryError, InMemoryDirectory, Member, OrganizationSummary, OrganizationType,
};
pub use identity::{effective_role, Actor, CapabilityPolicy, Role};
pub use value_objects::{DomainError, OrgId, UserId};
