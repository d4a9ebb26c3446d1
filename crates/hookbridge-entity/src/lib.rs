//! # hookbridge-entity
//!
//! Protocol-agnostic domain models for HookBridge: the attributes,
//! contacts, and identities that name the parties of an event, and the
//! [`EventDescription`](event::EventDescription) the mapper produces for
//! each webhook.
//!
//! Everything here is created fresh per webhook and never outlives the
//! request that built it.

pub mod attribute;
pub mod event;
pub mod identity;

pub use attribute::Attribute;
pub use event::{ChatMessage, EventClass, EventDescription, SentTime};
pub use identity::{Contact, ContactKind, IdSequence, Identity, IdentityKind};
