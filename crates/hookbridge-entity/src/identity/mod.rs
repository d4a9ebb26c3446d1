//! Identity domain entities.

pub mod contact;
pub mod model;
pub mod sequence;

pub use contact::{Contact, ContactKind};
pub use model::{Identity, IdentityKind};
pub use sequence::IdSequence;
