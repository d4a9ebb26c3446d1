//! # hookbridge-service
//!
//! The webhook processing core of HookBridge:
//!
//! - [`mapper`] validates webhook payloads and describes them as events,
//! - [`assembler`] turns descriptions into wire events,
//! - [`session`] runs the PushAPI protocol for one event,
//! - [`relay`] chains the three and reports outcomes through the
//!   [`notifier`].
//!
//! Services follow constructor injection; the capture-server connection is
//! provided through the [`Connector`] trait.

pub mod assembler;
pub mod connector;
pub mod context;
pub mod mapper;
pub mod notifier;
pub mod relay;
pub mod session;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use assembler::EventAssembler;
pub use connector::{CaptureConnector, Connector};
pub use context::ProcessingContext;
pub use mapper::{EventMapper, Notification, Payload, WebhookEvent};
pub use notifier::TelegramNotifier;
pub use relay::RelayService;
pub use session::{SessionState, TransmissionSession};
