//! Listener registration and change notification plumbing.
//!
//! Provides the ordered listener registry used by every cell and the
//! [`Subscription`] handle returned by revocable registrations.

mod registry;
mod subscription;

pub use registry::ListenerId;
pub use subscription::Subscription;

pub(crate) use registry::{Listener, ListenerRegistry};
pub(crate) use subscription::Revoke;
