//! Background work
//!
//! Notification and analytics writes triggered by a submission run here, off
//! the request path.

mod queue;

pub use queue::{SideEffect, SideEffectQueue, SideEffectWorker};
