//! Shared types

mod clock;
mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{ApiError, Result};
