//! Cooperative cancellation shared across the pipeline.
//!
//! A single [`CancellationToken`] is created by whoever owns the pipeline and
//! observed by every worker and fetch client.

mod done;
mod token;

pub use done::{done_signal, Done, DoneNotifier};
pub use token::CancellationToken;
