//! Core domain model types.
//!
//! - The [`Item`] sum type and the concrete shapes it carries
//! - Worker lifecycle state

mod item;
mod state;

pub use item::{BrandUrl, Item, ModelUrl, MotoUrl, Spec};
pub use state::{ExitReason, WorkerState};
