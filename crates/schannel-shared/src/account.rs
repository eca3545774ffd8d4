//! Snapshots of the account state reported by the portal.
//!
//! Each fetch produces a new immutable value that replaces the previous one
//! wholesale, nothing here is ever merged.

mod invoice;
mod service;
mod ssr;

pub use invoice::{Invoice, InvoiceState};
pub use service::{Service, ServiceState};
pub use ssr::{DuplicateNodeError, Node, NodeAuth, NodeId, SsrInfo, Usage};
