//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod alternatives;
pub mod analyze;
pub mod billing;
pub mod payments;
pub mod reports;
pub mod webhooks;

// Re-export all handlers for use in router
pub use alternatives::*;
pub use analyze::*;
pub use billing::*;
pub use payments::*;
pub use reports::*;
pub use webhooks::*;
