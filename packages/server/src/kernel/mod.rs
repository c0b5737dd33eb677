//! Kernel module - server infrastructure and dependencies.

pub mod deps;
pub mod email;
pub mod test_dependencies;
pub mod traits;

pub use deps::{ServerDeps, WhatsAppAdapter};
pub use email::EmailClient;
pub use test_dependencies::{MockEmailSender, MockWhatsAppSender, TestDependencies};
pub use traits::*;
