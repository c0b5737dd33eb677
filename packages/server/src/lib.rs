// Reunite - event registration API core
//
// Backend for an OTP-gated, multi-step alumni-reunion registration flow.
// Domains own their models and actions; SQL lives in models, workflow logic
// in actions, HTTP plumbing under server/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
