//! Registration domain actions - business logic functions

mod get_registration;
mod save_step;

pub use get_registration::{get_registration, RegistrationDetails};
pub use save_step::{save_step, SaveStepOutcome, StepData};
