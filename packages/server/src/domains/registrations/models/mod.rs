pub mod form_data;
pub mod registration;

pub use form_data::*;
pub use registration::*;
