//! Client-side form handling shared by the auth flows.

pub mod validation;

pub use validation::{Field, FieldErrors, RegistrationForm};
