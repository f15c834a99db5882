//! Domain-level client features (auth, forms, users) and their shared logic.
//! Front ends import these modules to keep view code focused while keeping
//! session handling and API access in dedicated feature areas.

pub mod auth;
pub mod forms;
pub mod users;
