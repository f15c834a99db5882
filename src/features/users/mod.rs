//! Account profile access for the signed-in user.

pub mod client;
pub mod types;
