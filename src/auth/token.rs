//! Session token models: signed claims, issued pairs, and store records.

pub mod claims;
pub mod pair;
pub mod record;
pub mod secret;
