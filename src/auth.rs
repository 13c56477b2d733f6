//! Account identifiers, user snapshots, and session token models.

pub mod id;
pub mod token;
pub mod user;

pub use id::*;
pub use token::{claims::*, pair::*, record::*, secret::*};
pub use user::*;
