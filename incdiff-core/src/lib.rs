pub mod digest;
pub mod error;
pub mod manifest;
pub mod materialize;
pub mod path_safety;
pub mod reconcile;
pub mod record;
pub mod script;

pub use error::{Error, Result};
