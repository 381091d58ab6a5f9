pub mod ability;
pub mod claim;
pub mod config;
pub mod dice;
pub mod document;
pub mod error;
pub mod io;
pub mod memory;
pub mod migration;
pub mod paths;
pub mod range;
pub mod sheets_api;

pub use error::{MigrationError, Result, SheetError};
