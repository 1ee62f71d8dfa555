//! Database schema, migrations and the location code lookup

pub mod codes;
pub mod init;
pub mod migrations;
pub mod models;

pub use codes::*;
pub use init::*;
pub use migrations::*;
pub use models::*;
