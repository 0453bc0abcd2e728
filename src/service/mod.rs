pub mod accounts;
pub mod schema_actor;

pub use accounts::{Accounts, SessionUser};
pub use schema_actor::SchemaHandle;
