mod kv;
mod schema;
mod types;

pub use kv::{FAVORITES_KEY, ONBOARDING_COMPLETE_KEY};
pub use schema::Database;
pub use types::{DatabaseError, StorageError};
