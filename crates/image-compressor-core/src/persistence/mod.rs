mod db;
mod error;
mod models;

pub use db::RecordStore;
pub use error::{PersistenceError, PersistenceResult};
pub use models::ImageRecord;
