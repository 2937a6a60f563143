pub mod csv_export;
pub mod exchange;
pub mod storage;
pub mod store;

pub use storage::StoreError;
pub use store::{StorageProjectStore, TodoStore};
