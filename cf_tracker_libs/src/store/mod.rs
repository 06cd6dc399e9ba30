mod memory;
pub mod model;

pub use memory::{RecordStore, StoreError};
pub use model::*;
