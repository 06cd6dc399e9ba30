pub mod api;
pub mod codeforces;
pub mod dashboard;
pub mod store;

pub use api::MessageResponse;
pub use dashboard::{Aggregator, DashboardSnapshot, JudgeSolvedLookup, SolvedLookup};
pub use store::RecordStore;
