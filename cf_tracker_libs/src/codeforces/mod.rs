pub mod client;
pub mod model;

pub use client::{CodeforcesClient, CodeforcesError, JudgeApi};
pub use model::ProblemId;
