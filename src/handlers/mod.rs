pub mod advisor;
pub mod prompt;

pub use advisor::AdvisorHandler;
