pub mod backend;
pub mod prompt;
pub mod providers;
pub mod recommendations;

pub use backend::BackendClient;
pub use recommendations::RecommendationService;
