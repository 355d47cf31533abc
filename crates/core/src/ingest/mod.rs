pub mod normalize;
pub mod types;

pub use normalize::{normalize_all, normalize_stored_ranking};
