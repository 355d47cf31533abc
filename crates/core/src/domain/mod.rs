pub mod ranking;
pub mod trending;
