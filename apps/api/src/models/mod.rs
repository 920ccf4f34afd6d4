pub mod analysis;
pub mod profile;
pub mod recommendation;
