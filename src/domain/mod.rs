pub mod address;
pub mod chain;
pub mod message;
pub mod models;
pub mod normalize;

pub use models::*;
