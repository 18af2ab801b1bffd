pub mod classify;
pub mod dispatch;
pub mod governor;
pub mod stats;
pub mod walker;

pub use governor::Limits;
pub use walker::{analyze_container, Walker};
