pub mod ids;
pub mod input;
pub mod output;
pub mod phone;
pub mod prediction;
pub mod task;

pub use ids::*;
pub use input::*;
pub use output::*;
pub use phone::*;
pub use prediction::*;
pub use task::*;
