pub mod domain;
pub mod error;
pub mod services;

pub use domain::*;
pub use error::*;
pub use services::*;
