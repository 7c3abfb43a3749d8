//! Resource clients
//!
//! One client per group of upstream endpoints.

pub mod phones;
pub mod predictions;
pub mod system;

pub use phones::PhonesClient;
pub use predictions::PredictionsClient;
pub use system::{SystemClient, UpstreamHealth};
