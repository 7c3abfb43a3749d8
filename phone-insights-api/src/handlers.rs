pub mod breaker;
pub mod cache;
pub mod health;
pub mod predict;
pub mod search;
