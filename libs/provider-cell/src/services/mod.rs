pub mod availability;
pub mod provider;
pub mod resolver;
