pub mod filter;
pub mod global_id;
pub mod graphql;
#[cfg(test)]
pub mod memory;
pub mod model;
pub mod patch;
pub mod services;
pub mod store;
