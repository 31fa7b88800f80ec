#[cfg(feature = "audit-log")]
pub mod audit;
pub mod cli;
pub mod config;
pub mod crypto;
pub mod errors;
pub mod pipeline;
pub mod profile;
pub mod statekey;
pub mod store;
