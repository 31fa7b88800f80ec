#[cfg(feature = "audit-log")]
pub mod audit_cmd;
pub mod logins;
pub mod migrate;
pub mod verify;
