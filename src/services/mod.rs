pub mod hierarchy;
pub mod store;
pub mod troubleshoot;
