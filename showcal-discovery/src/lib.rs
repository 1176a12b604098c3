pub mod apis;
pub mod config;
pub mod observability;
pub mod orchestrator;
pub mod remote;
pub mod selection;
pub mod server;
