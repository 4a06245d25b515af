pub mod config_port;
pub mod source_port;
pub mod store_port;
pub mod notifier_port;
