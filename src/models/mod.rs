pub mod configuration;
pub mod platform;
pub mod remote_file;
