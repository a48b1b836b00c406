pub mod btle;
pub mod connection;
pub mod connector;
pub mod constants;
pub mod permission;
pub mod platform;
pub mod scanner;
pub mod session;
pub mod subscriber;
pub mod types;

#[cfg(test)]
pub mod testing;
