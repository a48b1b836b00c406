pub mod application;
pub mod route;
pub mod style;
pub mod types;
