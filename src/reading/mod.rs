pub mod level;
pub mod presenter;
