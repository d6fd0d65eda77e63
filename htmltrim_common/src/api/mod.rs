pub mod service;
pub mod switch;
pub mod trim;
