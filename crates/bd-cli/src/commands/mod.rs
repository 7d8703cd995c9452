pub mod catalog;
pub mod fight;
