pub mod catalog;
pub mod youtube;
