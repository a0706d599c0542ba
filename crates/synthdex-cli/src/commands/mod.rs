pub mod construction;
pub mod returns;
