pub mod admin;
pub mod buy;
