pub mod class;
pub mod user;
