pub mod auth;
pub mod notices;
pub mod records;
pub mod student;
