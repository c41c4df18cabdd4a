pub mod articles;
pub mod preferences;
pub mod users;
