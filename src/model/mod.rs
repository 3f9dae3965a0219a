pub mod ado;
pub mod cache;
pub mod jira;
pub mod user_map;
