pub mod cache;
pub mod init;
pub mod list;
pub mod mirror;
