pub mod cache;
pub mod cli;
pub mod colors;
pub mod cookbook;
pub mod error;
pub mod fetch;
pub mod fsutil;
pub mod graph;
pub mod inventory;
pub mod mirror;
pub mod output;
pub mod store;
#[cfg(test)]
pub mod tests;
