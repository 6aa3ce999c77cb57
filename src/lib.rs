pub mod config;
pub mod error;
pub mod github;
pub mod merge;
pub mod runner;
pub mod types;

#[cfg(test)]
mod tests;
