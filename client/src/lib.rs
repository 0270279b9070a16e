pub mod api;
pub mod cache;
pub mod controller;
pub mod fetch;
pub mod logging;
pub mod overlay;
pub mod schedule;
pub mod settings;

#[cfg(test)]
mod testutil;
