pub mod animation;
pub mod app;
pub mod cache;
pub mod config;
pub mod geo;
pub mod io;
pub mod physics;
pub mod plot;
pub mod render;
pub mod ui;

#[cfg(test)]
mod tests;
