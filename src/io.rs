pub mod cli;
pub mod config;
pub mod image;
pub mod texture_loader;
