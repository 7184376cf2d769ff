pub mod app;
pub mod core;
pub mod error;
pub mod game;
pub mod gpu;
pub mod io;
pub mod physics;
pub mod pipeline;
pub mod scene;
pub mod ui;
