pub mod app;
pub mod audio;
pub mod config;
pub mod core;
pub mod cursor;
pub mod library;
pub mod logging;
pub mod model;
pub mod ui;
