pub mod app;
pub mod audio;
pub mod config;
pub mod controller;
pub mod device;
pub mod engine;
pub mod prefs;
pub mod resolution;
pub mod sampler;
pub mod terminal;
