pub mod api;
pub mod app;
pub mod config;
pub mod playback;
pub mod registry;
pub mod scheduler;
pub mod ws;
