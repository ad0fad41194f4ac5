pub mod api;
pub mod app;
pub mod cache;
pub mod config;
pub mod event;
pub mod store;
pub mod task;
pub mod ui;
