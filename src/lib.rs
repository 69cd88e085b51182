pub mod app;
pub mod demos;
pub mod engine;
