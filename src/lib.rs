pub mod app;
pub mod game;
pub mod shared;
