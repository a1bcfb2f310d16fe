pub mod bot;
pub mod clock;
pub mod collision;
pub mod constants;
pub mod duel;
pub mod grid;
pub mod input;
pub mod kinetics;
pub mod math;
pub mod pellets;
pub mod snake;
pub mod snapshot;
pub mod types;
pub mod world;
