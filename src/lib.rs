pub mod armor;
pub mod audio;
pub mod compute;
pub mod config;
pub mod entities;
pub mod error;
pub mod geometry;
pub mod input;
pub mod pool;
pub mod raycast;
pub mod session;
pub mod stats;
pub mod storage;
pub mod weapons;
pub mod world;
