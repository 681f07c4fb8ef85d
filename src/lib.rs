pub mod bounds;
pub mod config;
pub mod field;
pub mod logger;
pub mod mesh;
pub mod ply;
pub mod runner;
