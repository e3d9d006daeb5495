pub mod recorder;
pub mod rest;
pub mod types;
