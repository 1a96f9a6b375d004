// src/utils/mod.rs
pub mod linalg;
pub mod logger;
pub mod m4;
pub mod report;
