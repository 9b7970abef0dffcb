// src/models/mod.rs
pub mod audit;
pub mod content;
pub mod engagement;
pub mod podcasts;
pub mod progress;
pub mod users;
