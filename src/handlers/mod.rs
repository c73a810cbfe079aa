// src/handlers/mod.rs

pub mod meta;
pub mod quiz;
pub mod ranking;
pub mod submission;
pub mod tag;
pub mod user;
