// src/handlers/mod.rs

pub mod auth;
pub mod listing;
pub mod user;
