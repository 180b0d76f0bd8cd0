// src/services/mod.rs

pub mod attempts;
pub mod composer;
pub mod results;
pub mod scoring;
pub mod selector;
