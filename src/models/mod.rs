// src/models/mod.rs

pub mod attempt;
pub mod exam;
pub mod history;
pub mod question;
pub mod score;
pub mod theme;
