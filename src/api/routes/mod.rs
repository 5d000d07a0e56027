//! API route handlers

pub mod blood_sugar;
pub mod correlation;
pub mod food;
pub mod health;
pub mod nutrition;
