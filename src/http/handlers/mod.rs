//! Route handlers.

pub mod ai;
pub mod auth;
pub mod pages;
