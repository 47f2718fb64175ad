// src/lib.rs

//! VOSE Finder Library
//!
//! Collects original-language subtitled showings from Gran Canaria cinemas.

pub mod browser;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod services;
pub mod utils;
