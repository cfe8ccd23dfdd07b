// src/lib.rs

//! ePrint feed library: parsing, storage, weekly index and keyword views.

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
