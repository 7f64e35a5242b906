//! Command implementations

pub mod async_utils;
pub mod dataset;
pub mod job;
pub mod profile;
pub mod table;
