//! Lead Bot — scripted qualification funnel for a language school.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod funnel;
pub mod leads;
pub mod session;
