//! Dashboard core library (validation, session, browsing, config).

pub mod api;
pub mod browse;
pub mod config;
pub mod logging;
pub mod login;
pub mod session;
pub mod storage;
pub mod validation;
