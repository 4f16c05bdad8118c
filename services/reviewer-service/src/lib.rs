//! Pull request reviewer assignment service.
//!
//! This crate primarily ships a `reviewer-service` binary, but we expose a
//! library surface to enable integration testing and reuse.

pub mod api;
pub mod config;
pub mod db;
pub mod domain;
pub mod service;
pub mod state;
pub mod store;
