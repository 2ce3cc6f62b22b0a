//! # Driftboard API Server Library
//!
//! Core functionality for the Driftboard API server: the remote document
//! store half of the task board, serving owner-scoped task CRUD and live
//! board queries over SSE.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
