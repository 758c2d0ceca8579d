//! # Urgence API Library
//!
//! Backend for a field-service operation: intervention dispatch, quote
//! (devis) lifecycle with electronic signature, invoicing, technician
//! accounts, realtime fan-out and device push notifications.

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod push;
pub mod realtime;
pub mod render;
pub mod repositories;
pub mod server;
pub mod signature;
pub mod telemetry;
pub use migration;
