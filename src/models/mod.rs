//! Request and Response models for the gateway API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::DataQuery;
pub use responses::{
    ClearResponse, DataResponse, DataSource, HealthResponse, InvalidateResponse, QuotaResponse,
    StatsResponse,
};
