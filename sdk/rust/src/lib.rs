//! Typed client for the escrow relay HTTP API.

pub mod client;

pub use client::{
    HealthResponse, ListResponse, RelayClient, SubmitRequest, SubmitResponse, TransactionView, VerifyResponse,
};
