//! HTTP surface for the relay dispatch engine.
//!
//! Endpoints:
//! - POST /comms — queue a notification request
//! - GET  /comms/status — ingress occupancy, dispatch counters, actor status
//! - GET  /health — liveness probe

pub mod routes;
pub mod state;
