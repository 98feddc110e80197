//! # Apotek POS Server
//!
//! JSON API for the pharmacy counter.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Apotek POS Server                                │
//! │                                                                         │
//! │  POS frontend ───► HTTP/JSON (8080) ───► routes ───► apotek-db         │
//! │                                            │                            │
//! │                                            ▼                            │
//! │                                      WhatsAppSender                     │
//! │                                   (restock messages)                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::ApiError;
pub use state::AppState;
