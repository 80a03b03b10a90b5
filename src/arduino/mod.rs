//! Arduino IoT Cloud API integration
//!
//! - `client`: immutable endpoint config + authenticated JSON GETs
//! - `token`: client-credentials exchange
//! - `models`: raw API records

pub mod client;
pub mod models;
pub mod token;

pub use client::{ApiClient, ApiConfig};
pub use models::{ApiDevice, ApiThing};
pub use token::{AccessToken, Credentials, TokenProvider};
