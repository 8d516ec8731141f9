//! ENTSO-E transparency platform client library.
//!
//! This crate provides a Rust client for the transparency platform REST API
//! and a codec for the XML market documents it publishes. It supports:
//!
//! - Querying installed generation capacity per production type
//! - Decoding generation documents into a timestamp × production type table
//! - Naming bidding zones and production type codes
//!
//! # Example
//!
//! ```no_run
//! use chrono::{TimeZone, Utc};
//! use entsoe_client::{EntsoeClient, EntsoeConfig};
//! use secrecy::SecretString;
//!
//! # async fn example() -> Result<(), entsoe_client::EntsoeError> {
//! let config = EntsoeConfig::new(SecretString::from("my-token"));
//! let client = EntsoeClient::new(config)?;
//!
//! let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
//! let capacity = client
//!     .installed_generation_capacity("10Y1001A1001A82H", start, Utc::now())
//!     .await?;
//! println!("Wind Offshore: {:?}", capacity.representative("Wind Offshore"));
//! # Ok(())
//! # }
//! ```

pub mod areas;
pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod psr;
pub mod series;

pub use areas::region_name;
pub use client::EntsoeClient;
pub use config::EntsoeConfig;
pub use document::parse_generation;
pub use error::EntsoeError;
pub use series::{ColumnKey, GenerationRow, GenerationSeries, InstalledCapacity};
