//! # Volspike-Data
//! Normalised daily market data for the Korea Exchange (KOSPI & KOSDAQ).
//!
//! A [`MarketDataSource`](source::MarketDataSource) delivers raw per-instrument rows for a
//! session date & market. The [`SnapshotFetcher`](fetcher::SnapshotFetcher) negotiates the row
//! schema against a prioritised list of known keys (see [`schema`]) and normalises the rows
//! into [`VolumeSnapshot`](snapshot::VolumeSnapshot)s & [`CapSnapshot`](snapshot::CapSnapshot)s,
//! dropping any value that does not parse as a non-negative number.
//!
//! ## Examples
//! ```rust,no_run
//! use volspike_data::{
//!     fetcher::SnapshotFetcher,
//!     market::Market,
//!     session::SessionDate,
//!     source::{KrxClient, krx::BASE_URL_KRX},
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = KrxClient::new(BASE_URL_KRX).unwrap();
//!     let fetcher = SnapshotFetcher::new(client);
//!
//!     let session = SessionDate::from_ymd(2024, 5, 10).unwrap();
//!     let volumes = fetcher
//!         .fetch_volumes_all(session, &Market::ALL)
//!         .await
//!         .unwrap();
//!
//!     println!("{} instruments traded on {session}", volumes.len());
//! }
//! ```

/// All [`Error`](std::error::Error)s generated in Volspike-Data.
pub mod error;

/// [`SnapshotFetcher`](fetcher::SnapshotFetcher) that turns raw source rows into normalised
/// snapshots.
pub mod fetcher;

/// Instrument identifiers and attributes.
pub mod instrument;

/// Supported KRX [`Market`](market::Market)s.
pub mod market;

/// Field negotiation against the documented source schema with prioritised fallback keys.
pub mod schema;

/// Calendar date of a trading session.
pub mod session;

/// Raw & normalised per-instrument snapshots.
pub mod snapshot;

/// [`MarketDataSource`](source::MarketDataSource) trait and its implementations.
pub mod source;
