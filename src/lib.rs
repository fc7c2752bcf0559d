//! # Outpost - persistent-world game server simulation core
//!
//! Outpost is the server-side simulation backend for a persistent-world
//! extraction game. It maintains player profiles, simulates idle/offline
//! hideout production cycles, processes trading against trader assortments
//! and a special NPC vendor, and brokers a player marketplace with
//! time-based offer expiry.
//!
//! ## Features
//!
//! - **Pull-based simulation**: the server is not continuously ticking while
//!   a player is away; every pass reconstructs progress from elapsed
//!   wall-clock time.
//! - **Hideout production**: standard recipes, self-correcting scav-case
//!   timers, filter-gated water collection, a GPU-boosted continuous
//!   currency farm, and cultist-circle crafts, all skill-adjusted.
//! - **Resource decay**: fuel/filter slots drained in order with overflow
//!   chaining and skill-point awards per 10 units consumed.
//! - **Atomic trading**: buys run under a process-wide lock covering the
//!   stock check through the stock decrement; per-refresh purchase limits
//!   are enforced before any mutation.
//! - **Marketplace**: one-shot player offers with tick-driven expiry.
//! - **Persistence**: sled-backed bincode records with schema versioning.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use outpost::config::Config;
//! use outpost::server::SimServer;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let mut server = SimServer::new(config)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`hideout`] - production engine, resource decay, skill bonus calculator
//! - [`trade`] - buy/sell engines and purchase-limit bookkeeping
//! - [`ragfair`] - player marketplace offer board
//! - [`reward`] - reward application engine
//! - [`profile`] - profile model and inventory item-tree primitives
//! - [`catalog`] - read-only recipe/area/item-template catalog
//! - [`storage`] - sled persistence layer
//! - [`server`] - periodic tick driver and session-facing operations
//! - [`config`] - configuration management and validation
//! - [`locale`] - player-facing message templates

pub mod catalog;
pub mod config;
pub mod errors;
pub mod hideout;
pub mod locale;
pub mod logutil;
pub mod profile;
pub mod ragfair;
pub mod response;
pub mod reward;
pub mod server;
pub mod storage;
pub mod trade;
