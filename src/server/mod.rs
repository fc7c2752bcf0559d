//! Simulation server: owns the catalog, store, trader assortments, and the
//! marketplace board, and drives the periodic simulation tick.
//!
//! One background interval advances every profile's hideout and expires
//! marketplace offers for the whole process; there are no per-player timers.
//! The session-facing wrappers here are the request-handling boundary: hard
//! engine errors are translated into player-facing warnings on the returned
//! [`EventOutput`], never propagated as panics.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use log::{error, info, warn};

use crate::catalog::Catalog;
use crate::config::Config;
use crate::hideout;
use crate::hideout::ToolRequest;
use crate::locale::Messages;
use crate::profile::Profile;
use crate::ragfair::{OfferBoard, RagfairOffer};
use crate::response::EventOutput;
use crate::storage::ProfileStore;
use crate::trade::{self, BuyRequest, SellRequest, TraderAssort};

/// The running simulation backend.
pub struct SimServer {
    config: Config,
    catalog: Catalog,
    store: ProfileStore,
    traders: HashMap<String, TraderAssort>,
    board: OfferBoard,
    messages: Messages,
}

impl SimServer {
    /// Load catalog, store, trader state, and the offer board.
    pub fn new(config: Config) -> Result<Self> {
        let catalog = Catalog::load_from_dir(&config.server.seeds_dir)
            .with_context(|| format!("loading catalog from {}", config.server.seeds_dir))?;
        let store = ProfileStore::open(&config.server.data_dir)
            .with_context(|| format!("opening store at {}", config.server.data_dir))?;

        let mut traders = HashMap::new();
        for trader_id in store.list_trader_ids()? {
            if let Some(assort) = store.get_trader_assort(&trader_id)? {
                traders.insert(trader_id, assort);
            }
        }
        // The special vendor always exists, even before anyone sold to it
        traders
            .entry(config.trading.vendor_trader_id.clone())
            .or_insert_with(|| TraderAssort::new(config.trading.vendor_trader_id.clone()));

        let board = store.get_offer_board()?;

        // Optional operator overrides for player-facing text
        let messages_path = format!("{}/messages.json", config.server.seeds_dir);
        let messages = match Messages::load(&messages_path) {
            Ok(messages) => messages,
            Err(_) => Messages::default_messages(),
        };

        info!(
            "SimServer ready: {} traders, {} live offers",
            traders.len(),
            board.len()
        );

        Ok(Self {
            config,
            catalog,
            store,
            traders,
            board,
            messages,
        })
    }

    /// Run the periodic tick driver until interrupted.
    pub async fn run(&mut self) -> Result<()> {
        let mut ticker =
            tokio::time::interval(Duration::from_secs(self.config.server.tick_interval_secs));
        info!(
            "Tick driver running every {}s",
            self.config.server.tick_interval_secs
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_tick();
                }
                result = tokio::signal::ctrl_c() => {
                    result.context("waiting for shutdown signal")?;
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        self.persist_world()?;
        Ok(())
    }

    /// One simulation tick at the current wall-clock time.
    pub fn run_tick(&mut self) {
        self.run_tick_at(Utc::now().timestamp());
    }

    /// One simulation tick at an explicit timestamp (tests drive this).
    pub fn run_tick_at(&mut self, now: i64) {
        let profile_ids = match self.store.list_profile_ids() {
            Ok(ids) => ids,
            Err(e) => {
                error!("Tick skipped, cannot list profiles: {e}");
                return;
            }
        };

        for profile_id in profile_ids {
            // One broken profile must not stall the whole pass
            let mut profile = match self.store.get_profile(&profile_id) {
                Ok(profile) => profile,
                Err(e) => {
                    warn!("Skipping profile {profile_id} this tick: {e}");
                    continue;
                }
            };

            let mut output = EventOutput::new();
            hideout::update_player_hideout(
                &mut profile,
                &self.catalog,
                &self.config.hideout,
                &self.config.skills,
                &mut output,
                now,
            );
            for warning in &output.warnings {
                warn!("Tick warning for profile {profile_id}: {warning}");
            }

            if let Err(e) = self.store.put_profile(&profile) {
                error!("Failed to persist profile {profile_id}: {e}");
            }
        }

        let expired = self.board.remove_expired(now);
        for offer in &expired {
            info!("Offer {} from {} expired unsold", offer.id, offer.seller_id);
        }

        if let Err(e) = self.store.put_offer_board(&self.board) {
            error!("Failed to persist offer board: {e}");
        }
        if let Err(e) = self.store.flush() {
            error!("Store flush failed: {e}");
        }
    }

    /// Start a craft for a profile.
    pub fn start_production(
        &mut self,
        session_id: &str,
        recipe_id: &str,
        tools: &[ToolRequest],
    ) -> EventOutput {
        let now = Utc::now().timestamp();
        let mut output = EventOutput::new();

        let mut profile = match self.load_profile(session_id, &mut output) {
            Some(profile) => profile,
            None => return output,
        };

        hideout::start_production(
            &mut profile,
            recipe_id,
            tools,
            &self.catalog,
            &self.config.skills,
            &mut output,
            now,
        );
        self.save_profile(&profile, &mut output);
        output
    }

    /// Collect accumulated continuous-production output.
    pub fn collect_currency_output(&mut self, session_id: &str) -> EventOutput {
        let now = Utc::now().timestamp();
        let mut output = EventOutput::new();

        let mut profile = match self.load_profile(session_id, &mut output) {
            Some(profile) => profile,
            None => return output,
        };

        hideout::collect_currency_output(
            &mut profile,
            &self.catalog,
            &self.config.hideout,
            &mut output,
            now,
        );
        if !output.has_warnings() {
            self.save_profile(&profile, &mut output);
        }
        output
    }

    /// Execute a buy request for a profile. Hard failures (limit, stock,
    /// vanished offer) become player-facing warnings here.
    pub fn buy(&mut self, session_id: &str, request: &BuyRequest) -> EventOutput {
        let now = Utc::now().timestamp();
        let mut output = EventOutput::new();

        let mut profile = match self.load_profile(session_id, &mut output) {
            Some(profile) => profile,
            None => return output,
        };

        match trade::execute_buy(
            &mut profile,
            request,
            &mut self.board,
            &mut self.traders,
            &self.catalog,
            &mut output,
            now,
        ) {
            Ok(()) => {
                self.save_profile(&profile, &mut output);
                self.persist_trading_state();
            }
            Err(e) => {
                warn!("Buy failed for profile {session_id}: {e}");
                output.push_warning(self.messages.for_error(&e));
            }
        }

        output
    }

    /// Sell items from a profile to a trader (or the special vendor).
    pub fn sell(&mut self, session_id: &str, trader_id: &str, request: &SellRequest) -> EventOutput {
        let mut output = EventOutput::new();

        let mut profile = match self.load_profile(session_id, &mut output) {
            Some(profile) => profile,
            None => return output,
        };

        let vendor_assort = if trader_id == self.config.trading.vendor_trader_id {
            self.traders.get_mut(trader_id)
        } else {
            None
        };

        match trade::sell_items(&mut profile, None, request, vendor_assort, &mut output) {
            Ok(()) => {
                self.save_profile(&profile, &mut output);
                self.persist_trading_state();
            }
            Err(e) => {
                warn!("Sell failed for profile {session_id}: {e}");
                output.push_warning(self.messages.for_error(&e));
            }
        }

        output
    }

    /// Post a player offer onto the marketplace board.
    pub fn add_offer(&mut self, offer: RagfairOffer) -> String {
        let id = self.board.add_offer(offer);
        self.persist_trading_state();
        id
    }

    pub fn profile_count(&self) -> usize {
        self.store.list_profile_ids().map(|ids| ids.len()).unwrap_or(0)
    }

    pub fn offer_count(&self) -> usize {
        self.board.len()
    }

    fn load_profile(&self, session_id: &str, output: &mut EventOutput) -> Option<Profile> {
        match self.store.get_profile(session_id) {
            Ok(mut profile) => {
                profile.inventory.capacity = self.config.trading.stash_capacity;
                Some(profile)
            }
            Err(e) => {
                error!("Cannot load profile {session_id}: {e}");
                output.push_warning(self.messages.for_error(&e));
                None
            }
        }
    }

    fn save_profile(&self, profile: &Profile, output: &mut EventOutput) {
        if let Err(e) = self.store.put_profile(profile) {
            error!("Failed to persist profile {}: {e}", profile.id);
            output.push_warning("Failed to save profile state");
        }
    }

    fn persist_trading_state(&mut self) {
        for assort in self.traders.values() {
            if let Err(e) = self.store.put_trader_assort(assort) {
                error!("Failed to persist trader {}: {e}", assort.trader_id);
            }
        }
        if let Err(e) = self.store.put_offer_board(&self.board) {
            error!("Failed to persist offer board: {e}");
        }
    }

    fn persist_world(&mut self) -> Result<()> {
        self.persist_trading_state();
        self.store.flush()?;
        info!("World state persisted");
        Ok(())
    }
}
