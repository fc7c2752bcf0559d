//! Sled-backed persistence for profiles, trader assortments, and the
//! marketplace offer board.
//!
//! Records are bincode-encoded with a schema version field checked on read.
//! The persistence format is an internal detail of this module; the engines
//! only ever see the in-memory types.

use std::path::{Path, PathBuf};

use crate::errors::CoreError;
use crate::profile::{Profile, PROFILE_SCHEMA_VERSION};
use crate::ragfair::OfferBoard;
use crate::trade::TraderAssort;

const TREE_PROFILES: &str = "outpost_profiles";
const TREE_TRADERS: &str = "outpost_traders";
const TREE_OFFERS: &str = "outpost_offers";

const OFFER_BOARD_KEY: &[u8] = b"board";

/// Helper builder so tests can easily create throwaway stores with custom
/// paths.
pub struct ProfileStoreBuilder {
    path: PathBuf,
}

impl ProfileStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<ProfileStore, CoreError> {
        ProfileStore::open(self.path)
    }
}

/// Sled-backed store for all persistent simulation state.
pub struct ProfileStore {
    _db: sled::Db,
    profiles: sled::Tree,
    traders: sled::Tree,
    offers: sled::Tree,
}

impl ProfileStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CoreError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let profiles = db.open_tree(TREE_PROFILES)?;
        let traders = db.open_tree(TREE_TRADERS)?;
        let offers = db.open_tree(TREE_OFFERS)?;

        Ok(Self {
            _db: db,
            profiles,
            traders,
            offers,
        })
    }

    fn profile_key(profile_id: &str) -> Vec<u8> {
        format!("profiles:{profile_id}").into_bytes()
    }

    fn trader_key(trader_id: &str) -> Vec<u8> {
        format!("traders:{trader_id}").into_bytes()
    }

    pub fn put_profile(&self, profile: &Profile) -> Result<(), CoreError> {
        let bytes = bincode::serialize(profile)?;
        self.profiles.insert(Self::profile_key(&profile.id), bytes)?;
        Ok(())
    }

    pub fn get_profile(&self, profile_id: &str) -> Result<Profile, CoreError> {
        let Some(bytes) = self.profiles.get(Self::profile_key(profile_id))? else {
            return Err(CoreError::ProfileNotFound(profile_id.to_string()));
        };
        let profile: Profile = bincode::deserialize(&bytes)?;
        if profile.schema_version != PROFILE_SCHEMA_VERSION {
            return Err(CoreError::SchemaMismatch {
                entity: "profile",
                expected: PROFILE_SCHEMA_VERSION,
                found: profile.schema_version,
            });
        }
        Ok(profile)
    }

    /// Ids of every stored profile, for the tick driver's full pass.
    pub fn list_profile_ids(&self) -> Result<Vec<String>, CoreError> {
        let mut ids = Vec::new();
        for entry in self.profiles.iter() {
            let (key, _) = entry?;
            let key = String::from_utf8_lossy(&key);
            if let Some(id) = key.strip_prefix("profiles:") {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    pub fn put_trader_assort(&self, assort: &TraderAssort) -> Result<(), CoreError> {
        let bytes = bincode::serialize(assort)?;
        self.traders
            .insert(Self::trader_key(&assort.trader_id), bytes)?;
        Ok(())
    }

    pub fn get_trader_assort(&self, trader_id: &str) -> Result<Option<TraderAssort>, CoreError> {
        let Some(bytes) = self.traders.get(Self::trader_key(trader_id))? else {
            return Ok(None);
        };
        Ok(Some(bincode::deserialize(&bytes)?))
    }

    pub fn list_trader_ids(&self) -> Result<Vec<String>, CoreError> {
        let mut ids = Vec::new();
        for entry in self.traders.iter() {
            let (key, _) = entry?;
            let key = String::from_utf8_lossy(&key);
            if let Some(id) = key.strip_prefix("traders:") {
                ids.push(id.to_string());
            }
        }
        Ok(ids)
    }

    pub fn put_offer_board(&self, board: &OfferBoard) -> Result<(), CoreError> {
        let bytes = bincode::serialize(board)?;
        self.offers.insert(OFFER_BOARD_KEY, bytes)?;
        Ok(())
    }

    /// Load the persisted offer board, empty when none was saved yet.
    pub fn get_offer_board(&self) -> Result<OfferBoard, CoreError> {
        let Some(bytes) = self.offers.get(OFFER_BOARD_KEY)? else {
            return Ok(OfferBoard::new());
        };
        Ok(bincode::deserialize(&bytes)?)
    }

    pub fn flush(&self) -> Result<(), CoreError> {
        self._db.flush()?;
        Ok(())
    }
}
