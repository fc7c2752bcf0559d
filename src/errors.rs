use thiserror::Error;

/// Errors that can arise in the simulation core and its storage layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, seed files, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a profile that is not present.
    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// A craft was started against a recipe id the catalog does not know.
    #[error("recipe not found: {0}")]
    RecipeNotFound(String),

    /// An item template referenced by an offer or slot is missing from the catalog.
    #[error("item template not found: {0}")]
    TemplateNotFound(String),

    /// The offer/assort root item no longer exists (concurrently exhausted or removed).
    #[error("offer not found: {0}")]
    OfferNotFound(String),

    /// A purchase would exceed the per-refresh-cycle limit for a restricted item.
    #[error("purchase of {requested} would exceed limit {limit} for trader {trader} assort {assort} this refresh")]
    PurchaseLimitExceeded {
        trader: String,
        assort: String,
        requested: u32,
        limit: u32,
    },

    /// A purchase asked for more units than the source has in stock.
    #[error("purchase of {requested} exceeds remaining stock {stock} from trader {trader} this refresh")]
    InsufficientStock {
        trader: String,
        requested: u32,
        stock: u32,
    },

    /// An item referenced by a sell request is not in the seller's inventory.
    #[error("item not found in inventory: {0}")]
    ItemNotFound(String),

    /// Payment could not be completed.
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    /// Internal error (corrupt state, unexpected conditions).
    #[error("internal error: {0}")]
    Internal(String),
}
