//! Domain records shared across the contract layer.

pub mod address;

pub use address::{AccountId, AddressError};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An attendance event registered on the contract.
///
/// Ids are assigned by the ledger (or the chain), never by callers.
/// Events are immutable once an NFT references them and are never
/// deleted by this layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Ledger-assigned id, starting at 1
    pub id: u64,
    /// Event name
    pub name: String,
    /// ISO-8601 calendar date, e.g. "2023-06-01"
    pub date: String,
    /// Venue
    pub location: String,
    /// Organizer account, SS58-encoded
    pub organizer: String,
}

/// An attendance NFT minted against an existing event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Nft {
    /// Ledger-assigned id, starting at 1
    pub id: u64,
    /// Event this NFT attests attendance of
    pub event_id: u64,
    /// Recipient account string
    pub owner: String,
    /// Free-form JSON metadata supplied at mint time
    pub metadata: Map<String, Value>,
}
