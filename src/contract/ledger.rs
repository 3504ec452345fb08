//! In-memory simulated contract ledger.
//!
//! The ledger implements every supported contract method directly
//! against mutex-guarded maps, so the rest of the system behaves
//! deterministically whenever the real chain path is unavailable. One
//! instance is constructed at the composition root and shared (via
//! `Arc`) by every caller that needs fallback behavior, so state
//! created through one code path is visible to all others.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::types::{Event, Nft};

use super::{ContractError, ContractResult};

/// Organizer assigned to simulated events (the well-known dev account).
pub const DEV_ORGANIZER: &str = "5GrwvaEF5zXb26Fz9rcQpDWS57CtERHpNehXCPcNoHGKutQY";

/// Mutex-guarded in-memory contract state.
///
/// Every operation, reads included, holds the lock for its whole body:
/// correctness over throughput; this is a development/test simulation,
/// not a production data path. No I/O happens under the lock.
pub struct SimulatedLedger {
    inner: Mutex<LedgerState>,
}

#[derive(Debug)]
struct LedgerState {
    events: HashMap<u64, Event>,
    nfts: HashMap<u64, Nft>,
    event_count: u64,
    nft_count: u64,
}

impl SimulatedLedger {
    /// Create a ledger seeded with one event (id 1), so list and get
    /// operations have a non-empty default dataset.
    #[must_use]
    pub fn new() -> Self {
        let mut events = HashMap::new();
        events.insert(
            1,
            Event {
                id: 1,
                name: "Polkadot Meetup".to_string(),
                date: "2023-06-01".to_string(),
                location: "Berlin".to_string(),
                organizer: DEV_ORGANIZER.to_string(),
            },
        );

        Self {
            inner: Mutex::new(LedgerState {
                events,
                nfts: HashMap::new(),
                event_count: 1,
                nft_count: 0,
            }),
        }
    }

    /// Invoke a contract method against the in-memory state.
    ///
    /// Results are JSON bytes, matching what the real contract path
    /// returns. `get_event` signals "not found" with an empty byte
    /// sequence, not an error.
    ///
    /// # Errors
    /// `InvalidArgs` for wrong argument counts/types or malformed
    /// metadata JSON; `UnknownMethod` for unrecognized method names
    pub fn invoke(&self, method: &str, args: &[Value]) -> ContractResult<Vec<u8>> {
        let mut state = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        debug!(method, argc = args.len(), "simulated contract call");

        match method {
            "create_event" => state.create_event(args),
            "get_event" => state.get_event(args),
            "mint_nft" => state.mint_nft(args),
            "get_event_count" => to_json(&state.event_count),
            "get_nft_count" => to_json(&state.nft_count),
            "get_owned_nfts" => state.get_owned_nfts(args),
            other => Err(ContractError::UnknownMethod(other.to_string())),
        }
    }
}

impl Default for SimulatedLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl LedgerState {
    fn create_event(&mut self, args: &[Value]) -> ContractResult<Vec<u8>> {
        if args.len() < 3 {
            return Err(ContractError::InvalidArgs(
                "create_event requires 3 arguments".to_string(),
            ));
        }
        let (Some(name), Some(date), Some(location)) =
            (args[0].as_str(), args[1].as_str(), args[2].as_str())
        else {
            return Err(ContractError::InvalidArgs(
                "create_event expects three string arguments".to_string(),
            ));
        };

        self.event_count += 1;
        let id = self.event_count;

        self.events.insert(
            id,
            Event {
                id,
                name: name.to_string(),
                date: date.to_string(),
                location: location.to_string(),
                organizer: DEV_ORGANIZER.to_string(),
            },
        );
        info!(id, name, "created simulated event");

        to_json(&id)
    }

    fn get_event(&self, args: &[Value]) -> ContractResult<Vec<u8>> {
        let Some(arg) = args.first() else {
            return Err(ContractError::InvalidArgs(
                "get_event requires 1 argument".to_string(),
            ));
        };
        let id = coerce_event_lookup_id(arg)?;

        match self.events.get(&id) {
            Some(event) => to_json(event),
            // Absent events are an empty result, not an error.
            None => Ok(Vec::new()),
        }
    }

    fn mint_nft(&mut self, args: &[Value]) -> ContractResult<Vec<u8>> {
        if args.len() < 3 {
            return Err(ContractError::InvalidArgs(
                "mint_nft requires 3 arguments".to_string(),
            ));
        }
        let event_id = coerce_uint(&args[0])?;
        let Some(recipient) = args[1].as_str() else {
            return Err(ContractError::InvalidArgs(
                "mint_nft recipient must be a string".to_string(),
            ));
        };
        let Some(metadata_json) = args[2].as_str() else {
            return Err(ContractError::InvalidArgs(
                "mint_nft metadata must be a JSON string".to_string(),
            ));
        };

        if !self.events.contains_key(&event_id) {
            info!(event_id, "mint refused: event does not exist");
            return to_json(&false);
        }

        // Malformed metadata is a hard error; the counter stays put.
        let metadata: Map<String, Value> = serde_json::from_str(metadata_json)
            .map_err(|e| ContractError::InvalidArgs(format!("invalid metadata JSON: {e}")))?;

        self.nft_count += 1;
        let id = self.nft_count;

        self.nfts.insert(
            id,
            Nft {
                id,
                event_id,
                owner: recipient.to_string(),
                metadata,
            },
        );
        info!(id, event_id, recipient, "minted simulated NFT");

        to_json(&true)
    }

    fn get_owned_nfts(&self, args: &[Value]) -> ContractResult<Vec<u8>> {
        let Some(arg) = args.first() else {
            return Err(ContractError::InvalidArgs(
                "get_owned_nfts requires 1 argument".to_string(),
            ));
        };
        // Placeholder: a fixed id list for any owner. Per-owner indexing
        // lives in the on-chain contract and has no simulation yet.
        if arg.is_string() {
            to_json(&[1u64, 2, 3])
        } else {
            to_json(&Vec::<u64>::new())
        }
    }
}

/// Coerce a JSON value into an unsigned id.
///
/// Precedence: u64, then non-negative i64, then finite non-negative f64
/// (truncated). Everything else is an `InvalidArgs` error. The float
/// case is load-bearing: callers that serialize ids as JSON numbers
/// deliver them as f64.
pub fn coerce_uint(value: &Value) -> ContractResult<u64> {
    if let Some(n) = value.as_u64() {
        return Ok(n);
    }
    if let Some(n) = value.as_i64() {
        if n >= 0 {
            return Ok(n as u64);
        }
    }
    if let Some(f) = value.as_f64() {
        if f.is_finite() && f >= 0.0 {
            return Ok(f as u64);
        }
    }
    Err(ContractError::InvalidArgs(format!(
        "cannot coerce {value} to an unsigned id"
    )))
}

/// `get_event` also accepts the marshalled call-data shape
/// `{"args": [id, ...]}` some callers produce.
fn coerce_event_lookup_id(value: &Value) -> ContractResult<u64> {
    if let Some(obj) = value.as_object() {
        let first = obj
            .get("args")
            .and_then(Value::as_array)
            .and_then(|a| a.first())
            .ok_or_else(|| {
                ContractError::InvalidArgs("invalid call-data shape: no args".to_string())
            })?;
        return coerce_uint(first);
    }
    coerce_uint(value)
}

fn to_json<T: serde::Serialize>(value: &T) -> ContractResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| ContractError::Internal(format!("result encoding failed: {e}")))
}
