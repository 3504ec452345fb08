//! Typed client façade over the contract caller.
//!
//! Construction resolves the chain connection once and silently
//! degrades to simulation when the endpoint is unreachable or the
//! contract address does not decode; the client is always usable.
//! Whether it is running simulated is visible through
//! [`Client::is_simulated`] and the logs, never through errors.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::{info, warn};

use crate::contract::ledger::{SimulatedLedger, DEV_ORGANIZER};
use crate::contract::metadata::DEFAULT_METADATA_FILE;
use crate::contract::rpc::ChainRpc;
use crate::contract::{ContractCaller, ContractError, ContractResult};
use crate::types::{AccountId, Event, Nft};

/// Client for the attendance NFT contract.
pub struct Client {
    caller: ContractCaller,
    chain_name: String,
}

impl Client {
    /// Connect to the chain and deployed contract, degrading to the
    /// simulated ledger at every failure point.
    pub async fn connect(
        rpc_url: &str,
        contract_address: &str,
        ledger: Arc<SimulatedLedger>,
    ) -> Self {
        Self::connect_with_metadata(rpc_url, contract_address, DEFAULT_METADATA_FILE, ledger).await
    }

    /// [`Client::connect`] with an explicit metadata file path.
    pub async fn connect_with_metadata(
        rpc_url: &str,
        contract_address: &str,
        metadata_path: &str,
        ledger: Arc<SimulatedLedger>,
    ) -> Self {
        info!(rpc_url, "connecting to chain");

        let rpc = match ChainRpc::connect(rpc_url).await {
            Ok(rpc) => rpc,
            Err(e) => {
                warn!("chain connection failed: {e}; using the simulated ledger");
                return Self::simulated(ledger);
            }
        };

        let chain_name = match rpc.system_name().await {
            Ok(name) => name,
            Err(_) => rpc
                .system_chain()
                .await
                .unwrap_or_else(|_| "Unknown".to_string()),
        };
        info!(chain_name, "connected to chain");

        if contract_address.is_empty() {
            warn!("no contract address configured; using the simulated ledger");
            return Self {
                caller: ContractCaller::new(None, None, metadata_path, ledger),
                chain_name,
            };
        }

        let contract = match AccountId::parse(contract_address) {
            Ok(contract) => contract,
            Err(e) => {
                warn!(contract_address, "cannot decode contract address: {e}; using the simulated ledger");
                return Self {
                    caller: ContractCaller::new(None, None, metadata_path, ledger),
                    chain_name,
                };
            }
        };

        info!(contract = %contract, "using on-chain contract");
        Self {
            caller: ContractCaller::new(Some(rpc), Some(contract), metadata_path, ledger),
            chain_name,
        }
    }

    /// A client that only ever uses the simulated ledger.
    #[must_use]
    pub fn simulated(ledger: Arc<SimulatedLedger>) -> Self {
        Self {
            caller: ContractCaller::new(None, None, DEFAULT_METADATA_FILE, ledger),
            chain_name: "Simulated".to_string(),
        }
    }

    /// Name of the connected chain, or "Simulated"
    #[must_use]
    pub fn chain_name(&self) -> &str {
        &self.chain_name
    }

    /// Whether calls only ever touch the simulated ledger
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.caller.is_simulated()
    }

    /// Create a new event; returns its id.
    ///
    /// # Errors
    /// `InvalidArgs` if any field is empty
    pub async fn create_event(
        &self,
        name: &str,
        date: &str,
        location: &str,
    ) -> ContractResult<u64> {
        if name.is_empty() || date.is_empty() || location.is_empty() {
            return Err(ContractError::InvalidArgs(
                "name, date, and location are required".to_string(),
            ));
        }

        info!(name, date, location, "creating event");
        let result = self
            .caller
            .invoke("create_event", &[json!(name), json!(date), json!(location)])
            .await?;

        let id: u64 = serde_json::from_slice(&result)
            .map_err(|e| ContractError::Internal(format!("failed to parse event id: {e}")))?;
        info!(id, "event created");
        Ok(id)
    }

    /// Fetch an event by id. `None` means the event does not exist;
    /// errors are reserved for malformed calls.
    ///
    /// # Errors
    /// `Internal` if the result does not decode
    pub async fn get_event(&self, id: u64) -> ContractResult<Option<Event>> {
        let result = self.caller.invoke("get_event", &[json!(id)]).await?;
        if result.is_empty() {
            return Ok(None);
        }
        let event = serde_json::from_slice(&result)
            .map_err(|e| ContractError::Internal(format!("failed to parse event: {e}")))?;
        Ok(Some(event))
    }

    /// List all events by walking ids 1..=count.
    ///
    /// A failing id is logged and skipped; one bad record must not
    /// abort the whole listing.
    ///
    /// # Errors
    /// `Internal` if the event count does not decode
    pub async fn list_events(&self) -> ContractResult<Vec<Event>> {
        let count = self.fetch_count("get_event_count").await?;
        info!(count, "listing events");

        let mut events = Vec::with_capacity(count as usize);
        for id in 1..=count {
            match self.get_event(id).await {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => {
                    warn!(id, "failed to fetch event: {e}");
                }
            }
        }
        Ok(events)
    }

    /// Mint an attendance NFT. Returns `false` (not an error) when the
    /// contract refuses, e.g. for a non-existent event.
    ///
    /// # Errors
    /// `InvalidArgs` for an empty recipient or zero event id
    pub async fn mint_nft(
        &self,
        event_id: u64,
        recipient: &str,
        metadata: &Map<String, Value>,
    ) -> ContractResult<bool> {
        if recipient.is_empty() {
            return Err(ContractError::InvalidArgs(
                "recipient address is required".to_string(),
            ));
        }
        if event_id == 0 {
            return Err(ContractError::InvalidArgs("invalid event id".to_string()));
        }

        let metadata_json = serde_json::to_string(metadata)
            .map_err(|e| ContractError::Internal(format!("failed to encode metadata: {e}")))?;

        info!(event_id, recipient, "minting NFT");
        let result = self
            .caller
            .invoke(
                "mint_nft",
                &[json!(event_id), json!(recipient), json!(metadata_json)],
            )
            .await?;

        let minted: bool = serde_json::from_slice(&result)
            .map_err(|e| ContractError::Internal(format!("failed to parse mint result: {e}")))?;
        if minted {
            info!(event_id, recipient, "NFT minted");
        } else {
            warn!(event_id, "NFT minting refused");
        }
        Ok(minted)
    }

    /// List all NFTs.
    ///
    /// When running simulated with an empty ledger this returns one
    /// demonstration record, a deliberate empty-state choice so fresh
    /// deployments have something to render.
    ///
    /// # Errors
    /// `Internal` if the NFT count does not decode
    pub async fn list_nfts(&self) -> ContractResult<Vec<Nft>> {
        let count = self.fetch_count("get_nft_count").await?;
        info!(count, "listing NFTs");

        if self.is_simulated() && count == 0 {
            info!("returning demo NFT data");
            return Ok(vec![demo_nft()]);
        }

        // Per-NFT fetch from the real chain is not implemented yet.
        Ok(Vec::new())
    }

    async fn fetch_count(&self, method: &str) -> ContractResult<u64> {
        let result = self.caller.invoke(method, &[]).await?;
        serde_json::from_slice(&result)
            .map_err(|e| ContractError::Internal(format!("failed to parse {method}: {e}")))
    }
}

fn demo_nft() -> Nft {
    let mut metadata = Map::new();
    metadata.insert("name".to_string(), json!("Attendance: Polkadot Meetup"));
    metadata.insert(
        "description".to_string(),
        json!("Proof of attendance for Polkadot Meetup"),
    );
    metadata.insert("event_name".to_string(), json!("Polkadot Meetup"));
    metadata.insert("event_date".to_string(), json!("2023-06-01"));
    metadata.insert("location".to_string(), json!("Berlin"));
    metadata.insert("attendee".to_string(), json!("John Doe"));

    Nft {
        id: 1,
        event_id: 1,
        owner: DEV_ORGANIZER.to_string(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn simulated_client() -> Client {
        Client::simulated(Arc::new(SimulatedLedger::new()))
    }

    #[tokio::test]
    async fn test_create_and_get_roundtrip() {
        let client = simulated_client();

        let id = client
            .create_event("RustFest", "2024-09-10", "Vienna")
            .await
            .unwrap();
        assert_eq!(id, 2);

        let event = client.get_event(id).await.unwrap().unwrap();
        assert_eq!(event.name, "RustFest");
        assert_eq!(event.organizer, DEV_ORGANIZER);

        assert!(client.get_event(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_fields_are_hard_errors() {
        let client = simulated_client();

        let err = client.create_event("", "2024-09-10", "Vienna").await.unwrap_err();
        assert!(matches!(err, ContractError::InvalidArgs(_)));

        let err = client.mint_nft(1, "", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ContractError::InvalidArgs(_)));

        let err = client.mint_nft(0, "addrX", &Map::new()).await.unwrap_err();
        assert!(matches!(err, ContractError::InvalidArgs(_)));
    }

    #[tokio::test]
    async fn test_list_events_includes_seed() {
        let client = simulated_client();
        client
            .create_event("Second", "2024-01-02", "Oslo")
            .await
            .unwrap();

        let events = client.list_events().await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 1);
        assert_eq!(events[1].name, "Second");
    }

    #[tokio::test]
    async fn test_list_nfts_demo_record_until_first_mint() {
        let client = simulated_client();

        let nfts = client.list_nfts().await.unwrap();
        assert_eq!(nfts.len(), 1);
        assert_eq!(nfts[0].owner, DEV_ORGANIZER);

        let mut metadata = Map::new();
        metadata.insert("attendee".to_string(), json!("Ada"));
        assert!(client.mint_nft(1, "addrX", &metadata).await.unwrap());

        // A real mint exists now, so the demo record disappears and the
        // (unimplemented) per-NFT fetch yields an empty list.
        let nfts = client.list_nfts().await.unwrap();
        assert!(nfts.is_empty());
    }

    #[tokio::test]
    async fn test_mint_against_missing_event_returns_false() {
        let client = simulated_client();
        let minted = client.mint_nft(999, "addrX", &Map::new()).await.unwrap();
        assert!(!minted);
    }
}
