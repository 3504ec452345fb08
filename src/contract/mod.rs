//! Contract invocation layer.
//!
//! Application code calls named contract methods ("create_event",
//! "mint_nft", …) through a [`ContractCaller`] without caring whether a
//! live chain connection and deployed contract are available:
//!
//! 1. **Metadata** resolves a logical method name to its selector and
//!    mutability flag ([`metadata`])
//! 2. Read-only methods go through a state query; mutating methods go
//!    through the signing/submission path ([`rpc`], [`extrinsic`])
//! 3. Any failure along the real path falls back to the in-memory
//!    [`ledger::SimulatedLedger`]
//!
//! ## Fallback contract
//!
//! The total-fallback property is the defining behavior of this layer:
//! once a caller is constructed, `invoke` never surfaces transport or
//! resolution failures. Callers see either a real result or a simulated
//! one; the two are distinguished in logs, not in return values. The
//! only hard errors are malformed arguments, malformed metadata JSON
//! payloads, and unknown method names.

pub mod extrinsic;
pub mod ledger;
pub mod metadata;
pub mod rpc;

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::types::AccountId;

use self::extrinsic::DevSigner;
use self::ledger::SimulatedLedger;
use self::metadata::{ContractMetadata, MethodDescriptor};
use self::rpc::ChainRpc;

/// Result type for contract operations
pub type ContractResult<T> = Result<T, ContractError>;

/// Contract layer errors.
///
/// `NotFound` and `Transport` never escape `invoke`; they trigger the
/// fallback to simulation instead. `InvalidArgs` and `UnknownMethod`
/// are surfaced to the caller.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// Metadata file or method name unresolvable
    #[error("not found: {0}")]
    NotFound(String),

    /// Wrong argument count/type, or malformed JSON payload
    #[error("invalid arguments: {0}")]
    InvalidArgs(String),

    /// Method name recognized by neither metadata nor the ledger
    #[error("unknown method: {0}")]
    UnknownMethod(String),

    /// RPC unreachable, submission failure, query failure
    #[error("transport failure: {0}")]
    Transport(String),

    /// Metadata file is not valid structured data
    #[error("metadata parse error: {0}")]
    Parse(String),

    /// Ledger-internal programmer error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Methods that only read contract state and may be served by a query.
const READ_ONLY_METHODS: [&str; 5] = [
    "get_event",
    "get_nft",
    "get_event_count",
    "get_nft_count",
    "get_owned_nfts",
];

fn is_read_only(method: &str) -> bool {
    READ_ONLY_METHODS.contains(&method)
}

/// A contract caller: real chain interaction or in-memory simulation.
pub enum ContractCaller {
    /// Live chain connection with a deployed contract
    Real(RealCaller),
    /// In-memory stand-in, shared across all fallback users
    Simulated(Arc<SimulatedLedger>),
}

/// Real-chain variant state.
pub struct RealCaller {
    rpc: ChainRpc,
    contract: AccountId,
    signer: DevSigner,
    metadata: Option<&'static ContractMetadata>,
    ledger: Arc<SimulatedLedger>,
}

impl ContractCaller {
    /// Build a caller. Without both an RPC handle and a contract
    /// address, the caller is fully simulated.
    ///
    /// Metadata is loaded once per process (see [`metadata::load_cached`]);
    /// a missing or unparsable file is tolerated here; affected calls
    /// fall back at invoke time.
    pub fn new(
        rpc: Option<ChainRpc>,
        contract: Option<AccountId>,
        metadata_path: &str,
        ledger: Arc<SimulatedLedger>,
    ) -> Self {
        let (Some(rpc), Some(contract)) = (rpc, contract) else {
            return Self::Simulated(ledger);
        };

        let metadata = match metadata::load_cached(metadata_path) {
            Ok(meta) => {
                info!(
                    messages = meta.messages().len(),
                    "loaded contract metadata"
                );
                for message in meta.messages() {
                    debug!(label = %message.label, selector = %message.selector, "contract message");
                }
                Some(meta)
            }
            Err(e) => {
                warn!("failed to load contract metadata: {e}; affected calls will use the simulated ledger");
                None
            }
        };

        Self::Real(RealCaller {
            rpc,
            contract,
            signer: DevSigner::development(),
            metadata,
            ledger,
        })
    }

    /// Invoke a named contract method with JSON-ish arguments.
    ///
    /// # Errors
    /// Only argument-shape and unknown-method errors propagate; real-path
    /// failures are absorbed by simulation.
    pub async fn invoke(&self, method: &str, args: &[Value]) -> ContractResult<Vec<u8>> {
        match self {
            Self::Simulated(ledger) => ledger.invoke(method, args),
            Self::Real(real) => real.invoke(method, args).await,
        }
    }

    /// Whether this caller only ever touches the simulated ledger
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        matches!(self, Self::Simulated(_))
    }
}

impl RealCaller {
    async fn invoke(&self, method: &str, args: &[Value]) -> ContractResult<Vec<u8>> {
        debug!(method, "contract call");

        let Some(meta) = self.metadata else {
            debug!(method, "no contract metadata loaded; simulating");
            return self.ledger.invoke(method, args);
        };

        let descriptor = match meta.resolve(method) {
            Ok(d) => d,
            Err(e) => {
                warn!(method, "{e}; simulating");
                return self.ledger.invoke(method, args);
            }
        };

        if is_read_only(method) {
            return match self.query(&descriptor, args).await {
                Ok(result) => Ok(result),
                Err(e) => {
                    warn!(method, "contract query failed: {e}; simulating");
                    self.ledger.invoke(method, args)
                }
            };
        }

        match self.submit(&descriptor, args).await {
            Ok(()) => extrinsic::synthesized_result(method),
            Err(e) => {
                warn!(method, "transaction path failed: {e}; simulating");
                self.ledger.invoke(method, args)
            }
        }
    }

    /// Read-only path: encode the call and query contract state.
    async fn query(&self, method: &MethodDescriptor, args: &[Value]) -> ContractResult<Vec<u8>> {
        let data = extrinsic::encode_call(method, args)?;
        self.rpc.contract_query(&self.contract, &data).await
    }

    /// Mutating path: encode, sign, submit, and wait for inclusion.
    /// No step is retried; the first failure is terminal for this call.
    async fn submit(&self, method: &MethodDescriptor, args: &[Value]) -> ContractResult<()> {
        let data = extrinsic::encode_call(method, args)?;
        let ext = extrinsic::build_signed(&self.rpc, &self.signer, &data).await?;
        let tx_hash = self.rpc.submit_extrinsic(&ext).await?;
        info!(method = %method.name, tx_hash, "submitted extrinsic");
        extrinsic::wait_for_inclusion(&self.rpc).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_connection_means_simulated() {
        let ledger = Arc::new(SimulatedLedger::new());
        let caller = ContractCaller::new(None, None, "missing.json", ledger);
        assert!(caller.is_simulated());
    }

    #[tokio::test]
    async fn test_simulated_dispatch() {
        let ledger = Arc::new(SimulatedLedger::new());
        let caller = ContractCaller::new(None, None, "missing.json", ledger);

        let result = caller.invoke("get_event_count", &[]).await.unwrap();
        let count: u64 = serde_json::from_slice(&result).unwrap();
        assert_eq!(count, 1);

        let err = caller.invoke("self_destruct", &[json!(1)]).await.unwrap_err();
        assert!(matches!(err, ContractError::UnknownMethod(_)));
    }

    #[test]
    fn test_read_only_allow_list() {
        assert!(is_read_only("get_event"));
        assert!(is_read_only("get_owned_nfts"));
        assert!(!is_read_only("create_event"));
        assert!(!is_read_only("mint_nft"));
    }
}
