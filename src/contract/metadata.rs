//! ink! contract metadata: loading, caching, and method resolution.
//!
//! The metadata file describes the deployed contract's constructors,
//! messages, and events, each with a label, a hex selector, and typed
//! arguments. It is read once per process and cached: the on-chain
//! shape of a deployed contract does not change within a process
//! lifetime.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{ContractError, ContractResult};

/// Default metadata file name produced by the contract build.
pub const DEFAULT_METADATA_FILE: &str = "attendance_nft.json";

/// Compiler/source information from the metadata header.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Code hash
    #[serde(default)]
    pub hash: Option<String>,
    /// Source language, e.g. "ink! 3.4.0"
    #[serde(default)]
    pub language: Option<String>,
    /// Compiler, e.g. "rustc 1.68.0"
    #[serde(default)]
    pub compiler: Option<String>,
}

/// Contract identity from the metadata header.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ContractInfo {
    /// Contract name
    #[serde(default)]
    pub name: Option<String>,
    /// Contract version
    #[serde(default)]
    pub version: Option<String>,
    /// Authors
    #[serde(default)]
    pub authors: Vec<String>,
}

/// A type reference as the metadata displays it.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TypeRef {
    /// Display name path, e.g. `["u64"]` or `["Option"]`
    #[serde(default, rename = "displayName")]
    pub display_name: Vec<String>,
    /// Registry type id
    #[serde(default, rename = "type")]
    pub type_id: i64,
}

impl TypeRef {
    /// First display-name segment, or empty
    #[must_use]
    pub fn display(&self) -> &str {
        self.display_name.first().map_or("", String::as_str)
    }
}

/// An argument of a constructor, message, or event.
#[derive(Clone, Debug, Deserialize)]
pub struct ArgSpec {
    /// Argument label ("name" in the legacy layout)
    #[serde(alias = "name")]
    pub label: String,
    /// Declared type
    #[serde(rename = "type", default)]
    pub ty: TypeRef,
    /// Whether an event argument is indexed (events only)
    #[serde(default)]
    pub indexed: bool,
}

/// A callable contract message.
#[derive(Clone, Debug, Deserialize)]
pub struct MessageSpec {
    /// Message label ("name" in the legacy layout)
    #[serde(alias = "name")]
    pub label: String,
    /// 4-byte selector as a hex string
    pub selector: String,
    /// Whether the message mutates contract state
    #[serde(default)]
    pub mutates: bool,
    /// Whether the message accepts a value transfer
    #[serde(default)]
    pub payable: bool,
    /// Ordered arguments
    #[serde(default)]
    pub args: Vec<ArgSpec>,
    /// Return type, if any
    #[serde(default, rename = "returnType")]
    pub return_type: Option<TypeRef>,
}

/// A contract constructor (no return type).
#[derive(Clone, Debug, Deserialize)]
pub struct ConstructorSpec {
    /// Constructor label ("name" in the legacy layout)
    #[serde(alias = "name")]
    pub label: String,
    /// 4-byte selector as a hex string
    pub selector: String,
    /// Ordered arguments
    #[serde(default)]
    pub args: Vec<ArgSpec>,
}

/// An event the contract can emit.
#[derive(Clone, Debug, Deserialize)]
pub struct EventSpec {
    /// Event label ("name" in the legacy layout)
    #[serde(alias = "name")]
    pub label: String,
    /// Ordered arguments; these carry `indexed` instead of `mutates`
    #[serde(default)]
    pub args: Vec<ArgSpec>,
}

/// The spec section: everything callable or observable.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ContractSpec {
    /// Constructors
    #[serde(default)]
    pub constructors: Vec<ConstructorSpec>,
    /// Callable messages
    #[serde(default)]
    pub messages: Vec<MessageSpec>,
    /// Events
    #[serde(default)]
    pub events: Vec<EventSpec>,
}

/// Parsed contract metadata.
#[derive(Clone, Debug)]
pub struct ContractMetadata {
    /// Compiler/source header
    pub source: SourceInfo,
    /// Contract identity header
    pub contract: ContractInfo,
    /// Constructors, messages, events
    pub spec: ContractSpec,
}

/// A resolved method: what the caller needs to route and encode a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MethodDescriptor {
    /// Canonical label from the metadata
    pub name: String,
    /// Hex selector
    pub selector: String,
    /// Whether the method mutates contract state
    pub mutates: bool,
}

impl ContractMetadata {
    /// Load metadata from a file, probing fallback locations.
    ///
    /// # Errors
    /// `NotFound` if no candidate path yields a file, `Parse` if the
    /// content is not valid metadata
    pub fn load(path: impl AsRef<Path>) -> ContractResult<Self> {
        let data = read_with_fallbacks(path.as_ref())?;
        Self::parse(&data)
    }

    /// Parse metadata bytes.
    ///
    /// Both metadata layouts are accepted: the modern one with `spec` at
    /// the top level and `label` fields, and the legacy one nesting the
    /// spec under `V1` with `name` fields.
    ///
    /// # Errors
    /// `Parse` if the bytes are not valid JSON or violate the schema
    pub fn parse(data: &[u8]) -> ContractResult<Self> {
        let value: serde_json::Value = serde_json::from_slice(data)
            .map_err(|e| ContractError::Parse(format!("invalid metadata JSON: {e}")))?;

        let spec_value = value
            .get("spec")
            .or_else(|| value.get("V1").and_then(|v| v.get("spec")))
            .cloned()
            .ok_or_else(|| ContractError::Parse("metadata has no spec section".to_string()))?;
        let spec: ContractSpec = serde_json::from_value(spec_value)
            .map_err(|e| ContractError::Parse(format!("malformed contract spec: {e}")))?;

        let source = section(&value, "source")?;
        let contract = section(&value, "contract")?;

        Ok(Self {
            source,
            contract,
            spec,
        })
    }

    /// Resolve a logical method name against the callable messages.
    ///
    /// Matching is case-insensitive and exact; constructors and events
    /// are not callable. First match wins.
    ///
    /// # Errors
    /// `NotFound` if no message carries the label
    pub fn resolve(&self, name: &str) -> ContractResult<MethodDescriptor> {
        self.spec
            .messages
            .iter()
            .find(|m| m.label.eq_ignore_ascii_case(name))
            .map(|m| MethodDescriptor {
                name: m.label.clone(),
                selector: m.selector.clone(),
                mutates: m.mutates,
            })
            .ok_or_else(|| {
                ContractError::NotFound(format!("method not in contract metadata: {name}"))
            })
    }

    /// Callable messages
    #[must_use]
    pub fn messages(&self) -> &[MessageSpec] {
        &self.spec.messages
    }

    /// Reduce to the dump-friendly view: constructors and methods with
    /// just names, selectors, mutability, and argument types.
    #[must_use]
    pub fn simplified(&self) -> SimplifiedMetadata {
        let reduce_args = |args: &[ArgSpec]| {
            args.iter()
                .map(|a| SimplifiedArg {
                    label: a.label.clone(),
                    ty: a.ty.display().to_string(),
                })
                .collect()
        };

        SimplifiedMetadata {
            source: self.source.clone(),
            constructors: self
                .spec
                .constructors
                .iter()
                .map(|c| SimplifiedMethod {
                    name: c.label.clone(),
                    selector: c.selector.clone(),
                    mutates: false,
                    args: reduce_args(&c.args),
                })
                .collect(),
            methods: self
                .spec
                .messages
                .iter()
                .map(|m| SimplifiedMethod {
                    name: m.label.clone(),
                    selector: m.selector.clone(),
                    mutates: m.mutates,
                    args: reduce_args(&m.args),
                })
                .collect(),
        }
    }
}

fn section<T: Default + serde::de::DeserializeOwned>(
    value: &serde_json::Value,
    key: &str,
) -> ContractResult<T> {
    match value.get(key) {
        Some(v) => serde_json::from_value(v.clone())
            .map_err(|e| ContractError::Parse(format!("malformed {key} section: {e}"))),
        None => Ok(T::default()),
    }
}

/// Simplified metadata for the `metadata-dump` tool.
#[derive(Debug, Serialize)]
pub struct SimplifiedMetadata {
    /// Compiler/source header
    pub source: SourceInfo,
    /// Constructors
    pub constructors: Vec<SimplifiedMethod>,
    /// Callable methods
    pub methods: Vec<SimplifiedMethod>,
}

/// One entry of the simplified dump.
#[derive(Debug, Serialize)]
pub struct SimplifiedMethod {
    /// Method name
    pub name: String,
    /// Hex selector
    pub selector: String,
    /// Mutability flag
    pub mutates: bool,
    /// Argument labels and display types
    pub args: Vec<SimplifiedArg>,
}

/// One argument of the simplified dump.
#[derive(Debug, Serialize)]
pub struct SimplifiedArg {
    /// Argument label
    pub label: String,
    /// First display-name segment of the declared type
    #[serde(rename = "type")]
    pub ty: String,
}

static METADATA_CACHE: OnceLock<ContractMetadata> = OnceLock::new();

/// Load metadata once per process; later calls return the cached copy
/// without touching the filesystem.
///
/// # Errors
/// Same as [`ContractMetadata::load`]; failures are not cached, so a
/// later call can still succeed once the file appears.
pub fn load_cached(path: &str) -> ContractResult<&'static ContractMetadata> {
    if let Some(meta) = METADATA_CACHE.get() {
        return Ok(meta);
    }
    let meta = ContractMetadata::load(path)?;
    Ok(METADATA_CACHE.get_or_init(|| meta))
}

/// Read the metadata file, probing the contract build output
/// directories one and two levels up, then any JSON file found there.
fn read_with_fallbacks(path: &Path) -> ContractResult<Vec<u8>> {
    if let Ok(data) = fs::read(path) {
        debug!(path = %path.display(), "loaded contract metadata");
        return Ok(data);
    }

    let file_name = path
        .file_name()
        .map_or_else(|| PathBuf::from(DEFAULT_METADATA_FILE), PathBuf::from);

    let candidate_dirs = [
        Path::new("..").join("contracts").join("target").join("ink"),
        Path::new("..")
            .join("..")
            .join("contracts")
            .join("target")
            .join("ink"),
    ];

    for dir in &candidate_dirs {
        let candidate = dir.join(&file_name);
        if let Ok(data) = fs::read(&candidate) {
            info!(path = %candidate.display(), "found contract metadata");
            return Ok(data);
        }
    }

    for dir in &candidate_dirs {
        if let Some(found) = first_json_in(dir) {
            if let Ok(data) = fs::read(&found) {
                info!(path = %found.display(), "found contract metadata");
                return Ok(data);
            }
        }
    }

    Err(ContractError::NotFound(format!(
        "contract metadata file not found: {}",
        path.display()
    )))
}

fn first_json_in(dir: &Path) -> Option<PathBuf> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .ok()?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();
    paths.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODERN: &str = r#"{
        "source": {"hash": "0xabc", "language": "ink! 3.4.0", "compiler": "rustc 1.68.0"},
        "contract": {"name": "attendance_nft", "version": "0.1.0", "authors": ["dev"]},
        "spec": {
            "constructors": [
                {"label": "new", "selector": "0x9bae9d5e", "args": []}
            ],
            "messages": [
                {
                    "label": "create_event",
                    "selector": "0xa1b2c3d4",
                    "mutates": true,
                    "args": [
                        {"label": "name", "type": {"displayName": ["String"], "type": 1}},
                        {"label": "date", "type": {"displayName": ["String"], "type": 1}},
                        {"label": "location", "type": {"displayName": ["String"], "type": 1}}
                    ],
                    "returnType": {"displayName": ["u64"], "type": 2}
                },
                {
                    "label": "get_event",
                    "selector": "0x11223344",
                    "mutates": false,
                    "args": [{"label": "id", "type": {"displayName": ["u64"], "type": 2}}]
                }
            ],
            "events": [
                {
                    "label": "Mint",
                    "args": [{"label": "to", "indexed": true, "type": {"displayName": ["AccountId"], "type": 3}}]
                }
            ]
        }
    }"#;

    const LEGACY: &str = r#"{
        "V1": {
            "spec": {
                "constructors": [],
                "messages": [
                    {"name": "mint_nft", "selector": "0x55667788", "mutates": true, "args": []}
                ],
                "events": []
            }
        }
    }"#;

    #[test]
    fn test_parse_modern_layout() {
        let meta = ContractMetadata::parse(MODERN.as_bytes()).unwrap();
        assert_eq!(meta.spec.messages.len(), 2);
        assert_eq!(meta.spec.constructors.len(), 1);
        assert_eq!(meta.spec.events.len(), 1);
        assert!(meta.spec.events[0].args[0].indexed);
        assert_eq!(meta.contract.name.as_deref(), Some("attendance_nft"));

        let create = &meta.spec.messages[0];
        assert!(create.mutates);
        assert_eq!(create.args.len(), 3);
        assert_eq!(create.args[0].ty.display(), "String");
        assert_eq!(create.return_type.as_ref().unwrap().display(), "u64");
    }

    #[test]
    fn test_parse_legacy_layout() {
        let meta = ContractMetadata::parse(LEGACY.as_bytes()).unwrap();
        let descriptor = meta.resolve("mint_nft").unwrap();
        assert_eq!(descriptor.selector, "0x55667788");
        assert!(descriptor.mutates);
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        let meta = ContractMetadata::parse(MODERN.as_bytes()).unwrap();
        let descriptor = meta.resolve("Create_Event").unwrap();
        assert_eq!(descriptor.name, "create_event");
        assert_eq!(descriptor.selector, "0xa1b2c3d4");
    }

    #[test]
    fn test_resolve_ignores_constructors_and_events() {
        let meta = ContractMetadata::parse(MODERN.as_bytes()).unwrap();
        assert!(matches!(meta.resolve("new"), Err(ContractError::NotFound(_))));
        assert!(matches!(meta.resolve("Mint"), Err(ContractError::NotFound(_))));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            ContractMetadata::parse(b"not json"),
            Err(ContractError::Parse(_))
        ));
        assert!(matches!(
            ContractMetadata::parse(b"{\"no_spec\": true}"),
            Err(ContractError::Parse(_))
        ));
    }

    #[test]
    fn test_simplified_dump() {
        let meta = ContractMetadata::parse(MODERN.as_bytes()).unwrap();
        let simplified = meta.simplified();
        assert_eq!(simplified.constructors.len(), 1);
        assert_eq!(simplified.methods.len(), 2);
        assert_eq!(simplified.methods[0].name, "create_event");
        assert_eq!(simplified.methods[0].args[1].label, "date");
        assert_eq!(simplified.methods[0].args[1].ty, "String");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let err = ContractMetadata::load("definitely_missing_metadata.json").unwrap_err();
        assert!(matches!(err, ContractError::NotFound(_)));
    }
}
