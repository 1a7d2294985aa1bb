//! Contract ABI registry
//!
//! Loads the four ABI JSON files at startup and checks each one declares
//! every function the bot calls. Encoding goes through the `sol!` bindings
//! in [`crate::contracts`]; this is a startup sanity check that the
//! deployment's ABIs match what the bindings assume.
//!
//! Accepts either a bare ABI array or an artifact object with an `abi` key.

use alloy::json_abi::JsonAbi;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AbiError {
    #[error("failed to read ABI file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ABI JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{path} does not declare function {function}")]
    MissingFunction { path: PathBuf, function: String },
}

/// Contracts the bot talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContractKind {
    UniswapQuoter,
    UniswapRouter,
    BalancerVault,
    Erc20,
}

impl ContractKind {
    pub const ALL: [ContractKind; 4] = [
        ContractKind::UniswapQuoter,
        ContractKind::UniswapRouter,
        ContractKind::BalancerVault,
        ContractKind::Erc20,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ContractKind::UniswapQuoter => "uniswap_quoter_abi.json",
            ContractKind::UniswapRouter => "uniswap_router_abi.json",
            ContractKind::BalancerVault => "balancer_vault_abi.json",
            ContractKind::Erc20 => "erc20_abi.json",
        }
    }

    pub fn required_functions(&self) -> &'static [&'static str] {
        match self {
            ContractKind::UniswapQuoter => &["quoteExactInputSingle"],
            ContractKind::UniswapRouter => &["exactInputSingle"],
            ContractKind::BalancerVault => &["getPoolTokens", "queryBatchSwap", "swap"],
            ContractKind::Erc20 => &["approve", "allowance"],
        }
    }
}

#[derive(Debug)]
pub struct AbiRegistry {
    abis: HashMap<ContractKind, JsonAbi>,
}

impl AbiRegistry {
    /// Load and check every ABI under `dir`. Any failure is fatal.
    pub fn load(dir: &Path) -> Result<Self, AbiError> {
        let mut abis = HashMap::new();
        for kind in ContractKind::ALL {
            let path = dir.join(kind.file_name());
            let abi = load_abi(&path)?;

            for function in kind.required_functions() {
                if abi.function(function).map_or(true, |f| f.is_empty()) {
                    return Err(AbiError::MissingFunction {
                        path,
                        function: function.to_string(),
                    });
                }
            }

            abis.insert(kind, abi);
        }

        info!("Loaded {} contract ABIs from {}", abis.len(), dir.display());
        Ok(Self { abis })
    }

    /// Number of functions the loaded ABI declares, zero if not loaded
    pub fn function_count(&self, kind: ContractKind) -> usize {
        self.abis.get(&kind).map_or(0, |abi| abi.functions().count())
    }
}

/// On-disk ABI layout: a bare array, or a compiler artifact carrying one
#[derive(Deserialize)]
#[serde(untagged)]
enum AbiFile {
    Bare(JsonAbi),
    Artifact { abi: JsonAbi },
}

fn load_abi(path: &Path) -> Result<JsonAbi, AbiError> {
    let text = std::fs::read_to_string(path).map_err(|source| AbiError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    match serde_json::from_str(&text) {
        Ok(AbiFile::Bare(abi)) | Ok(AbiFile::Artifact { abi }) => Ok(abi),
        Err(source) => Err(AbiError::Malformed {
            path: path.to_path_buf(),
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn function(name: &str) -> serde_json::Value {
        json!({
            "type": "function",
            "name": name,
            "inputs": [],
            "outputs": [],
            "stateMutability": "view"
        })
    }

    fn write_abi(dir: &Path, kind: ContractKind, functions: &[&str]) {
        let abi: Vec<_> = functions.iter().map(|f| function(f)).collect();
        std::fs::write(
            dir.join(kind.file_name()),
            serde_json::to_string(&abi).unwrap(),
        )
        .unwrap();
    }

    fn write_all(dir: &Path) {
        for kind in ContractKind::ALL {
            write_abi(dir, kind, kind.required_functions());
        }
    }

    #[test]
    fn test_load_complete_directory() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());

        let registry = AbiRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.function_count(ContractKind::BalancerVault), 3);
        assert_eq!(registry.function_count(ContractKind::Erc20), 2);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        std::fs::remove_file(dir.path().join("erc20_abi.json")).unwrap();

        let err = AbiRegistry::load(dir.path()).unwrap_err();
        assert!(matches!(err, AbiError::Read { .. }));
        assert!(err.to_string().contains("erc20_abi.json"));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        std::fs::write(dir.path().join("uniswap_router_abi.json"), "{ not json").unwrap();

        assert!(matches!(
            AbiRegistry::load(dir.path()),
            Err(AbiError::Malformed { .. })
        ));
    }

    #[test]
    fn test_missing_function() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        write_abi(dir.path(), ContractKind::BalancerVault, &["getPoolTokens", "swap"]);

        match AbiRegistry::load(dir.path()) {
            Err(AbiError::MissingFunction { function, .. }) => assert_eq!(function, "queryBatchSwap"),
            other => panic!("expected missing function, got {:?}", other),
        }
    }

    #[test]
    fn test_artifact_object_accepted() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        let artifact = json!({ "contractName": "IERC20", "abi": [function("approve"), function("allowance")] });
        std::fs::write(dir.path().join("erc20_abi.json"), artifact.to_string()).unwrap();

        let registry = AbiRegistry::load(dir.path()).unwrap();
        assert_eq!(registry.function_count(ContractKind::Erc20), 2);
    }

    #[test]
    fn test_artifact_without_abi_key_is_malformed() {
        let dir = tempfile::tempdir().unwrap();
        write_all(dir.path());
        let artifact = json!({ "contractName": "IERC20", "bytecode": "0x" });
        std::fs::write(dir.path().join("erc20_abi.json"), artifact.to_string()).unwrap();

        assert!(matches!(
            AbiRegistry::load(dir.path()),
            Err(AbiError::Malformed { .. })
        ));
    }

    #[test]
    fn test_shipped_abis_are_complete() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("abis");
        AbiRegistry::load(&dir).unwrap();
    }
}
