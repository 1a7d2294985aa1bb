//! In-memory chain for tests.
//!
//! Behaves like a node for the pieces this bot uses: a pending-nonce counter
//! that only advances on accepted submissions, canned `eth_call` responses
//! keyed by function selector, and a log of every accepted intent.

use super::{ChainClient, ChainError};
use crate::execution::TxError;
use crate::types::{TransactionIntent, TransactionResult};
use alloy::primitives::{keccak256, Address, Bytes};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

type Selector = [u8; 4];

pub(crate) struct MockChain {
    sender: Address,
    base_gas_price: Mutex<u128>,
    pending_nonce: Mutex<u64>,
    responses: Mutex<HashMap<(Address, Selector), Result<Bytes, ChainError>>>,
    rejected_targets: Mutex<HashSet<Address>>,
    submitted: Mutex<Vec<TransactionIntent>>,
    reachable: bool,
}

impl MockChain {
    pub(crate) fn new(sender: Address) -> Self {
        Self {
            sender,
            base_gas_price: Mutex::new(10_000_000_000),
            pending_nonce: Mutex::new(0),
            responses: Mutex::new(HashMap::new()),
            rejected_targets: Mutex::new(HashSet::new()),
            submitted: Mutex::new(Vec::new()),
            reachable: true,
        }
    }

    pub(crate) fn unreachable(sender: Address) -> Self {
        Self {
            reachable: false,
            ..Self::new(sender)
        }
    }

    pub(crate) fn set_gas_price(&self, wei: u128) {
        *self.base_gas_price.lock().unwrap() = wei;
    }

    pub(crate) fn set_pending_nonce(&self, nonce: u64) {
        *self.pending_nonce.lock().unwrap() = nonce;
    }

    /// Answer calls to `to` with this selector using raw ABI-encoded return data
    pub(crate) fn respond(&self, to: Address, selector: Selector, data: Vec<u8>) {
        self.responses
            .lock()
            .unwrap()
            .insert((to, selector), Ok(Bytes::from(data)));
    }

    /// Make calls to `to` with this selector revert
    pub(crate) fn revert(&self, to: Address, selector: Selector) {
        self.responses.lock().unwrap().insert(
            (to, selector),
            Err(ChainError::Transport("execution reverted".to_string())),
        );
    }

    /// Reject every submission targeting `to`
    pub(crate) fn reject_submissions_to(&self, to: Address) {
        self.rejected_targets.lock().unwrap().insert(to);
    }

    pub(crate) fn submitted(&self) -> Vec<TransactionIntent> {
        self.submitted.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn check_connectivity(&self) -> Result<u64, ChainError> {
        if self.reachable {
            Ok(1)
        } else {
            Err(ChainError::Unreachable("connection refused".to_string()))
        }
    }

    async fn gas_price(&self) -> Result<u128, ChainError> {
        match *self.base_gas_price.lock().unwrap() {
            0 => Err(ChainError::ZeroGasPrice),
            wei => Ok(wei),
        }
    }

    async fn nonce(&self, _account: Address) -> Result<u64, ChainError> {
        Ok(*self.pending_nonce.lock().unwrap())
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        if data.len() < 4 {
            return Err(ChainError::Transport("empty calldata".to_string()));
        }
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&data[..4]);
        self.responses
            .lock()
            .unwrap()
            .get(&(to, selector))
            .cloned()
            .unwrap_or_else(|| Err(ChainError::Transport("execution reverted".to_string())))
    }

    async fn submit(&self, intent: &TransactionIntent) -> TransactionResult {
        if self.rejected_targets.lock().unwrap().contains(&intent.to) {
            return TransactionResult::Failed(TxError::from_rejection(
                "insufficient funds for gas * price + value".to_string(),
            ));
        }

        let mut pending = self.pending_nonce.lock().unwrap();
        if intent.nonce != *pending {
            return TransactionResult::Failed(TxError::from_rejection(format!(
                "nonce too low: next nonce {}, tx nonce {}",
                *pending, intent.nonce
            )));
        }
        *pending += 1;

        self.submitted.lock().unwrap().push(intent.clone());
        TransactionResult::Submitted(keccak256(intent.nonce.to_be_bytes()))
    }
}
