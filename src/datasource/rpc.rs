//! Ethereum JSON-RPC chain reader (`eth_call`).

use super::{ChainReader, DataSourceError};
use crate::domain::{Address, Operation, RawValue, ReadKey};
use async_trait::async_trait;
use backoff::future::retry;
use backoff::ExponentialBackoff;
use num_bigint::BigUint;
use reqwest::Client;
use serde::Deserialize;
use sha3::{Digest, Keccak256};
use std::time::Duration;
use tracing::debug;

/// `getRegisteredDerivatives(address)` on the registry returns `(address,address)[]`
/// holding (derivativeAddress, derivativeCreator) pairs.
const REGISTRY_SIGNATURE: &str = "getRegisteredDerivatives(address)";

/// ABI word size in bytes.
const WORD: usize = 32;

/// Chain reader backed by a JSON-RPC node.
#[derive(Debug, Clone)]
pub struct RpcChainReader {
    client: Client,
    rpc_url: String,
    registry: Address,
}

impl RpcChainReader {
    pub fn new(rpc_url: String, registry: Address) -> Self {
        Self {
            client: Client::new(),
            rpc_url,
            registry,
        }
    }

    async fn eth_call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>, DataSourceError> {
        let payload = serde_json::json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [{
                "to": to.as_str(),
                "data": format!("0x{}", hex::encode(&data)),
            }, "latest"],
            "id": 1
        });
        let backoff = ExponentialBackoff {
            max_elapsed_time: Some(Duration::from_secs(30)),
            ..Default::default()
        };

        let response: RpcResponse = retry(backoff, || async {
            let response = self
                .client
                .post(&self.rpc_url)
                .json(&payload)
                .send()
                .await
                .map_err(|e| {
                    backoff::Error::transient(DataSourceError::NetworkError(e.to_string()))
                })?;

            let status = response.status();
            if status == 429 {
                return Err(backoff::Error::transient(DataSourceError::RateLimited));
            }
            if status.is_server_error() {
                return Err(backoff::Error::transient(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Server error".to_string(),
                }));
            }
            if !status.is_success() {
                return Err(backoff::Error::permanent(DataSourceError::HttpError {
                    status: status.as_u16(),
                    message: "Client error".to_string(),
                }));
            }

            response
                .json::<RpcResponse>()
                .await
                .map_err(|e| backoff::Error::permanent(DataSourceError::ParseError(e.to_string())))
        })
        .await?;

        if let Some(error) = response.error {
            return Err(DataSourceError::RpcError {
                code: error.code,
                message: error.message,
            });
        }
        let result = response
            .result
            .ok_or_else(|| DataSourceError::ParseError("No result in RPC response".to_string()))?;
        let digits = result.strip_prefix("0x").unwrap_or(&result);
        hex::decode(digits).map_err(|e| DataSourceError::ParseError(e.to_string()))
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn registered_sources(&self, account: &Address) -> Result<Vec<Address>, DataSourceError> {
        debug!("Fetching registered sources for account={}", account);
        let data = encode_call(REGISTRY_SIGNATURE, std::slice::from_ref(account))?;
        let output = self.eth_call(&self.registry, data).await?;
        decode_registered_sources(&output)
    }

    async fn read(&self, key: &ReadKey) -> Result<RawValue, DataSourceError> {
        debug!("Reading {}", key);
        let data = encode_call(key.operation.signature(), &key.args)?;
        let output = self.eth_call(&key.source, data).await?;
        match key.operation {
            Operation::Name => decode_string(&output),
            Operation::TotalSupply | Operation::BalanceOf => decode_uint(&output),
        }
    }
}

/// JSON-RPC response structure.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// First four bytes of keccak256(signature).
pub fn selector(signature: &str) -> [u8; 4] {
    let mut hasher = Keccak256::new();
    hasher.update(signature.as_bytes());
    let hash = hasher.finalize();
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Build calldata for a function whose arguments are all addresses.
fn encode_call(signature: &str, args: &[Address]) -> Result<Vec<u8>, DataSourceError> {
    let mut data = Vec::with_capacity(4 + args.len() * WORD);
    data.extend_from_slice(&selector(signature));
    for arg in args {
        let bytes = arg
            .to_bytes()
            .map_err(|e| DataSourceError::Other(e.to_string()))?;
        // left-pad to a full word
        data.extend_from_slice(&[0u8; 12]);
        data.extend_from_slice(&bytes);
    }
    Ok(data)
}

fn word(data: &[u8], index: usize) -> Result<&[u8], DataSourceError> {
    data.get(index * WORD..(index + 1) * WORD).ok_or_else(|| {
        DataSourceError::ParseError(format!("ABI payload too short for word {}", index))
    })
}

fn word_as_usize(data: &[u8], index: usize) -> Result<usize, DataSourceError> {
    let w = word(data, index)?;
    if w[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(DataSourceError::ParseError("ABI offset out of range".to_string()));
    }
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&w[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(tail))
        .map_err(|_| DataSourceError::ParseError("ABI offset out of range".to_string()))
}

/// Decode a `uint256` return into base-10 digits; an empty return becomes Null.
pub fn decode_uint(data: &[u8]) -> Result<RawValue, DataSourceError> {
    if data.is_empty() {
        return Ok(RawValue::Null);
    }
    let w = word(data, 0)?;
    Ok(RawValue::Uint(BigUint::from_bytes_be(w).to_string()))
}

/// Decode a dynamic `string` return; an empty return becomes Null.
pub fn decode_string(data: &[u8]) -> Result<RawValue, DataSourceError> {
    if data.is_empty() {
        return Ok(RawValue::Null);
    }
    let offset = word_as_usize(data, 0)?;
    let body = data
        .get(offset..)
        .ok_or_else(|| DataSourceError::ParseError("string offset out of range".to_string()))?;
    let len = word_as_usize(body, 0)?;
    let bytes = body
        .get(WORD..WORD + len)
        .ok_or_else(|| DataSourceError::ParseError("string length out of range".to_string()))?;
    String::from_utf8(bytes.to_vec())
        .map(RawValue::Text)
        .map_err(|e| DataSourceError::ParseError(e.to_string()))
}

/// Decode `(address,address)[]`, keeping the first address of each tuple.
pub fn decode_registered_sources(data: &[u8]) -> Result<Vec<Address>, DataSourceError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let offset = word_as_usize(data, 0)?;
    let body = data
        .get(offset..)
        .ok_or_else(|| DataSourceError::ParseError("array offset out of range".to_string()))?;
    let count = word_as_usize(body, 0)?;
    let mut sources = Vec::with_capacity(count);
    for i in 0..count {
        // each tuple is two static words following the length word
        let w = word(body, 1 + i * 2)?;
        sources.push(Address::new(format!("0x{}", hex::encode(&w[12..]))));
    }
    Ok(sources)
}
