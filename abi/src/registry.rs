//! Table-driven payload decoder.
//!
//! An [`OperationRegistry`] maps `(interface, operation ID)` pairs to body
//! layouts. Every described body starts with the 4-byte operation ID and a
//! `u64` query ID, followed by the listed fields, all big-endian:
//!
//! ```toml
//! [[operations]]
//! interface = "jetton_wallet"
//! op_id = 0x0f8a7ea5
//! name = "jetton_transfer"
//! fields = [
//!     { name = "amount", kind = "u64" },
//!     { name = "destination", kind = "address" },
//! ]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tonidx_types::{AccountState, Address, Message, MessagePayload};

use crate::operation::split_op;
use crate::{AbiError, PayloadError, PayloadParser};

const QUERY_ID_LEN: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    U8,
    U16,
    U32,
    U64,
    Hash256,
    /// Signed 4-byte workchain followed by the 32-byte account.
    Address,
}

impl FieldKind {
    pub fn width(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U16 => 2,
            Self::U32 => 4,
            Self::U64 => 8,
            Self::Hash256 => 32,
            Self::Address => 36,
        }
    }

    fn decode(self, bytes: &[u8]) -> Value {
        let mut buf = [0u8; 8];
        match self {
            Self::U8 | Self::U16 | Self::U32 | Self::U64 => {
                buf[8 - bytes.len()..].copy_from_slice(bytes);
                Value::from(u64::from_be_bytes(buf))
            }
            Self::Hash256 => Value::String(hex::encode(bytes)),
            Self::Address => {
                let mut wc = [0u8; 4];
                wc.copy_from_slice(&bytes[..4]);
                let mut account = [0u8; 32];
                account.copy_from_slice(&bytes[4..]);
                Value::String(Address::new(i32::from_be_bytes(wc), account).to_string())
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSchema {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationSchema {
    /// Contract interface the operation belongs to.
    pub interface: String,
    pub op_id: u32,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
}

impl OperationSchema {
    fn body_len(&self) -> usize {
        4 + QUERY_ID_LEN + self.fields.iter().map(|f| f.kind.width()).sum::<usize>()
    }

    /// Decode the body into a JSON object holding `query_id` and every field.
    fn decode(&self, body: &[u8]) -> Result<Value, PayloadError> {
        if body.len() < self.body_len() {
            return Err(PayloadError::Decode(format!(
                "{} body too short: {} < {} bytes",
                self.name,
                body.len(),
                self.body_len()
            )));
        }

        let mut data = Map::new();
        let mut query_id = [0u8; QUERY_ID_LEN];
        query_id.copy_from_slice(&body[4..4 + QUERY_ID_LEN]);
        data.insert("query_id".to_string(), Value::from(u64::from_be_bytes(query_id)));

        let mut offset = 4 + QUERY_ID_LEN;
        for field in &self.fields {
            let end = offset + field.kind.width();
            data.insert(field.name.clone(), field.kind.decode(&body[offset..end]));
            offset = end;
        }
        Ok(Value::Object(data))
    }
}

#[derive(Debug, Default, Deserialize)]
struct RegistryFile {
    #[serde(default)]
    operations: Vec<OperationSchema>,
}

/// Operation schemas indexed by interface and operation ID.
#[derive(Clone, Debug, Default)]
pub struct OperationRegistry {
    schemas: HashMap<(String, u32), OperationSchema>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema. A later schema for the same interface and
    /// operation replaces the earlier one.
    pub fn register(&mut self, schema: OperationSchema) {
        self.schemas
            .insert((schema.interface.clone(), schema.op_id), schema);
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, AbiError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, AbiError> {
        let file: RegistryFile = toml::from_str(s).map_err(|e| AbiError::Registry(e.to_string()))?;
        let mut registry = Self::new();
        for schema in file.operations {
            if schema.name.is_empty() {
                return Err(AbiError::Registry(format!(
                    "operation {:#010x} of {} has no name",
                    schema.op_id, schema.interface
                )));
            }
            registry.register(schema);
        }
        tracing::debug!(operations = registry.len(), "operation registry loaded");
        Ok(registry)
    }

    pub fn find(&self, interfaces: &[String], op_id: u32) -> Option<&OperationSchema> {
        interfaces
            .iter()
            .find_map(|interface| self.schemas.get(&(interface.clone(), op_id)))
    }

    /// First interface of `account` that has any registered operation.
    fn known_interface(&self, account: &AccountState) -> Option<String> {
        account
            .interfaces
            .iter()
            .find(|interface| self.schemas.keys().any(|(known, _)| known == *interface))
            .cloned()
    }
}

impl PayloadParser for OperationRegistry {
    fn parse_message_payload(
        &self,
        src: &AccountState,
        dst: &AccountState,
        msg: &Message,
    ) -> Result<MessagePayload, PayloadError> {
        let (op_id, _) = split_op(&msg.body)
            .ok_or_else(|| PayloadError::NotAvailable("message has no operation".to_string()))?;

        // Bounced bodies come back to the sender and follow its interface.
        let schema = self
            .find(&dst.interfaces, op_id)
            .or_else(|| msg.bounced.then(|| self.find(&src.interfaces, op_id)).flatten())
            .ok_or_else(|| {
                PayloadError::NotAvailable(format!("no schema for operation {op_id:#010x}"))
            })?;

        Ok(MessagePayload {
            tx_hash: msg.tx_hash,
            body_hash: msg.body_hash,
            created_lt: msg.created_lt,
            src_address: msg.src_address,
            dst_address: msg.dst_address,
            src_contract: self.known_interface(src),
            dst_contract: self.known_interface(dst),
            operation_id: op_id,
            operation_name: schema.name.clone(),
            data: schema.decode(&msg.body)?,
        })
    }
}
