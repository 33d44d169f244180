//! Static data segment allocation.
//!
//! A single bump cursor hands out addresses in the module's initial
//! memory. Labels name runs of values: the first write to a label places
//! it, later appends extend it. The cursor only moves forward.

use std::fmt::Write;

use rustc_hash::FxHashMap;

use garnet_diagnostic::{Diagnostic, ErrorCode};
use garnet_ir::Span;
use garnet_types::NativeType;

/// A value placed in the data segment.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum DataValue {
    Int { ty: NativeType, value: i64 },
    Bytes(Vec<u8>),
}

impl DataValue {
    pub fn size(&self) -> u32 {
        match self {
            DataValue::Int { ty, .. } => ty.size(),
            DataValue::Bytes(bytes) => u32::try_from(bytes.len()).unwrap_or(u32::MAX),
        }
    }

    /// Little-endian memory image.
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            DataValue::Int { ty, value } => {
                let size = ty.size() as usize;
                value.to_le_bytes()[..size].to_vec()
            }
            DataValue::Bytes(bytes) => bytes.clone(),
        }
    }
}

/// One placed value.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct DataEntry {
    pub label: String,
    pub address: u32,
    pub value: DataValue,
}

/// Bump allocator for the static data segment.
#[derive(Clone, Debug)]
pub struct DataAllocator {
    address: u32,
    entries: Vec<DataEntry>,
    labels: FxHashMap<String, u32>,
}

impl DataAllocator {
    pub fn new(base: u32) -> Self {
        DataAllocator {
            address: base,
            entries: Vec::new(),
            labels: FxHashMap::default(),
        }
    }

    /// Current cursor (next free address).
    #[inline]
    pub fn address(&self) -> u32 {
        self.address
    }

    /// Address of the first value stored under `label`.
    pub fn label_address(&self, label: &str) -> Option<u32> {
        self.labels.get(label).copied()
    }

    /// Place `value` under a new label.
    pub fn declare(
        &mut self,
        label: &str,
        value: DataValue,
        span: Span,
    ) -> Result<u32, Diagnostic> {
        if let Some(existing) = self.labels.get(label) {
            return Err(Diagnostic::error(ErrorCode::E4003)
                .with_message(format!(
                    "data label `{label}` already declared at address {existing}"
                ))
                .with_label(span, "redeclared here")
                .with_suggestion(format!("use `DAta.append(:{label}, ...)` to extend it")));
        }
        Ok(self.place(label, value))
    }

    /// Place `value` after everything else, under `label`. Creates the label
    /// if it does not exist yet. Returns the value's own address.
    pub fn append(&mut self, label: &str, value: DataValue) -> u32 {
        self.place(label, value)
    }

    /// Move the cursor to `address`. Moving backward is an error.
    pub fn set_address(&mut self, address: u32, span: Span) -> Result<(), Diagnostic> {
        if address < self.address {
            return Err(Diagnostic::error(ErrorCode::E4004)
                .with_message(format!(
                    "cannot move data address back from {} to {address}",
                    self.address
                ))
                .with_label(span, "address already in use"));
        }
        tracing::trace!(from = self.address, to = address, "data address set");
        self.address = address;
        Ok(())
    }

    /// Round the cursor up to a multiple of `n` (`n == 0` is a no-op).
    pub fn align(&mut self, n: u32) -> u32 {
        if n > 1 {
            self.address = self.address.div_ceil(n).saturating_mul(n);
        }
        self.address
    }

    /// Placed values in ascending address order.
    pub fn entries(&self) -> Vec<&DataEntry> {
        let mut entries: Vec<&DataEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| e.address);
        entries
    }

    /// The initial memory image: every placed value copied into a buffer
    /// spanning address 0 to the cursor.
    pub fn image(&self) -> Vec<u8> {
        let mut memory = vec![0u8; self.address as usize];
        for entry in &self.entries {
            let start = entry.address as usize;
            let bytes = entry.value.to_bytes();
            if let Some(slot) = memory.get_mut(start..start + bytes.len()) {
                slot.copy_from_slice(&bytes);
            }
        }
        memory
    }

    fn place(&mut self, label: &str, value: DataValue) -> u32 {
        let address = self.address;
        self.address = self.address.saturating_add(value.size());
        self.labels.entry(label.to_string()).or_insert(address);
        tracing::debug!(label, address, size = value.size(), "data placed");
        self.entries.push(DataEntry {
            label: label.to_string(),
            address,
            value,
        });
        address
    }
}

impl Default for DataAllocator {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Escape bytes for a data string literal.
pub fn escape_bytes(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for &b in bytes {
        match b {
            b'"' | b'\\' => {
                let _ = write!(out, "\\{b:02x}");
            }
            0x20..=0x7e => out.push(char::from(b)),
            _ => {
                let _ = write!(out, "\\{b:02x}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests;
