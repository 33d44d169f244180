//! Linear memory.

use garnet_types::NativeType;

use crate::errors::{not_evaluable, out_of_bounds, EvalResult};
use crate::value::Value;

pub const PAGE_SIZE: usize = 64 * 1024;

/// Little-endian byte memory of a whole number of pages.
#[derive(Clone, Debug)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    /// `pages` pages with `image` copied in at address 0.
    pub fn new(pages: u32, image: &[u8]) -> Self {
        let size = (pages as usize * PAGE_SIZE).max(image.len());
        let mut bytes = vec![0u8; size];
        bytes[..image.len()].copy_from_slice(image);
        Memory { bytes }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Bytes `[address, address + len)`.
    pub fn read(&self, address: u64, len: usize) -> EvalResult<&[u8]> {
        let range = self.range(address, len)?;
        Ok(&self.bytes[range])
    }

    pub fn write(&mut self, address: u64, data: &[u8]) -> EvalResult<()> {
        let range = self.range(address, data.len())?;
        self.bytes[range].copy_from_slice(data);
        Ok(())
    }

    pub fn load(&self, ty: NativeType, address: u64) -> EvalResult<Value> {
        match ty {
            NativeType::I32 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(self.read(address, 4)?);
                Ok(Value::I32(i32::from_le_bytes(buf)))
            }
            NativeType::I64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(self.read(address, 8)?);
                Ok(Value::I64(i64::from_le_bytes(buf)))
            }
            NativeType::F32 | NativeType::F64 => Err(not_evaluable("floating point loads")),
        }
    }

    /// Store `value` with the width of `ty`; a wider value is wrapped.
    pub fn store(&mut self, ty: NativeType, address: u64, value: Value) -> EvalResult<()> {
        match ty {
            NativeType::I32 => {
                #[expect(clippy::cast_possible_truncation, reason = "i32 wrap-around semantics")]
                let v = value.as_i64() as i32;
                self.write(address, &v.to_le_bytes())
            }
            NativeType::I64 => self.write(address, &value.as_i64().to_le_bytes()),
            NativeType::F32 | NativeType::F64 => Err(not_evaluable("floating point stores")),
        }
    }

    /// NUL-terminated byte string starting at `address`.
    pub fn c_string(&self, address: u64) -> EvalResult<&[u8]> {
        let start = self.range(address, 0)?.start;
        let tail = &self.bytes[start..];
        let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(&tail[..end])
    }

    fn range(&self, address: u64, len: usize) -> EvalResult<std::ops::Range<usize>> {
        let start = usize::try_from(address).ok();
        let end = start.and_then(|s| s.checked_add(len));
        match (start, end) {
            (Some(start), Some(end)) if end <= self.bytes.len() => Ok(start..end),
            _ => Err(out_of_bounds(address, len, self.bytes.len())),
        }
    }
}
