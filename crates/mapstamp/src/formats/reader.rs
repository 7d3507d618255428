use super::DecodeError;

/// Little-endian cursor over an asset buffer. Every failure carries the asset
/// path and the offset of the read that failed.
pub(crate) struct ByteReader<'a> {
    bytes: &'a [u8],
    cursor: usize,
    path: &'a str,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(path: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cursor: 0,
            path,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.cursor
    }

    pub(crate) fn seek(&mut self, offset: usize) -> Result<(), DecodeError> {
        if offset > self.bytes.len() {
            return Err(self.error_at(
                offset,
                format!("seek past end of file (len {})", self.bytes.len()),
            ));
        }
        self.cursor = offset;
        Ok(())
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.read_exact(len).map(|_| ())
    }

    pub(crate) fn read_exact(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        let end = self.cursor.saturating_add(len);
        if end > self.bytes.len() {
            return Err(self.error(format!(
                "unexpected end of file reading {len} bytes ({} left)",
                self.remaining()
            )));
        }
        let out = &self.bytes[self.cursor..end];
        self.cursor = end;
        Ok(out)
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let offset = self.cursor;
        self.read_exact(N)?
            .try_into()
            .map_err(|_| self.error_at(offset, format!("invalid {N}-byte field")))
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, DecodeError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub(crate) fn read_i16(&mut self) -> Result<i16, DecodeError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, DecodeError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32, DecodeError> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, DecodeError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    /// Reads an `i32` that must be a non-negative count or offset.
    pub(crate) fn read_len(&mut self, what: &str) -> Result<usize, DecodeError> {
        let offset = self.cursor;
        let value = self.read_i32()?;
        usize::try_from(value)
            .map_err(|_| self.error_at(offset, format!("negative {what} ({value})")))
    }

    pub(crate) fn read_cstring(&mut self) -> Result<String, DecodeError> {
        let start = self.cursor;
        let Some(nul) = self.bytes[start..].iter().position(|byte| *byte == 0) else {
            return Err(self.error("unterminated string"));
        };
        let raw = &self.bytes[start..start + nul];
        self.cursor = start + nul + 1;
        std::str::from_utf8(raw)
            .map(str::to_string)
            .map_err(|_| self.error_at(start, "invalid UTF-8 string".to_string()))
    }

    pub(crate) fn error(&self, message: impl Into<String>) -> DecodeError {
        self.error_at(self.cursor, message)
    }

    pub(crate) fn error_at(&self, offset: usize, message: impl Into<String>) -> DecodeError {
        DecodeError {
            path: self.path.to_string(),
            offset,
            message: message.into(),
        }
    }
}
