use std::fmt;
use std::ops;

use bstr::BStr;

/// An immutable, length bounded region of bytes.
///
/// Chunks are what an upstream transport hands to a
/// [`LineDecoder`](crate::LineDecoder). The backing storage may be larger
/// than the region: only the first `limit` bytes are visible, which lets a
/// pooled buffer be handed over without copying or shrinking it. Dropping
/// the chunk releases the storage.
///
/// A `LineDecoder` accepts anything that is `AsRef<[u8]>`, so plain
/// `Vec<u8>` or `&[u8]` work just as well as `ByteChunk`.
#[derive(Clone, Eq, PartialEq)]
pub struct ByteChunk {
    bytes: Box<[u8]>,
    limit: usize,
}

impl ByteChunk {
    /// Wrap `bytes`, exposing only its first `limit` bytes.
    ///
    /// If `limit` exceeds the length of `bytes`, then the whole of `bytes` is
    /// exposed.
    pub fn wrap<B: Into<Box<[u8]>>>(bytes: B, limit: usize) -> ByteChunk {
        let bytes = bytes.into();
        let limit = limit.min(bytes.len());
        ByteChunk { bytes, limit }
    }

    /// Returns the visible bytes of this chunk.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.limit]
    }

    /// Returns the number of visible bytes.
    pub fn len(&self) -> usize {
        self.limit
    }

    /// Returns true if and only if no bytes are visible.
    pub fn is_empty(&self) -> bool {
        self.limit == 0
    }

    /// Returns the size of the backing storage.
    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    /// Give back the backing storage, e.g., to return it to a pool.
    pub fn into_inner(self) -> Box<[u8]> {
        self.bytes
    }
}

impl From<Vec<u8>> for ByteChunk {
    fn from(bytes: Vec<u8>) -> ByteChunk {
        let limit = bytes.len();
        ByteChunk::wrap(bytes, limit)
    }
}

impl<'a> From<&'a [u8]> for ByteChunk {
    fn from(bytes: &'a [u8]) -> ByteChunk {
        ByteChunk::from(bytes.to_vec())
    }
}

impl<'a> From<&'a str> for ByteChunk {
    fn from(text: &'a str) -> ByteChunk {
        ByteChunk::from(text.as_bytes())
    }
}

impl AsRef<[u8]> for ByteChunk {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl ops::Deref for ByteChunk {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for ByteChunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteChunk")
            .field("bytes", &BStr::new(self.as_bytes()))
            .field("capacity", &self.capacity())
            .finish()
    }
}
