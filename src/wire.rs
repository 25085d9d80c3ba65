//! Frame buffer handling
//!
//! An owned byte region with a movable data window. Headers are added by
//! growing the window backwards into head room and removed by advancing its
//! start, so no payload bytes move while a frame is re-encapsulated.

use bytes::Bytes;

use crate::{Result, XlatError};

/// Head room reserved by [`FrameBuffer::new`]
pub const DEFAULT_HEADROOM: usize = 64;

/// Owned frame with head room in front of the data window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameBuffer {
    /// Backing allocation
    data: Vec<u8>,
    /// Start of the data window
    head: usize,
    /// End of the data window
    tail: usize,
}

impl FrameBuffer {
    /// Create buffer holding `frame` behind [`DEFAULT_HEADROOM`] bytes
    pub fn new(frame: &[u8]) -> Self {
        Self::with_headroom(DEFAULT_HEADROOM, frame)
    }

    /// Create buffer holding `frame` behind `headroom` spare bytes
    pub fn with_headroom(headroom: usize, frame: &[u8]) -> Self {
        let mut data = vec![0; headroom + frame.len()];
        data[headroom..].copy_from_slice(frame);
        let tail = data.len();
        Self {
            data,
            head: headroom,
            tail,
        }
    }

    /// Create buffer from existing data, without head room
    pub fn from_vec(data: Vec<u8>) -> Self {
        let tail = data.len();
        Self { data, head: 0, tail }
    }

    /// Length of the data window
    pub fn len(&self) -> usize {
        self.tail - self.head
    }

    pub fn is_empty(&self) -> bool {
        self.head >= self.tail
    }

    /// Bytes available in front of the data window
    pub fn headroom(&self) -> usize {
        self.head
    }

    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.data[self.head..self.tail]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[self.head..self.tail]
    }

    /// Fail unless the data window holds at least `needed` bytes
    pub fn ensure_len(&self, needed: usize) -> Result<()> {
        if self.len() < needed {
            return Err(XlatError::BufferTooShort {
                needed,
                available: self.len(),
            });
        }
        Ok(())
    }

    /// Grow the data window `n` bytes into the head room
    ///
    /// Returns the newly exposed bytes, whose contents are unspecified.
    pub fn push_head(&mut self, n: usize) -> Result<&mut [u8]> {
        if n > self.head {
            return Err(XlatError::BufferTooShort {
                needed: n,
                available: self.head,
            });
        }
        self.head -= n;
        Ok(&mut self.data[self.head..self.head + n])
    }

    /// Remove `n` bytes from the front of the data window and return them
    pub fn pull_head(&mut self, n: usize) -> Result<&[u8]> {
        self.ensure_len(n)?;
        let start = self.head;
        self.head += n;
        Ok(&self.data[start..self.head])
    }

    /// Insert `bytes` in front of the data window
    pub fn prepend(&mut self, bytes: &[u8]) -> Result<()> {
        self.push_head(bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Replace the first `consumed` bytes of the window with `new_head`
    ///
    /// The window grows or shrinks at the front as needed. Both the window
    /// length and the head room are checked before anything changes.
    pub fn replace_head(&mut self, consumed: usize, new_head: &[u8]) -> Result<()> {
        self.ensure_len(consumed)?;
        let room = self.head + consumed;
        if new_head.len() > room {
            return Err(XlatError::BufferTooShort {
                needed: new_head.len(),
                available: room,
            });
        }

        self.head = room - new_head.len();
        self.data[self.head..room].copy_from_slice(new_head);
        Ok(())
    }

    /// Copy of the data window
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Hand the data window off as shared bytes
    pub fn into_bytes(self) -> Bytes {
        Bytes::from(self.data).slice(self.head..self.tail)
    }
}

impl AsRef<[u8]> for FrameBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}
