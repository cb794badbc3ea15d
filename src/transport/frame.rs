//! Fixed-size frame slot shared by the receive queue and the transport contract.

use crate::constants::MAX_FRAME_LEN;
use crate::error::TransportError;

/// One bounded unit of radio payload.
///
/// The payload is stored inline so queue slots never allocate. Bytes past
/// `len` are unspecified and never exposed.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    len: u8,
    data: [u8; MAX_FRAME_LEN],
}

impl Frame {
    /// An empty frame, used to pre-fill queue slots.
    pub const EMPTY: Frame = Frame {
        len: 0,
        data: [0; MAX_FRAME_LEN],
    };

    /// Copy `payload` into a new frame.
    ///
    /// # Returns
    /// * `Ok(Frame)` - payload fits in `MAX_FRAME_LEN`
    /// * `Err(TransportError::FrameTooLong)` - payload is longer
    pub fn new(payload: &[u8]) -> Result<Self, TransportError> {
        if payload.len() > MAX_FRAME_LEN {
            return Err(TransportError::FrameTooLong {
                len: payload.len(),
                max: MAX_FRAME_LEN,
            });
        }
        let mut frame = Self::EMPTY;
        frame.data[..payload.len()].copy_from_slice(payload);
        frame.len = payload.len() as u8;
        Ok(frame)
    }

    /// Fill the frame in place with `fill`, which returns the number of
    /// bytes it wrote. Lengths beyond `MAX_FRAME_LEN` are clamped.
    pub(crate) fn fill_with<F>(&mut self, fill: F)
    where
        F: FnOnce(&mut [u8; MAX_FRAME_LEN]) -> usize,
    {
        let written = fill(&mut self.data);
        self.len = written.min(MAX_FRAME_LEN) as u8;
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    /// Copy the payload into `buf`, truncating to its length.
    ///
    /// Returns the number of bytes copied.
    pub fn copy_to(&self, buf: &mut [u8]) -> usize {
        let n = self.len().min(buf.len());
        buf[..n].copy_from_slice(&self.data[..n]);
        n
    }
}

impl Default for Frame {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("len", &self.len)
            .field("data", &hex::encode(self.as_bytes()))
            .finish()
    }
}
