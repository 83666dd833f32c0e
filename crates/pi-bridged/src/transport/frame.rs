//! Newline framing for connection byte streams.

use thiserror::Error;

const DELIMITER: u8 = b'\n';

/// One newline-delimited message, without its delimiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame(Vec<u8>);

impl RawFrame {
    /// Wraps frame bytes.
    #[must_use]
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Frame contents.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Frame length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true for an empty frame.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raised when buffered data grows past the configured cap without a
/// delimiter.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("frame exceeds {limit} byte limit ({size} bytes buffered)")]
pub struct FrameTooLarge {
    /// Bytes buffered for the offending frame.
    pub size: usize,
    /// Configured cap.
    pub limit: usize,
}

/// Per-connection accumulator that splits a byte stream into frames.
///
/// Bytes after the last delimiter stay buffered until a later
/// [`feed`](Self::feed) completes them. Frames not consumed from a returned
/// [`Frames`] iterator remain buffered and are yielded by the next one.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
    limit: Option<usize>,
}

impl FrameDecoder {
    /// Creates an unbounded decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a decoder that rejects frames longer than `limit` bytes.
    #[must_use]
    pub fn with_limit(limit: Option<usize>) -> Self {
        Self {
            buffer: Vec::new(),
            limit,
        }
    }

    /// Appends `bytes` and returns the frames completed so far.
    ///
    /// # Errors
    ///
    /// Returns [`FrameTooLarge`] when a cap is configured and any buffered
    /// frame, complete or not, exceeds it.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Frames<'_>, FrameTooLarge> {
        self.buffer.extend_from_slice(bytes);
        if let Some(limit) = self.limit
            && let Some(size) = self
                .buffer
                .split(|byte| *byte == DELIMITER)
                .map(<[u8]>::len)
                .find(|len| *len > limit)
        {
            return Err(FrameTooLarge { size, limit });
        }
        Ok(Frames { decoder: self })
    }

    /// Number of bytes retained for the next frame.
    #[must_use]
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    fn next_frame(&mut self) -> Option<RawFrame> {
        let position = self.buffer.iter().position(|byte| *byte == DELIMITER)?;
        let mut frame: Vec<u8> = self.buffer.drain(..=position).collect();
        frame.pop();
        Some(RawFrame(frame))
    }
}

/// Frames completed by a [`FrameDecoder::feed`] call.
#[derive(Debug)]
pub struct Frames<'a> {
    decoder: &'a mut FrameDecoder,
}

impl Iterator for Frames<'_> {
    type Item = RawFrame;

    fn next(&mut self) -> Option<Self::Item> {
        self.decoder.next_frame()
    }
}
