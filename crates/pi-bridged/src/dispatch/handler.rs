//! Connection handler that answers one bridge request per connection.

use std::collections::VecDeque;
use std::io::{self, Read, Write};

use thiserror::Error;
use tracing::{debug, warn};

use crate::host::Host;
use crate::transport::{
    ConnectionHandler, ConnectionStream, FrameDecoder, FrameTooLarge, RawFrame, read_chunk,
};

use super::dispatcher::{DISPATCH_TARGET, dispatch};
use super::request::validate;
use super::response::{BridgeResponse, ResponseWriter};

const READ_CHUNK_BYTES: usize = 4096;

/// Connection handler wiring a frame decoder to validation and dispatch.
///
/// Every complete frame on a connection is dispatched in arrival order, but
/// only the first is answered. A connection that closes before completing a
/// frame gets no response.
#[derive(Debug)]
pub struct BridgeConnectionHandler<H> {
    host: H,
    max_frame_bytes: Option<usize>,
}

#[derive(Debug, Error)]
enum ReadFailure {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    TooLarge(#[from] FrameTooLarge),
}

/// Frames decoded from one connection, yielded one at a time.
struct RequestReader {
    decoder: FrameDecoder,
    pending: VecDeque<RawFrame>,
    chunk: Vec<u8>,
}

impl RequestReader {
    fn new(max_frame_bytes: Option<usize>) -> Self {
        Self {
            decoder: FrameDecoder::with_limit(max_frame_bytes),
            pending: VecDeque::new(),
            chunk: vec![0; READ_CHUNK_BYTES],
        }
    }

    /// Returns the next complete frame, or `None` once the peer stops sending.
    fn next_frame<S: Read>(&mut self, stream: &mut S) -> Result<Option<RawFrame>, ReadFailure> {
        loop {
            if let Some(frame) = self.pending.pop_front() {
                return Ok(Some(frame));
            }
            let bytes_read = read_chunk(stream, &mut self.chunk)?;
            if bytes_read == 0 {
                return Ok(None);
            }
            let frames = self.decoder.feed(&self.chunk[..bytes_read])?;
            self.pending.extend(frames);
        }
    }
}

impl<H: Host> BridgeConnectionHandler<H> {
    /// Creates a handler dispatching into `host`.
    pub const fn new(host: H, max_frame_bytes: Option<usize>) -> Self {
        Self {
            host,
            max_frame_bytes,
        }
    }

    /// Serves `stream` until the peer stops sending, returning the one
    /// response written.
    ///
    /// Transport failures before the response is written are logged and
    /// yield `None`.
    pub fn serve<S: Read + Write>(&self, stream: &mut S) -> Option<BridgeResponse> {
        self.serve_then(stream, |_| {})
    }

    /// Serves `stream`, calling `answered` once the response has been written
    /// and before later frames are read.
    fn serve_then<S, F>(&self, stream: &mut S, answered: F) -> Option<BridgeResponse>
    where
        S: Read + Write,
        F: FnOnce(&mut S),
    {
        let mut requests = RequestReader::new(self.max_frame_bytes);
        let response = self.answer_first(&mut requests, stream)?;
        answered(stream);
        self.dispatch_remaining(&mut requests, stream);
        Some(response)
    }

    fn answer_first<S: Read + Write>(
        &self,
        requests: &mut RequestReader,
        stream: &mut S,
    ) -> Option<BridgeResponse> {
        let frame = match requests.next_frame(stream) {
            Ok(Some(frame)) => frame,
            Ok(None) => {
                debug!(target: DISPATCH_TARGET, "client disconnected without a complete request");
                return None;
            }
            Err(failure) => {
                log_read_failure(&failure);
                return None;
            }
        };

        let response = self.respond(&frame);
        if let Err(error) = ResponseWriter::new(&mut *stream).write_response(&response) {
            debug!(target: DISPATCH_TARGET, %error, "failed to write response");
            return None;
        }
        Some(response)
    }

    /// Dispatches the frames that follow the answered one. The connection
    /// already has its response, so theirs are only logged.
    fn dispatch_remaining<S: Read>(&self, requests: &mut RequestReader, stream: &mut S) {
        loop {
            match requests.next_frame(stream) {
                Ok(Some(frame)) => {
                    let response = self.respond(&frame);
                    debug!(
                        target: DISPATCH_TARGET,
                        rejected = response.is_error(),
                        "dispatched request after the answered one"
                    );
                }
                Ok(None) => return,
                Err(failure) => {
                    log_read_failure(&failure);
                    return;
                }
            }
        }
    }

    /// Validates and dispatches one frame.
    pub fn respond(&self, frame: &RawFrame) -> BridgeResponse {
        match validate(frame) {
            Ok(message) => dispatch(message, &self.host),
            Err(error) => {
                warn!(
                    target: DISPATCH_TARGET,
                    %error,
                    bytes = frame.len(),
                    "rejected request"
                );
                BridgeResponse::from_error(&error)
            }
        }
    }
}

impl<H: Host> ConnectionHandler for BridgeConnectionHandler<H> {
    fn handle(&self, mut stream: ConnectionStream) {
        self.serve_then(&mut stream, |answered| {
            if let Err(error) = answered.close_write() {
                debug!(target: DISPATCH_TARGET, %error, "failed to close response stream");
            }
        });
        if let Err(error) = stream.close() {
            debug!(target: DISPATCH_TARGET, %error, "failed to close connection");
        }
    }
}

fn log_read_failure(failure: &ReadFailure) {
    match failure {
        ReadFailure::TooLarge(error) => {
            warn!(target: DISPATCH_TARGET, %error, "dropping oversized request");
        }
        ReadFailure::Io(error) => {
            debug!(target: DISPATCH_TARGET, %error, "connection read failed");
        }
    }
}
