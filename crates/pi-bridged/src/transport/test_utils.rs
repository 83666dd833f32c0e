//! Test helpers for the transport module.

use std::sync::{Arc, Mutex};

use super::{ConnectionHandler, ConnectionStream, FrameDecoder, read_chunk};

/// Handler that records the first frame of each connection, or an empty
/// entry when the client sends none.
#[derive(Default)]
pub(crate) struct FirstFrameRecorder {
    frames: Mutex<Vec<Vec<u8>>>,
}

impl FirstFrameRecorder {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn connections(&self) -> usize {
        self.frames().len()
    }

    pub(crate) fn frames(&self) -> Vec<Vec<u8>> {
        self.frames.lock().expect("recorder mutex poisoned").clone()
    }

    fn first_frame(stream: &mut ConnectionStream) -> Vec<u8> {
        let mut decoder = FrameDecoder::new();
        let mut chunk = [0_u8; 256];
        loop {
            let Ok(read) = read_chunk(stream, &mut chunk) else {
                return Vec::new();
            };
            if read == 0 {
                return Vec::new();
            }
            let first = decoder
                .feed(&chunk[..read])
                .expect("unbounded decoder")
                .next();
            if let Some(frame) = first {
                return frame.as_bytes().to_vec();
            }
        }
    }
}

impl ConnectionHandler for FirstFrameRecorder {
    fn handle(&self, mut stream: ConnectionStream) {
        let frame = Self::first_frame(&mut stream);
        self.frames
            .lock()
            .expect("recorder mutex poisoned")
            .push(frame);
        let _ = stream.close();
    }
}
