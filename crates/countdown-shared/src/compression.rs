//! Byte-buffer compression on top of a streaming compressor.
//!
//! The codec layer only sees [`StreamCodec`]; the algorithm behind it can be
//! swapped without touching the share format code. [`Deflate`] is the
//! default and drives `flate2`'s low-level state machines directly so that
//! every stream status is checked instead of trusting a reader/writer
//! wrapper to surface truncation.

use flate2::{Compress, Compression, Decompress, FlushCompress, FlushDecompress, Status};

use crate::constants::{MAX_DECOMPRESSED_SIZE, MIN_COMPRESSION_CHUNK};
use crate::error::CompressionError;

/// Whole-buffer compression. Empty input maps to empty output.
pub trait StreamCodec: Send + Sync {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError>;
    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError>;
}

/// zlib-framed DEFLATE. The trailing Adler-32 lets truncated or corrupted
/// payloads fail loudly.
#[derive(Debug, Clone)]
pub struct Deflate {
    level: Compression,
    max_output: usize,
}

impl Deflate {
    pub fn new(level: Compression) -> Self {
        Self {
            level,
            max_output: MAX_DECOMPRESSED_SIZE,
        }
    }

    /// Cap the decompressed size. Payloads come from untrusted links.
    pub fn with_max_output(mut self, max_output: usize) -> Self {
        self.max_output = max_output;
        self
    }
}

impl Default for Deflate {
    fn default() -> Self {
        // Locators must stay short enough for QR codes, so favour ratio.
        Self::new(Compression::best())
    }
}

fn chunk_size(input_len: usize) -> usize {
    input_len.max(MIN_COMPRESSION_CHUNK)
}

impl StreamCodec for Deflate {
    fn compress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut stream = Compress::new(self.level, true);
        let mut chunk = vec![0u8; chunk_size(input.len())];
        let mut output = Vec::new();

        loop {
            let in_before = stream.total_in();
            let out_before = stream.total_out();

            let status = stream
                .compress(&input[in_before as usize..], &mut chunk, FlushCompress::Finish)
                .map_err(|e| CompressionError::CompressionFailed(e.to_string()))?;

            // Drain whatever this pass produced; the next pass writes from
            // the start of `chunk` again.
            let produced = (stream.total_out() - out_before) as usize;
            output.extend_from_slice(&chunk[..produced]);

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let consumed = stream.total_in() - in_before;
                    if produced == 0 && consumed == 0 {
                        return Err(CompressionError::CompressionFailed(
                            "deflate stream stalled before finishing".into(),
                        ));
                    }
                }
            }
        }

        tracing::trace!(
            input_len = input.len(),
            output_len = output.len(),
            "compressed buffer"
        );
        Ok(output)
    }

    fn decompress(&self, input: &[u8]) -> Result<Vec<u8>, CompressionError> {
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let mut stream = Decompress::new(true);
        let mut chunk = vec![0u8; chunk_size(input.len())];
        let mut output = Vec::new();

        loop {
            let in_before = stream.total_in();
            let out_before = stream.total_out();

            let status = stream
                .decompress(&input[in_before as usize..], &mut chunk, FlushDecompress::None)
                .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

            let produced = (stream.total_out() - out_before) as usize;
            output.extend_from_slice(&chunk[..produced]);

            if output.len() > self.max_output {
                return Err(CompressionError::DecompressionFailed(format!(
                    "output exceeds {} bytes",
                    self.max_output
                )));
            }

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    let consumed = stream.total_in() - in_before;
                    if produced == 0 && consumed == 0 {
                        return Err(CompressionError::DecompressionFailed(
                            "stream ended before its terminal block".into(),
                        ));
                    }
                }
            }
        }

        if (stream.total_in() as usize) < input.len() {
            return Err(CompressionError::DecompressionFailed(format!(
                "{} trailing bytes after end of stream",
                input.len() - stream.total_in() as usize
            )));
        }

        Ok(output)
    }
}
