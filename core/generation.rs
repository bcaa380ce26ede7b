//! Streaming client for an Ollama-compatible `/api/generate` endpoint.
//!
//! The response body is a sequence of JSON objects, one per line. Each
//! object's `response` fragment is written to the caller's sink as soon as
//! it is decoded, so the answer can be displayed while it is produced.

use crate::error::{AppError, Result};
use log;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, Read, Write};
use std::time::Duration;

/// Default generation endpoint of a local Ollama server.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434/api/generate";

/// Default model name.
pub const DEFAULT_MODEL: &str = "gpt-oss";

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

impl GenerationRequest {
    /// Streaming request for `model`.
    pub fn streaming(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            stream: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct GenerationChunk {
    pub model: String,
    pub created_at: String,
    pub response: String,
    pub done: bool,
}

/// How a successful stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The body ran out of data without a `done` chunk.
    EndOfStream,
    /// A chunk carried `done: true`.
    DoneFlag,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    Sending,
    Streaming,
    Done(Termination),
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub termination: Termination,
    pub chunks: usize,
    pub bytes_written: usize,
}

#[derive(Debug)]
struct StreamTracker {
    state: StreamState,
}

impl StreamTracker {
    fn new() -> Self {
        Self {
            state: StreamState::Idle,
        }
    }

    fn advance(&mut self, next: StreamState) {
        log::debug!("Generation stream: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn fail(&mut self, err: AppError) -> AppError {
        self.advance(StreamState::Failed);
        err
    }
}

#[derive(Debug, Clone)]
pub struct GenerationClient {
    client: Client,
    endpoint: String,
}

impl GenerationClient {
    /// Creates a client without a request timeout; a call runs until the
    /// stream finishes or fails.
    pub fn new(endpoint: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    /// Sends `request` once and streams the answer into `sink`.
    ///
    /// No retry is attempted. Fragments already written stay written when
    /// the stream later fails.
    pub fn generate<W: Write>(&self, request: &GenerationRequest, sink: &mut W) -> Result<StreamSummary> {
        let mut tracker = StreamTracker::new();
        tracker.advance(StreamState::Sending);
        log::info!(
            "Sending generation request to {} (model: {})",
            self.endpoint,
            request.model
        );

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .map_err(|e| {
                tracker.fail(AppError::EndpointUnreachable {
                    endpoint: self.endpoint.clone(),
                    source: e,
                })
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().unwrap_or_default();
            return Err(tracker.fail(AppError::EndpointStatus {
                endpoint: self.endpoint.clone(),
                status,
                body,
            }));
        }

        // `response` is moved into the reader and dropped when streaming returns.
        stream_into(&mut tracker, BufReader::new(response), sink)
    }
}

/// Decodes chunks from `reader` and writes each fragment to `sink`.
pub fn consume_stream<R: Read, W: Write>(reader: R, sink: &mut W) -> Result<StreamSummary> {
    let mut tracker = StreamTracker::new();
    stream_into(&mut tracker, reader, sink)
}

fn stream_into<R: Read, W: Write>(
    tracker: &mut StreamTracker,
    reader: R,
    sink: &mut W,
) -> Result<StreamSummary> {
    tracker.advance(StreamState::Streaming);
    let mut chunks = serde_json::Deserializer::from_reader(reader).into_iter::<GenerationChunk>();
    let mut count = 0;
    let mut bytes_written = 0;

    let termination = loop {
        let chunk = match chunks.next() {
            None => break Termination::EndOfStream,
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                return Err(tracker.fail(AppError::StreamDecode(format!(
                    "Failed to decode chunk {}: {}",
                    count + 1,
                    e
                ))));
            }
        };
        count += 1;

        if let Err(e) = sink
            .write_all(chunk.response.as_bytes())
            .and_then(|_| sink.flush())
        {
            return Err(tracker.fail(AppError::Io(e)));
        }
        bytes_written += chunk.response.len();

        if chunk.done {
            break Termination::DoneFlag;
        }
    };

    if let Err(e) = sink.write_all(b"\n").and_then(|_| sink.flush()) {
        return Err(tracker.fail(AppError::Io(e)));
    }
    tracker.advance(StreamState::Done(termination));
    log::debug!(
        "Generation finished ({:?}) after {} chunks, {} bytes",
        termination,
        count,
        bytes_written
    );

    Ok(StreamSummary {
        termination,
        chunks: count,
        bytes_written,
    })
}
