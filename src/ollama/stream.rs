use super::types::{ChatChunk, PullProgress, StreamEnvelope};
use super::OllamaError;
use serde::de::DeserializeOwned;
use std::io::{BufRead, BufReader, Lines, Read};
use std::marker::PhantomData;

pub type ResponseReader = Box<dyn Read + Send + Sync + 'static>;

/// Lazily decodes a newline-delimited JSON body. Stops after the first error.
pub struct NdjsonStream<T> {
    lines: Lines<BufReader<ResponseReader>>,
    finished: bool,
    _payload: PhantomData<T>,
}

impl<T: DeserializeOwned> NdjsonStream<T> {
    pub fn from_reader(reader: ResponseReader) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            finished: false,
            _payload: PhantomData,
        }
    }

    fn fail(&mut self, error: OllamaError) -> Option<Result<T, OllamaError>> {
        self.finished = true;
        Some(Err(error))
    }
}

impl<T: DeserializeOwned> Iterator for NdjsonStream<T> {
    type Item = Result<T, OllamaError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        loop {
            let line = match self.lines.next() {
                None => {
                    self.finished = true;
                    return None;
                }
                Some(Err(err)) => return self.fail(OllamaError::StreamRead(err.to_string())),
                Some(Ok(line)) => line,
            };
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let envelope: StreamEnvelope<T> = match serde_json::from_str(trimmed) {
                Ok(envelope) => envelope,
                Err(err) => {
                    return self.fail(OllamaError::StreamLine {
                        line: trimmed.to_string(),
                        message: err.to_string(),
                    })
                }
            };
            if let Some(error) = envelope.error {
                return self.fail(OllamaError::Server(error));
            }
            return Some(Ok(envelope.data));
        }
    }
}

/// Text fragments of a streamed chat completion, in arrival order.
pub struct ChatStream {
    chunks: NdjsonStream<ChatChunk>,
    done: bool,
}

impl ChatStream {
    pub fn from_reader(reader: ResponseReader) -> Self {
        Self {
            chunks: NdjsonStream::from_reader(reader),
            done: false,
        }
    }
}

impl Iterator for ChatStream {
    type Item = Result<String, OllamaError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.done {
                return None;
            }
            let chunk = match self.chunks.next()? {
                Ok(chunk) => chunk,
                Err(err) => return Some(Err(err)),
            };
            if chunk.done {
                self.done = true;
            }
            let content = chunk.message.map(|message| message.content).unwrap_or_default();
            if !content.is_empty() {
                return Some(Ok(content));
            }
        }
    }
}

pub type PullStream = NdjsonStream<PullProgress>;
