//! Incremental rendering of streamed responses (typewriter effect).

use std::io::{self, Write};

use colored::Colorize;
use tokio::sync::mpsc;

use crate::error::{KomittoError, Result};
use crate::llm::{StreamEvent, TokenUsage};

/// Prints deltas as they arrive and accumulates the full message.
pub struct StreamingOutput {
    buffer: String,
    usage: Option<TokenUsage>,
    colored: bool,
}

impl StreamingOutput {
    pub fn new(colored: bool) -> Self {
        Self {
            buffer: String::new(),
            usage: None,
            colored,
        }
    }

    /// Drains the stream, echoing each delta immediately.
    ///
    /// Returns the accumulated message (trimmed, matching the one-shot
    /// contract) and the usage from the terminal chunk when present.
    /// A mid-stream error fails the call; text printed so far stays on
    /// screen.
    pub async fn process(
        &mut self,
        mut receiver: mpsc::Receiver<StreamEvent>,
    ) -> Result<(String, Option<TokenUsage>)> {
        while let Some(event) = receiver.recv().await {
            match event {
                StreamEvent::Chunk(chunk) => {
                    if !chunk.delta.is_empty() {
                        self.buffer.push_str(&chunk.delta);
                        if self.colored {
                            print!("{}", chunk.delta.yellow());
                        } else {
                            print!("{}", chunk.delta);
                        }
                        io::stdout().flush().ok();
                    }
                    if chunk.usage.is_some() {
                        self.usage = chunk.usage;
                    }
                }
                StreamEvent::Done => {
                    break;
                }
                StreamEvent::Error(e) => {
                    println!();
                    return Err(KomittoError::Llm(e));
                }
            }
        }

        println!();
        Ok((self.buffer.trim().to_string(), self.usage))
    }
}
