// Interactive chat in the terminal. Same turn loop as the web UI, with stdin
// as the input box and stdout as the transcript view.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{info, warn};

use crate::streaming::stream_words;
use crate::turn::{ChatSession, TurnProcessor};

const EXIT_COMMAND: &str = "/exit";

pub async fn run_terminal_chat(processor: Arc<TurnProcessor>, stream_delay: Duration) -> Result<()> {
    let mut session = ChatSession::new(processor);
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    run_chat(&mut session, stream_delay, stdin, &mut stdout).await
}

/// Reads one query per line until EOF or `/exit`. Blank lines are skipped.
/// A failed turn is reported and the loop carries on.
pub async fn run_chat<R, W>(session: &mut ChatSession, stream_delay: Duration, input: R, output: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    info!("Starting terminal chat...");
    output.write_all(b"Start by typing a message\n> ").await?;
    output.flush().await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await.context("Failed to read from stdin")? {
        let query = line.trim_end_matches('\r');
        if query.trim() == EXIT_COMMAND {
            break;
        }
        if query.trim().is_empty() {
            output.write_all(b"> ").await?;
            output.flush().await?;
            continue;
        }

        match session.submit(query).await {
            Ok(reply) => {
                let mut words = Box::pin(stream_words(&reply, stream_delay));
                while let Some(word) = words.next().await {
                    output.write_all(word.as_bytes()).await?;
                    output.flush().await?;
                }
                output.write_all(b"\n").await?;
            }
            Err(e) => {
                warn!("Turn failed: {}", e);
                output.write_all(format!("Error: {}\n", e).as_bytes()).await?;
            }
        }
        output.write_all(b"> ").await?;
        output.flush().await?;
    }

    output.write_all(b"\n").await?;
    output.flush().await?;
    info!(messages = session.transcript().len(), "Chat session finished.");
    Ok(())
}
