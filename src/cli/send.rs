//! `parley send` and `parley chat` command implementations.

use crate::cli::open_conversations;
use crate::config::Config;
use crate::core::{ConversationStore, SendOutcome};
use crate::error::{Error, Result};
use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

/// Run the send command: one message, one reply.
///
/// # Errors
///
/// Returns an error if nobody is signed in, the conversation is unknown, the
/// message is empty, or the service fails to reply.
pub async fn send(config: &Config, conversation: Option<&str>, text: &str) -> Result<()> {
    let store = open_conversations(config)?;
    let result = send_with(&store, conversation, text, &mut io::stdout().lock()).await;
    store.close();
    result
}

async fn send_with(
    store: &ConversationStore,
    conversation: Option<&str>,
    text: &str,
    out: &mut impl Write,
) -> Result<()> {
    select(store, conversation)?;
    match exchange(store, text, out).await? {
        SendOutcome::Failed { reason, .. } => Err(Error::Completion(reason)),
        SendOutcome::Empty => Err(Error::validation("message", "Message is empty")),
        SendOutcome::Busy { .. } | SendOutcome::Replied { .. } => Ok(()),
    }
}

/// Run the interactive chat loop on stdin.
///
/// Lines are sent as messages. `/new` starts a new conversation and `/quit`
/// (or end of input) leaves.
///
/// # Errors
///
/// Returns an error if nobody is signed in, the conversation is unknown, or
/// stdin cannot be read.
pub async fn chat(config: &Config, conversation: Option<&str>) -> Result<()> {
    let store = open_conversations(config)?;
    let input = BufReader::new(tokio::io::stdin());
    let result = chat_with(&store, conversation, input, &mut io::stdout().lock()).await;
    store.close();
    result
}

async fn chat_with<R>(
    store: &ConversationStore,
    conversation: Option<&str>,
    input: R,
    out: &mut impl Write,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    select(store, conversation)?;
    if let Some(current) = store.current() {
        writeln!(out, "Continuing \"{}\"", current.title())?;
    }
    writeln!(out, "Type a message, /new for a new conversation, /quit to leave.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out)?;
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/new" => {
                store.create_conversation();
                writeln!(out, "Started a new conversation.")?;
            }
            _ => {
                if let SendOutcome::Failed { reason, .. } = exchange(store, &line, out).await? {
                    tracing::debug!(%reason, "reply failed, chat continues");
                }
            }
        }
    }
    Ok(())
}

/// Make `conversation` current, if one is named.
fn select(store: &ConversationStore, conversation: Option<&str>) -> Result<()> {
    match conversation {
        Some(id) if !store.select_conversation(id) => Err(Error::ConversationNotFound(id.to_string())),
        _ => Ok(()),
    }
}

/// Send one message and print what came back.
async fn exchange(store: &ConversationStore, text: &str, out: &mut impl Write) -> Result<SendOutcome> {
    let outcome = store.send_message(text).await;
    match &outcome {
        SendOutcome::Empty => {}
        SendOutcome::Busy { .. } => writeln!(out, "Still waiting for the previous reply.")?,
        SendOutcome::Replied { conversation_id } | SendOutcome::Failed { conversation_id, .. } => {
            let reply = store
                .conversation(conversation_id)
                .and_then(|c| c.last_message().map(|m| m.content.clone()));
            if let Some(reply) = reply {
                writeln!(out, "{reply}")?;
            }
            if let Some(error) = store.last_error() {
                eprintln!("parley: {error}");
            }
        }
    }
    Ok(outcome)
}
