//! `parley new`, `list`, `show` and `delete` command implementations.

use crate::cli::{format_local_time, open_history};
use crate::config::Config;
use crate::core::ConversationStore;
use crate::error::{Error, Result};
use std::io::{self, Write};

/// Maximum width of a title in the list view.
const TITLE_PREVIEW_LEN: usize = 40;

/// Run the new command.
///
/// # Errors
///
/// Returns an error if nobody is signed in or the profile cannot be opened.
pub fn new(config: &Config) -> Result<()> {
    new_with(&open_history(config)?, &mut io::stdout().lock())
}

fn new_with(store: &ConversationStore, out: &mut impl Write) -> Result<()> {
    let conversation = store.create_conversation();
    writeln!(out, "{}", conversation.id())?;
    Ok(())
}

/// Run the list command.
///
/// # Errors
///
/// Returns an error if nobody is signed in or the profile cannot be opened.
pub fn list(config: &Config) -> Result<()> {
    list_with(&open_history(config)?, &mut io::stdout().lock())
}

fn list_with(store: &ConversationStore, out: &mut impl Write) -> Result<()> {
    let conversations = store.conversations();
    if conversations.is_empty() {
        writeln!(out, "No conversations yet.")?;
        return Ok(());
    }

    let current = store.current().map(|c| c.id().to_string());

    writeln!(out, "  {:<38} {:<17} {:>5} Title", "Conversation ID", "Updated", "Msgs")?;
    writeln!(out, "{}", "─".repeat(90))?;
    for conversation in &conversations {
        let marker = if current.as_deref() == Some(conversation.id()) { '*' } else { ' ' };
        writeln!(
            out,
            "{marker} {:<38} {:<17} {:>5} {}",
            conversation.id(),
            format_local_time(conversation.updated_at()),
            conversation.messages().len(),
            preview(conversation.title()),
        )?;
    }
    writeln!(out, "{}", "─".repeat(90))?;
    writeln!(out, "{} conversation(s)", conversations.len())?;
    Ok(())
}

/// Run the show command.
///
/// Shows the most recent conversation when no id is given.
///
/// # Errors
///
/// Returns an error if nobody is signed in or the conversation is unknown.
pub fn show(config: &Config, id: Option<&str>) -> Result<()> {
    show_with(&open_history(config)?, id, &mut io::stdout().lock())
}

fn show_with(store: &ConversationStore, id: Option<&str>, out: &mut impl Write) -> Result<()> {
    let conversation = match id {
        Some(id) => store
            .conversation(id)
            .ok_or_else(|| Error::ConversationNotFound(id.to_string()))?,
        None => {
            let Some(conversation) = store.current() else {
                writeln!(out, "No conversations yet.")?;
                return Ok(());
            };
            conversation
        }
    };

    writeln!(out, "{}", conversation.title())?;
    writeln!(out, "{}", "─".repeat(conversation.title().chars().count().max(3)))?;
    for message in conversation.messages() {
        writeln!(
            out,
            "[{} {}] {}",
            format_local_time(message.timestamp),
            message.role,
            message.content
        )?;
    }
    Ok(())
}

/// Run the delete command.
///
/// # Errors
///
/// Returns an error if nobody is signed in or the conversation is unknown.
pub fn delete(config: &Config, id: &str) -> Result<()> {
    delete_with(&open_history(config)?, id, &mut io::stdout().lock())
}

fn delete_with(store: &ConversationStore, id: &str, out: &mut impl Write) -> Result<()> {
    if !store.delete_conversation(id) {
        return Err(Error::ConversationNotFound(id.to_string()));
    }
    writeln!(out, "Deleted {id}")?;
    Ok(())
}

fn preview(title: &str) -> String {
    if title.chars().count() > TITLE_PREVIEW_LEN {
        let cut: String = title.chars().take(TITLE_PREVIEW_LEN).collect();
        format!("{cut}...")
    } else {
        title.to_string()
    }
}
