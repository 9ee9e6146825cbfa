//! Conversation CLI commands: list, new, show, send, reply, rename, delete.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use chatsync_core::sync::SaveOutcome;
use chatsync_types::conversation::ConversationSummary;
use chatsync_types::message::{Message, MessageRole};

use crate::state::AppState;

/// List the owner's conversations, newest first.
pub fn list(state: &AppState, json: bool) -> Result<()> {
    let conversations = state.coordinator.conversations();

    if json {
        println!("{}", serde_json::to_string_pretty(&conversations)?);
        return Ok(());
    }

    let active = state.coordinator.current_conversation_id();

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("").fg(Color::White),
        Cell::new("ID").fg(Color::White),
        Cell::new("Title").fg(Color::White),
        Cell::new("Messages").fg(Color::White),
        Cell::new("Updated").fg(Color::White),
    ]);

    for conversation in &conversations {
        let marker = if active.as_deref() == Some(conversation.id.as_str()) {
            Cell::new("●").fg(Color::Green)
        } else {
            Cell::new("")
        };

        table.add_row(vec![
            marker,
            Cell::new(&conversation.id).fg(Color::DarkGrey),
            Cell::new(truncate_cell(&conversation.title, 40)).fg(Color::Cyan),
            Cell::new(conversation.message_count),
            Cell::new(format_relative_time(&conversation.updated_at)).fg(Color::DarkGrey),
        ]);
    }

    println!();
    println!("{table}");
    println!();

    Ok(())
}

/// Open an empty conversation, reusing an existing one when possible.
pub async fn new_chat(state: &AppState, json: bool) -> Result<()> {
    let before = state.coordinator.conversations().len();
    let id = state.coordinator.new_chat().await?;
    let created = state.coordinator.conversations().len() > before;

    if json {
        println!("{}", serde_json::json!({"id": id, "created": created}));
        return Ok(());
    }

    let verb = if created { "Created" } else { "Reusing" };
    println!(
        "  {} {} conversation {}",
        style("✓").green().bold(),
        verb,
        style(&id).cyan()
    );

    Ok(())
}

/// Print a conversation's transcript.
pub async fn show(state: &AppState, id: &str, json: bool) -> Result<()> {
    let conversation = require_conversation(state, id)?;
    state.coordinator.switch_to(id).await;
    let transcript = state.coordinator.transcript();

    if json {
        let out = serde_json::json!({
            "conversation": conversation,
            "messages": transcript,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!();
    println!("  {}", style(&conversation.title).cyan().bold());
    println!(
        "  {}",
        style(format!("{} · {} messages", conversation.id, transcript.len())).dim()
    );
    println!();

    if transcript.is_empty() {
        println!("  {} No messages yet.", style("i").blue().bold());
        println!();
        return Ok(());
    }

    for message in &transcript {
        print_message(message);
    }

    Ok(())
}

/// Append a user message and save it.
pub async fn send(state: &AppState, conversation: Option<&str>, text: &str, json: bool) -> Result<()> {
    activate(state, conversation).await?;
    let message = state.coordinator.append_user_message(text)?;
    let outcome = state.coordinator.flush_now().await?;
    let current = state.coordinator.current_conversation();

    if json {
        println!(
            "{}",
            serde_json::json!({
                "conversation": current,
                "message": message,
                "saved": outcome == SaveOutcome::Saved,
            })
        );
        return Ok(());
    }

    if let Some(current) = current {
        println!(
            "  {} Sent to {} ({})",
            style("✓").green().bold(),
            style(&current.title).cyan(),
            style(&current.id).dim()
        );
    }

    Ok(())
}

/// Stream an assistant reply from standard input.
///
/// Ctrl-C stops the stream; whatever arrived is kept and saved.
pub async fn reply(state: &AppState, conversation: Option<&str>, json: bool) -> Result<()> {
    activate(state, conversation).await?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}")?);
    spinner.set_message("Reading reply from stdin...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));

    let coordinator = state.coordinator.clone();
    let mut streaming = tokio::spawn(async move { coordinator.request_reply().await });
    let message_id = tokio::select! {
        joined = &mut streaming => joined??,
        _ = tokio::signal::ctrl_c() => {
            state.coordinator.cancel_stream();
            streaming.await??
        }
    };

    spinner.finish_and_clear();
    state.coordinator.flush_now().await?;

    let Some(message) = state
        .coordinator
        .transcript()
        .into_iter()
        .find(|m| m.id == message_id)
    else {
        bail!("reply was discarded before it could be saved");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&message)?);
    } else {
        print_message(&message);
    }

    Ok(())
}

/// Rename a conversation.
pub async fn rename(state: &AppState, id: &str, title: &str, json: bool) -> Result<()> {
    require_conversation(state, id)?;
    let renamed = state.coordinator.rename_conversation(id, title).await?;

    if json {
        println!("{}", serde_json::json!({"id": id, "renamed": renamed}));
        return Ok(());
    }

    if renamed {
        println!(
            "  {} Renamed to {}",
            style("✓").green().bold(),
            style(title.trim()).cyan()
        );
    } else {
        println!("  {} Title is blank; nothing changed.", style("i").blue().bold());
    }

    Ok(())
}

/// Delete a conversation and its messages.
pub async fn delete(state: &AppState, id: &str, force: bool, json: bool) -> Result<()> {
    let conversation = require_conversation(state, id)?;

    if !force && !json {
        let confirmed = Confirm::new()
            .with_prompt(format!(
                "Permanently delete '{}' and all its messages?",
                style(&conversation.title).red().bold()
            ))
            .default(false)
            .interact()?;

        if !confirmed {
            println!("  Cancelled.");
            return Ok(());
        }
    }

    state.coordinator.delete_conversation(id).await?;
    let active = state.coordinator.current_conversation_id();

    if json {
        println!(
            "{}",
            serde_json::json!({"deleted": true, "id": id, "active": active})
        );
    } else {
        println!(
            "  {} Conversation '{}' deleted.",
            style("✓").red().bold(),
            conversation.title
        );
    }

    Ok(())
}

/// Switch to `conversation` when given; otherwise stay on the newest.
async fn activate(state: &AppState, conversation: Option<&str>) -> Result<()> {
    if let Some(id) = conversation {
        require_conversation(state, id)?;
        state.coordinator.switch_to(id).await;
    }
    if state.coordinator.current_conversation_id().is_none() {
        bail!("no active conversation");
    }
    Ok(())
}

fn require_conversation(state: &AppState, id: &str) -> Result<ConversationSummary> {
    match state.coordinator.conversations().into_iter().find(|c| c.id == id) {
        Some(conversation) => Ok(conversation),
        None => bail!("conversation '{id}' not found"),
    }
}

fn print_message(message: &Message) {
    let label = match message.role {
        MessageRole::User => style("you").cyan().bold(),
        MessageRole::Assistant => style("assistant").green().bold(),
        MessageRole::System => style("system").dim(),
    };
    println!("  {label}");
    for line in message.text().lines() {
        println!("    {line}");
    }
    println!();
}

fn truncate_cell(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &text[..cut]),
        None => text.to_string(),
    }
}

fn format_relative_time(dt: &chrono::DateTime<chrono::Utc>) -> String {
    let diff = chrono::Utc::now() - *dt;

    if diff.num_minutes() < 1 {
        "just now".to_string()
    } else if diff.num_hours() < 1 {
        format!("{}m ago", diff.num_minutes())
    } else if diff.num_days() < 1 {
        format!("{}h ago", diff.num_hours())
    } else if diff.num_days() < 30 {
        format!("{}d ago", diff.num_days())
    } else {
        dt.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[test]
    fn truncate_cell_counts_characters() {
        assert_eq!(truncate_cell("short", 10), "short");
        assert_eq!(truncate_cell("abcdef", 3), "abc…");
        assert_eq!(truncate_cell("日本語のタイトル", 3), "日本語…");
    }

    #[test]
    fn relative_time_buckets() {
        let now = Utc::now();
        assert_eq!(format_relative_time(&now), "just now");
        assert_eq!(format_relative_time(&(now - Duration::minutes(5))), "5m ago");
        assert_eq!(format_relative_time(&(now - Duration::hours(3))), "3h ago");
        assert_eq!(format_relative_time(&(now - Duration::days(2))), "2d ago");

        let old = now - Duration::days(90);
        assert_eq!(format_relative_time(&old), old.format("%Y-%m-%d").to_string());
    }
}
