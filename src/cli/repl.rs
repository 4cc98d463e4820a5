//! The interactive chat loop.

use std::error::Error;
use std::io::Write;
use std::path::Path;

use tokio::io::AsyncBufReadExt;
use tracing::warn;

use crate::api::ModelClient;
use crate::cli::require_api_key;
use crate::core::config::Config;
use crate::core::controller::{ChatController, SubmitError};
use crate::core::message::Attachment;
use crate::core::persistence::StorePersistence;
use crate::render::{render, Block, Inline, TexTypesetter};
use crate::speech::{SpeechClient, SpeechModel};

const BOLD: &str = "\x1b[1m";
const ITALIC: &str = "\x1b[3m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

pub async fn run(config: &Config) -> Result<(), Box<dyn Error>> {
    let api_key = require_api_key(config)?;
    let http = reqwest::Client::new();
    let model = ModelClient::new(
        http.clone(),
        config.base_url(),
        api_key.clone(),
        config.model(),
    );
    let speech = SpeechClient::new(
        http,
        config.base_url(),
        api_key,
        config.speech_model(),
        config.voice(),
    );

    let controller = ChatController::new(Box::new(model), StorePersistence::at_default_location());
    if controller.active_session().is_none() {
        controller.create_session();
    }

    println!("mathmate ready. Type a question, or /help for commands.");
    let mut pending_attachments: Vec<Attachment> = Vec::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();
        if line.is_empty() && pending_attachments.is_empty() {
            continue;
        }

        match line.split_whitespace().next() {
            Some("/quit") | Some("/exit") => break,
            Some("/help") => {
                println!(
                    "/new /sessions /open <n> /delete <n> /attach <path> /theme [name] /speak /quit"
                );
            }
            Some("/new") => {
                controller.create_session();
                println!("Started a new session.");
            }
            Some("/sessions") => {
                for (i, (_, title)) in controller.session_summaries().iter().enumerate() {
                    let marker = if Some(i) == active_index(&controller) {
                        "*"
                    } else {
                        " "
                    };
                    println!("{marker} {}: {title}", i + 1);
                }
            }
            Some("/open") => match indexed_session(&controller, &line) {
                Some(id) => {
                    controller.set_active(&id);
                }
                None => println!("Usage: /open <n>"),
            },
            Some("/delete") => match indexed_session(&controller, &line) {
                Some(id) => {
                    controller.delete_session(&id);
                    if controller.active_session().is_none() {
                        controller.create_session();
                    }
                    println!("Deleted.");
                }
                None => println!("Usage: /delete <n>"),
            },
            Some("/attach") => {
                let path = line.trim_start_matches("/attach").trim();
                if path.is_empty() {
                    println!("Usage: /attach <path>");
                    continue;
                }
                match Attachment::from_path(Path::new(path)) {
                    Ok(attachment) => {
                        println!("Attached {} ({} bytes).", attachment.name, attachment.byte_len());
                        pending_attachments.push(attachment);
                    }
                    Err(e) => println!("{e}"),
                }
            }
            Some("/theme") => match line.split_whitespace().nth(1) {
                Some(name) => {
                    controller.set_theme(Some(name.to_string()));
                    println!("Theme set to {name}.");
                }
                None => match controller.theme() {
                    Some(theme) => println!("Theme: {theme}"),
                    None => println!("Theme: (unset)"),
                },
            },
            Some("/speak") => speak_last_answer(&controller, &speech).await,
            _ => {
                submit_and_print(&controller, &line, std::mem::take(&mut pending_attachments))
                    .await;
            }
        }
    }

    Ok(())
}

async fn submit_and_print(
    controller: &ChatController,
    text: &str,
    attachments: Vec<Attachment>,
) {
    let Some(session) = controller.active_session() else {
        println!("No active session; use /new.");
        return;
    };

    match controller.submit(&session.id, text, attachments).await {
        Ok(outcome) => {
            for warning in &outcome.warnings {
                println!("{DIM}{warning}{RESET}");
            }
            let Some(session) = controller.session(&session.id) else {
                return;
            };
            if let Some(reply) = session.messages.iter().rev().find(|m| m.is_assistant()) {
                print!("{}", format_blocks(&render(&reply.content, &TexTypesetter)));
                if let Some(trace) = &reply.reasoning_trace {
                    println!("{DIM}reasoning: {trace}{RESET}");
                }
            }
        }
        Err(SubmitError::Busy) => println!("Still working on the previous question."),
        Err(SubmitError::EmptySubmission { warnings }) => {
            for warning in &warnings {
                println!("{DIM}{warning}{RESET}");
            }
            println!("Nothing to send; type a message or attach a file.");
        }
        Err(e) => println!("{e}"),
    }
}

async fn speak_last_answer(controller: &ChatController, speech: &SpeechClient) {
    let Some(answer) = controller
        .active_session()
        .and_then(|s| s.messages.iter().rev().find(|m| m.is_assistant()).cloned())
    else {
        println!("Nothing to read yet.");
        return;
    };

    let clip = match speech.synthesize(&answer.content).await {
        Ok(clip) => clip,
        Err(e) => {
            warn!("speech synthesis failed: {e}");
            None
        }
    };
    match clip {
        Some(clip) => {
            let path = std::env::temp_dir().join("mathmate-answer.wav");
            match clip.write_wav(&path) {
                Ok(()) => println!("Audio written to {} ({:.1}s).", path.display(), clip.duration_secs()),
                Err(e) => println!("Could not write audio: {e}"),
            }
        }
        None => println!("No audio available for that answer."),
    }
}

fn active_index(controller: &ChatController) -> Option<usize> {
    let active = controller.active_session()?.id;
    controller
        .session_summaries()
        .iter()
        .position(|(id, _)| *id == active)
}

fn indexed_session(controller: &ChatController, line: &str) -> Option<String> {
    let n: usize = line.split_whitespace().nth(1)?.parse().ok()?;
    let summaries = controller.session_summaries();
    summaries.get(n.checked_sub(1)?).map(|(id, _)| id.clone())
}

/// Flatten rendered blocks into terminal text. Ordered list items are
/// renumbered per consecutive run since their source markers were stripped.
fn format_blocks(blocks: &[Block]) -> String {
    let mut out = String::new();
    let mut ordinal = 0usize;
    for block in blocks {
        if !matches!(block, Block::ListItem { ordered: true, .. }) {
            ordinal = 0;
        }
        match block {
            Block::MathDisplay(math) => {
                out.push_str(&format!("    {ITALIC}{math}{RESET}\n"));
            }
            Block::Paragraph(spans) => {
                out.push_str(&format_spans(spans));
                out.push('\n');
            }
            Block::ListItem { ordered: false, spans } => {
                out.push_str(&format!("  • {}\n", format_spans(spans)));
            }
            Block::ListItem { ordered: true, spans } => {
                ordinal += 1;
                out.push_str(&format!("  {ordinal}. {}\n", format_spans(spans)));
            }
            Block::LineBreak => out.push('\n'),
        }
    }
    out
}

fn format_spans(spans: &[Inline]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Inline::Text(text) => text.clone(),
            Inline::Bold(text) => format!("{BOLD}{text}{RESET}"),
            Inline::Math(math) => format!("{ITALIC}{math}{RESET}"),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordered_items_are_renumbered_per_run() {
        let blocks = vec![
            Block::ListItem {
                ordered: true,
                spans: vec![Inline::Text("first".into())],
            },
            Block::ListItem {
                ordered: true,
                spans: vec![Inline::Text("second".into())],
            },
            Block::LineBreak,
            Block::ListItem {
                ordered: true,
                spans: vec![Inline::Text("restart".into())],
            },
        ];
        let text = format_blocks(&blocks);
        assert!(text.contains("1. first"));
        assert!(text.contains("2. second"));
        assert!(text.contains("1. restart"));
    }

    #[test]
    fn spans_render_with_styling_markers() {
        let text = format_spans(&[
            Inline::Text("the ".into()),
            Inline::Bold("key".into()),
            Inline::Math("x^2".into()),
        ]);
        assert!(text.starts_with("the "));
        assert!(text.contains("key"));
        assert!(text.contains("x^2"));
    }
}
