use std::io::Write;

use anyhow::Result;
use cirrus_core::{AppConfig, ChatSession, TranscriptLine, open_session, search_guides};
use colored::Colorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::utils::{format_timestamp, run_turn};

const HELP: &str = "Commands:
  /new            start a new chat
  /history        list saved chats
  /load <id>      switch to a saved chat
  /guides [text]  list guides
  /guide <id>     apply a guide to this chat
  /guide off      remove the guide
  /quit           exit";

/// One line of REPL input.
#[derive(Debug, PartialEq, Eq)]
enum ReplInput<'a> {
    Empty,
    Message(&'a str),
    New,
    History,
    Load(&'a str),
    Guides(&'a str),
    Guide(&'a str),
    GuideOff,
    Help,
    Quit,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> ReplInput<'_> {
    let line = line.trim();
    if line.is_empty() {
        return ReplInput::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplInput::Message(line);
    };

    let (name, arg) = match command.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (command, ""),
    };

    match (name, arg) {
        ("new", _) => ReplInput::New,
        ("history", _) => ReplInput::History,
        ("load", id) if !id.is_empty() => ReplInput::Load(id),
        ("guides", query) => ReplInput::Guides(query),
        ("guide", "off") => ReplInput::GuideOff,
        ("guide", id) if !id.is_empty() => ReplInput::Guide(id),
        ("help", _) => ReplInput::Help,
        ("quit" | "exit", _) => ReplInput::Quit,
        _ => ReplInput::Unknown(line),
    }
}

pub async fn run(config: &AppConfig) -> Result<()> {
    let (session, restored) = open_session(config).await?;

    if restored {
        print_transcript(&session.transcript().await);
    } else {
        print_assistant(&session.welcome_message());
        if !config.has_api_key() {
            print_assistant(cirrus_core::prompt::API_KEY_HINT);
        }
    }
    println!("{}", "Type /help for commands.".dimmed());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".cyan().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_input(&line) {
            ReplInput::Empty => {}
            ReplInput::Message(text) => match run_turn(&session, text).await {
                Ok(answer) => print_assistant(&answer),
                Err(err) => print_error(&err.to_string()),
            },
            ReplInput::New => match session.new_chat().await {
                Ok(welcome) => print_assistant(&welcome),
                Err(err) => print_error(&err.to_string()),
            },
            ReplInput::History => print_history(&session).await,
            ReplInput::Load(id) => match session.load_chat(id).await {
                Ok(transcript) => print_transcript(&transcript),
                Err(err) => print_error(&err.to_string()),
            },
            ReplInput::Guides(query) => {
                for guide in search_guides(query) {
                    println!("  {}  {}", guide.id.bold(), guide.title);
                }
            }
            ReplInput::Guide(id) => match session.apply_guide(id).await {
                Ok(guide) => {
                    println!("{} {}", "Guide applied:".green(), guide.title);
                    for (index, step) in guide.quick_steps.iter().enumerate() {
                        println!("  {}. {}", index + 1, step);
                    }
                }
                Err(err) => print_error(&err.to_string()),
            },
            ReplInput::GuideOff => match session.clear_guide().await {
                Ok(()) => println!("{}", "Guide removed.".green()),
                Err(err) => print_error(&err.to_string()),
            },
            ReplInput::Help => println!("{HELP}"),
            ReplInput::Quit => break,
            ReplInput::Unknown(input) => print_error(&format!("Unknown command: {input}")),
        }
    }

    Ok(())
}

async fn print_history(session: &ChatSession) {
    let history = session.history().await;
    if history.is_empty() {
        println!("{}", "No saved chats yet.".dimmed());
        return;
    }
    for item in history {
        let marker = if item.is_current { "*" } else { " " };
        println!(
            "{marker} {}  {}  {}",
            item.id.dimmed(),
            format_timestamp(item.timestamp),
            item.title
        );
    }
}

fn print_transcript(lines: &[TranscriptLine]) {
    for line in lines {
        if line.is_user {
            println!("{} {}", "you>".cyan().bold(), line.text);
        } else {
            print_assistant(&line.text);
        }
    }
}

fn print_assistant(text: &str) {
    println!("{} {}", "cirrus>".magenta().bold(), text);
}

fn print_error(text: &str) {
    eprintln!("{} {}", "error:".red().bold(), text);
}
