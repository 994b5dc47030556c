use colored::Colorize;

use crate::client::events::Event;
use crate::error::PlayauthError;
use crate::oauth::token::{TokenRecord, TokenState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Pretty,
    Json,
}

/// Render one event the way it is printed.
pub fn format_event(event: &Event, is_tty: bool) -> String {
    let text = match &event.value {
        serde_json::Value::String(text) => text.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    };
    let at = event.at.format("%H:%M:%S").to_string();
    if !is_tty {
        return format!("{at} {text}");
    }
    if event.is_error {
        format!("{} {}", at.dimmed(), text.red())
    } else {
        format!("{} {}", at.dimmed(), text)
    }
}

pub fn print_events(events: &[Event], mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => {
            for event in events {
                println!("{}", serde_json::to_string(event).unwrap_or_default());
            }
        }
        OutputMode::Pretty => {
            for event in events {
                if event.is_error {
                    eprintln!("{}", format_event(event, is_tty));
                } else {
                    println!("{}", format_event(event, is_tty));
                }
            }
        }
    }
}

pub fn describe_state(state: TokenState) -> &'static str {
    match state {
        TokenState::NoToken => "no token",
        TokenState::Expired => "expired",
        TokenState::Valid => "valid",
    }
}

pub fn print_token(token: &TokenRecord, state: TokenState, mode: OutputMode, is_tty: bool) {
    match mode {
        OutputMode::Json => {
            let json = serde_json::json!({
                "token": token,
                "state": describe_state(state),
            });
            println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        }
        OutputMode::Pretty => {
            let label = describe_state(state);
            let label = if !is_tty {
                label.to_string()
            } else if state == TokenState::Valid {
                label.green().to_string()
            } else {
                label.yellow().to_string()
            };
            println!("state:         {label}");
            println!(
                "access_token:  {}",
                token.access_token.as_deref().unwrap_or("-")
            );
            println!(
                "refresh_token: {}",
                token.refresh_token.as_deref().unwrap_or("-")
            );
            match token.expires_at {
                Some(at) => println!("expires_at:    {}", at.to_rfc3339()),
                None => println!("expires_at:    -"),
            }
        }
    }
}

pub fn print_error(err: &PlayauthError, json_mode: bool) {
    if json_mode {
        println!("{}", serde_json::to_string_pretty(&err.to_json()).unwrap_or_default());
    } else {
        eprintln!("{}", err);
    }
}
