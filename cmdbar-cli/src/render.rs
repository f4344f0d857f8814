//! Line builders for the help view and the transcript.
//!
//! Everything here is pure: the REPL decides where the lines go.

use cmdbar_core::{ConsoleState, TranscriptEntry};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const HIGHLIGHT: &str = "\x1b[1;4;33m";
const DIM: &str = "\x1b[90m";
const RESET: &str = "\x1b[0m";

/// Declared arguments with the one under the cursor highlighted.
///
/// `None` when the first token is not a known command.
pub fn argument_suggestion(state: &ConsoleState) -> Option<String> {
    let declared = state.declared_args();
    if declared.is_empty() {
        return None;
    }
    let parts: Vec<String> = declared
        .iter()
        .enumerate()
        .map(|(i, arg)| {
            if i == state.current_arg() {
                format!("{HIGHLIGHT}{arg}{RESET}")
            } else {
                arg.clone()
            }
        })
        .collect();
    Some(format!("Argument suggestion: {}", parts.join(" ")))
}

/// Signature help is only worth showing when it carries a return arrow.
pub fn signature_line(state: &ConsoleState) -> Option<String> {
    state
        .signature_help()
        .filter(|help| help.contains("->"))
        .map(|help| format!("Signature help: {help}"))
}

pub fn description_line(state: &ConsoleState) -> Option<String> {
    state
        .description()
        .map(|desc| format!("{DIM}# {desc}{RESET}"))
}

/// The displayed candidates as a JSON array, capped at `max_visible`.
pub fn available_line(state: &ConsoleState, max_visible: usize) -> String {
    let available = state.available();
    let shown = &available[..available.len().min(max_visible)];
    let json = serde_json::to_string(shown).unwrap_or_else(|_| "[]".to_string());
    let hidden = available.len() - shown.len();
    if hidden > 0 {
        format!("Available Commands: {json} {DIM}(+{hidden} more){RESET}")
    } else {
        format!("Available Commands: {json}")
    }
}

/// Every help line for the current state, top to bottom.
pub fn help_lines(state: &ConsoleState, max_visible: usize) -> Vec<String> {
    let mut lines = Vec::with_capacity(4);
    lines.extend(argument_suggestion(state));
    lines.extend(signature_line(state));
    lines.extend(description_line(state));
    lines.push(available_line(state, max_visible));
    lines
}

pub fn transcript_lines(entry: &TranscriptEntry) -> [String; 2] {
    [format!("$ {}", entry.command), entry.result.clone()]
}

/// Cut `line` to at most `width` terminal columns.
///
/// Escape sequences are copied through without counting towards the width.
pub fn fit_width(line: &str, width: usize) -> String {
    let mut out = String::with_capacity(line.len());
    let mut used = 0;
    let mut in_escape = false;
    let mut truncated = false;
    for ch in line.chars() {
        if in_escape {
            out.push(ch);
            in_escape = !ch.is_ascii_alphabetic();
            continue;
        }
        if ch == '\x1b' {
            out.push(ch);
            in_escape = true;
            continue;
        }
        let w = ch.width().unwrap_or(0);
        if used + w > width {
            truncated = true;
            break;
        }
        used += w;
        out.push(ch);
    }
    if truncated && out.contains('\x1b') {
        out.push_str(RESET);
    }
    out
}

/// Keep the end of `input` within `width` columns, marking cut text with `…`.
///
/// The prompt keeps the cursor at the end of the input, so the tail is what
/// the operator needs to see.
pub fn fit_tail(input: &str, width: usize) -> String {
    if input.width() <= width {
        return input.to_string();
    }
    let budget = width.saturating_sub(1);
    let mut used = 0;
    let mut start = input.len();
    for (idx, ch) in input.char_indices().rev() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        start = idx;
    }
    format!("…{}", &input[start..])
}
