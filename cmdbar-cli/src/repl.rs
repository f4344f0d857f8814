//! Interactive console loop.
//!
//! Runs the terminal in raw mode and multiplexes two sources with
//! `tokio::select!`: key events from crossterm and command results coming
//! back from the session. The prompt sits on one line with the help view
//! drawn underneath it; results are printed above the prompt.

use std::io::{self, Write};

use cmdbar_core::config::UiConfig;
use cmdbar_core::{ConsoleEvent, ConsoleSession};
use crossterm::event::{
    DisableBracketedPaste, EnableBracketedPaste, Event, EventStream, KeyEventKind,
};
use crossterm::{execute, terminal};
use futures::StreamExt;

use crate::keys::{KeyAction, map_key, paste};
use crate::render;

const PROMPT_WIDTH: usize = 2;

/// Draws the prompt and the help view, remembering how many help lines
/// are on screen so they can be wiped before the next frame.
struct Screen {
    ui: UiConfig,
    rendered_lines: usize,
}

impl Screen {
    fn new(ui: UiConfig) -> Self {
        Self {
            ui,
            rendered_lines: 0,
        }
    }

    fn width() -> usize {
        terminal::size().map(|(w, _)| w as usize).unwrap_or(80)
    }

    /// Wipe the help lines below the prompt.
    fn clear_help(&mut self, stdout: &mut impl Write) -> io::Result<()> {
        if self.rendered_lines > 0 {
            for _ in 0..self.rendered_lines {
                write!(stdout, "\r\n\x1b[2K")?;
            }
            write!(stdout, "\x1b[{}A", self.rendered_lines)?;
            self.rendered_lines = 0;
        }
        Ok(())
    }

    fn redraw(&mut self, session: &ConsoleSession) -> io::Result<()> {
        let mut stdout = io::stdout();
        self.clear_help(&mut stdout)?;
        let width = Self::width();
        let state = session.state();

        let lines = render::help_lines(state, self.ui.max_visible_candidates);
        for line in &lines {
            write!(stdout, "\r\n\x1b[2K{}", render::fit_width(line, width))?;
        }
        if !lines.is_empty() {
            write!(stdout, "\x1b[{}A", lines.len())?;
        }
        self.rendered_lines = lines.len();

        // Prompt, input and cursor must fit on one row or the help lines drift.
        let input = render::fit_tail(state.input(), width.saturating_sub(PROMPT_WIDTH + 1));
        write!(stdout, "\r\x1b[2K\x1b[1;34m> \x1b[0m{input}")?;
        stdout.flush()
    }

    /// Print lines above the prompt. The prompt is redrawn afterwards.
    fn print_above(&mut self, lines: &[String]) -> io::Result<()> {
        let mut stdout = io::stdout();
        self.clear_help(&mut stdout)?;
        write!(stdout, "\r\x1b[2K")?;
        for line in lines {
            write!(stdout, "{line}\r\n")?;
        }
        stdout.flush()
    }

    /// Leave the cursor on a fresh line below the help view.
    fn finish(&mut self) -> io::Result<()> {
        let mut stdout = io::stdout();
        self.clear_help(&mut stdout)?;
        write!(stdout, "\r\n")?;
        stdout.flush()
    }
}

/// Run the console until the user quits.
pub async fn run(session: &mut ConsoleSession, ui: &UiConfig) -> anyhow::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(io::stdout(), EnableBracketedPaste)?;
    let mut screen = Screen::new(ui.clone());
    let result = event_loop(session, &mut screen, ui.show_transcript).await;
    let finished = screen.finish();
    execute!(io::stdout(), DisableBracketedPaste)?;
    terminal::disable_raw_mode()?;
    finished?;
    result
}

async fn event_loop(
    session: &mut ConsoleSession,
    screen: &mut Screen,
    show_transcript: bool,
) -> anyhow::Result<()> {
    let mut events = EventStream::new();
    screen.redraw(session)?;

    loop {
        tokio::select! {
            maybe_event = events.next() => {
                let Some(event) = maybe_event else {
                    break;
                };
                let console_event = match event? {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        match map_key(&key, session.state().input()) {
                            KeyAction::Console(console_event) => console_event,
                            KeyAction::Quit => {
                                session.cancel_pending();
                                break;
                            }
                            KeyAction::Ignore => continue,
                        }
                    }
                    Event::Paste(text) => paste(session.state().input(), &text),
                    Event::Resize(..) => {
                        screen.redraw(session)?;
                        continue;
                    }
                    _ => continue,
                };

                let submitted = matches!(console_event, ConsoleEvent::Submit)
                    .then(|| session.state().input().to_string());
                session.handle(console_event);
                session.handle(ConsoleEvent::KeyRelease);

                if let Some(line) = submitted
                    && let Some(hint) = unknown_command_hint(session, &line)
                {
                    screen.print_above(&[hint])?;
                }
                screen.redraw(session)?;
            }
            Some(merged) = session.next_response() => {
                match merged {
                    Ok(entry) if show_transcript => {
                        screen.print_above(&render::transcript_lines(&entry))?;
                    }
                    Ok(_) => {}
                    Err(e) => screen.print_above(&[format!("\x1b[31merror:\x1b[0m {e}")])?,
                }
                screen.redraw(session)?;
            }
        }
    }
    Ok(())
}

/// A "did you mean" line for a submitted command the registry does not know.
fn unknown_command_hint(session: &ConsoleSession, line: &str) -> Option<String> {
    let name = session.tokenizer().command_name(line);
    let registry = session.registry();
    if name.is_empty() || registry.is_empty() || registry.spec(&name).is_some() {
        return None;
    }
    registry
        .suggest(&name)
        .map(|suggestion| format!("Unknown command '{name}'. Did you mean '{suggestion}'?"))
}
