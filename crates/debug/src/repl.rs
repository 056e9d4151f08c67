// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Binding to the embedded line-oriented debugger.
//!
//! The REPL runs synchronously on the event-loop thread on purpose: while it
//! reads lines, no checkpoint is reached, so no other task in this actor can
//! race it for the terminal. The `continue` and `quit` commands both release
//! the debug lock on the way out, whatever else happens; the breakpoint
//! entry releases again on error paths, which the lock tolerates.

use std::io::Write;
use std::sync::Arc;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use thiserror::Error;
use tracing::error;
use troupe_core::ActorId;

use crate::lock::DebugLock;
use crate::runtime::current_task_name;

/// Errors surfaced by a REPL session.
#[derive(Debug, Error)]
pub enum ReplError {
    /// The user issued `quit`: the task that hit the breakpoint should
    /// unwind rather than resume.
    #[error("debugger quit")]
    Quit,

    #[error("readline failed: {0}")]
    Readline(String),
}

/// A debugger REPL bound to this process's terminal.
pub trait Repl: Send + Sync {
    /// Enter the voluntary-stop REPL. Blocks until the user continues or
    /// quits.
    fn set_trace(&self, actor: &ActorId) -> Result<(), ReplError>;

    /// Enter crash inspection with an error report. Blocks like
    /// [`Repl::set_trace`].
    fn post_mortem(&self, actor: &ActorId, report: &str) -> Result<(), ReplError>;

    /// Flush the REPL's output stream.
    fn flush(&self);

    /// Re-emit the prompt without reading input. Workaround for shells that
    /// eat the prompt when a signal is swallowed mid-session.
    fn redraw_prompt(&self);
}

/// Line-oriented REPL over `rustyline`.
pub struct LineRepl {
    lock: Arc<DebugLock>,
    prompt: String,
}

impl LineRepl {
    pub fn new(lock: Arc<DebugLock>) -> Self {
        Self { lock, prompt: "(troupe-db) ".to_string() }
    }

    /// Release the debug lock; the exit hook of every command that leaves
    /// the REPL.
    fn release(&self) {
        if let Err(e) = self.lock.release(&current_task_name()) {
            error!(error = %e, "debug lock release failed in repl exit hook");
        }
    }

    fn run_loop(&self, banner: &str) -> Result<(), ReplError> {
        let mut editor = match DefaultEditor::new() {
            Ok(editor) => editor,
            Err(e) => {
                self.release();
                return Err(ReplError::Readline(e.to_string()));
            }
        };

        println!("{banner}");

        loop {
            match editor.readline(&self.prompt) {
                Ok(line) => {
                    let _ = editor.add_history_entry(&line);
                    match line.trim() {
                        "" => continue,
                        "c" | "continue" => {
                            self.release();
                            return Ok(());
                        }
                        "q" | "quit" => {
                            self.release();
                            return Err(ReplError::Quit);
                        }
                        "h" | "help" | "?" => {
                            println!("commands: continue (c), quit (q), help (h)");
                        }
                        other => println!("unknown command: {other}"),
                    }
                }
                // the shield swallows tree-level interrupts; one that still
                // reaches readline just redraws the prompt
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => {
                    self.release();
                    return Err(ReplError::Quit);
                }
                Err(e) => {
                    self.release();
                    return Err(ReplError::Readline(e.to_string()));
                }
            }
        }
    }
}

impl Repl for LineRepl {
    fn set_trace(&self, actor: &ActorId) -> Result<(), ReplError> {
        self.run_loop(&format!("\nattaching debugger to actor: {actor}\n"))
    }

    fn post_mortem(&self, actor: &ActorId, report: &str) -> Result<(), ReplError> {
        self.run_loop(&format!("\nattaching to crashed actor: {actor}\n{report}\n"))
    }

    fn flush(&self) {
        let _ = std::io::stdout().flush();
    }

    fn redraw_prompt(&self) {
        print!("{}", self.prompt);
        let _ = std::io::stdout().flush();
    }
}
