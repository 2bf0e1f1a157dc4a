//! Interactive shell over a loaded context.
//!
//! Each line is split into words (single and double quotes group words that
//! contain spaces) and parsed with the same grammar as the one-shot
//! subcommands. A failing command prints its error and the loop goes on.

use super::commands::{ViewCommand, execute};
use super::present::OutputSettings;
use clap::{Parser, Subcommand};
use credence::DashboardContext;
use std::io::{self, BufRead, Write};

#[derive(Parser, Debug)]
#[command(name = "credence", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    View(ViewCommand),

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

/// Split a line into words, honouring quotes.
pub(crate) fn tokenize(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("unterminated {q} quote"));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn parse_line(line: &str) -> Result<Option<ShellCommand>, String> {
    let words = tokenize(line)?;
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words)
        .map(|parsed| Some(parsed.command))
        .map_err(|e| e.render().to_string())
}

/// Read commands from standard input until `quit` or end of input.
pub(crate) fn run_shell(
    ctx: &DashboardContext,
    settings: &OutputSettings,
) -> Result<(), Box<dyn std::error::Error>> {
    println!(
        "Credence shell: {} clients loaded. Type `help` for commands, `quit` to leave.",
        ctx.len()
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("credence> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        match parse_line(&line?) {
            Ok(None) => {}
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(ShellCommand::View(command))) => {
                if let Err(e) = execute(ctx, &command, settings) {
                    eprintln!("Error: {}", e);
                }
            }
            Err(message) => eprintln!("{}", message.trim_end()),
        }
    }

    tracing::debug!("shell closed");
    Ok(())
}
