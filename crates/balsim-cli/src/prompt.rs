//! Interactive prompts for run parameters not supplied on the command line.

use std::io::{BufRead, Write};

use anyhow::{Context, bail};

/// Ask for a positive integer. Re-asks on unparseable input or 0; end of
/// input is an error.
pub fn ask_u32<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> anyhow::Result<u32> {
    loop {
        let line = ask_line(input, out, question)?;
        match line.trim().parse::<u32>() {
            Ok(0) => writeln!(out, "Please enter a number of at least 1.")?,
            Ok(value) => return Ok(value),
            Err(_) => writeln!(out, "Please enter a whole number.")?,
        }
    }
}

/// Ask for a line of text, trimmed. Returns `default` for an empty answer.
pub fn ask_or_default<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    question: &str,
    default: &str,
) -> anyhow::Result<String> {
    let line = ask_line(input, out, question)?;
    let line = line.trim();
    Ok(if line.is_empty() { default } else { line }.to_string())
}

fn ask_line<R: BufRead, W: Write>(input: &mut R, out: &mut W, question: &str) -> anyhow::Result<String> {
    write!(out, "{question}")?;
    out.flush()?;
    let mut line = String::new();
    let read = input.read_line(&mut line).context("failed to read from stdin")?;
    if read == 0 {
        bail!("unexpected end of input while waiting for: {}", question.trim());
    }
    Ok(line)
}
