use camino::Utf8Path;
use std::io::{self, BufRead, Write};
use treeskel_config::is_confirm_reply;
use treeskel_pipeline::ConfirmPort;

/// Asks on stderr and reads the answer from stdin. End of input means no.
pub struct StdinPrompt;

impl ConfirmPort for StdinPrompt {
    fn confirm_non_empty_target(&self, target: &Utf8Path) -> bool {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        ask(target, &mut input, &mut io::stderr()).unwrap_or(false)
    }
}

pub fn ask<R: BufRead, W: Write>(
    target: &Utf8Path,
    input: &mut R,
    output: &mut W,
) -> io::Result<bool> {
    write!(output, "Target directory {} is not empty. Continue? [y/N] ", target)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        writeln!(output)?;
        return Ok(false);
    }
    Ok(is_confirm_reply(&line))
}
