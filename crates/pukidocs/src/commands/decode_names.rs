//! Hex page name decoding filter.

use std::io::{self, BufRead, Write};

use anyhow::Result;
use pukidocs_wiki::decode_hex_runs;

/// Decode every line of stdin to stdout.
pub fn run() -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    decode_lines(stdin.lock(), stdout.lock())?;
    Ok(())
}

fn decode_lines<R: BufRead, W: Write>(input: R, mut output: W) -> io::Result<()> {
    for line in input.lines() {
        writeln!(output, "{}", decode_hex_runs(&line?))?;
    }
    output.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decodes_listing() {
        let input = "46726F6E7450616765.txt\nREADME\n";
        let mut output = Vec::new();

        decode_lines(input.as_bytes(), &mut output).unwrap();

        assert_eq!(String::from_utf8(output).unwrap(), "FrontPage.txt\nREADME\n");
    }
}
