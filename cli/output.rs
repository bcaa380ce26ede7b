use anyhow::{Context, Result};
use std::io::{self, Write};

/// Writes `content` to stdout, adding a trailing newline when missing.
pub fn write_to_stdout(content: &str) -> Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_with_newline(&mut handle, content).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn write_with_newline<W: Write>(out: &mut W, content: &str) -> io::Result<()> {
    out.write_all(content.as_bytes())?;
    if !content.ends_with('\n') {
        out.write_all(b"\n")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_missing_newline() {
        let mut buf = Vec::new();
        write_with_newline(&mut buf, "abc").unwrap();
        assert_eq!(buf, b"abc\n");
    }

    #[test]
    fn keeps_existing_newline() {
        let mut buf = Vec::new();
        write_with_newline(&mut buf, "abc\n").unwrap();
        assert_eq!(buf, b"abc\n");
    }
}
