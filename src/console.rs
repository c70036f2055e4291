//! Line-oriented terminal IO.
use crate::error::Result;
use std::io::{BufRead, Write};

/// Prompts on `out`, reads answers from `input`.
pub struct Console<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, out: W) -> Self {
        Self { input, out }
    }

    pub fn say(&mut self, text: impl AsRef<str>) -> Result<()> {
        writeln!(self.out, "{}", text.as_ref())?;
        Ok(())
    }

    pub fn blank(&mut self) -> Result<()> {
        writeln!(self.out)?;
        Ok(())
    }

    /// Shows `message` and returns the trimmed reply, or `None` once input is exhausted.
    pub fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.out, "{}", message)?;
        self.out.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Asks until the reply is `y` or `n`.
    pub fn confirm(&mut self, message: &str) -> Result<Option<bool>> {
        loop {
            let Some(reply) = self.prompt(message)? else {
                return Ok(None);
            };
            match reply.to_lowercase().as_str() {
                "y" | "yes" => return Ok(Some(true)),
                "n" | "no" => return Ok(Some(false)),
                _ => self.say("Please answer 'y' or 'n'.")?,
            }
        }
    }

    pub fn into_output(self) -> W {
        self.out
    }
}
