use std::io::{BufRead, Write};

use log::debug;

use crate::error::Result;

/// Line-oriented program I/O used by `print`, `inputi` and `inputs`.
pub struct Console<'io> {
    input: &'io mut dyn BufRead,
    output: &'io mut dyn Write,
}

impl<'io> Console<'io> {
    pub fn new(input: &'io mut dyn BufRead, output: &'io mut dyn Write) -> Self {
        Self { input, output }
    }

    /// Emit one line of program output.
    pub fn output(&mut self, line: &str) -> Result<()> {
        debug!("Program output: {}", line);

        writeln!(self.output, "{}", line)?;
        self.output.flush()?;

        Ok(())
    }

    /// Read one line, without its terminator. `None` at end of input.
    pub fn input(&mut self) -> Result<Option<String>> {
        let mut line = String::new();

        if self.input.read_line(&mut line)? == 0 {
            debug!("Program input exhausted");
            return Ok(None);
        }

        let trimmed = line.trim_end_matches(['\n', '\r']).to_string();
        debug!("Program input: {}", trimmed);

        Ok(Some(trimmed))
    }
}
