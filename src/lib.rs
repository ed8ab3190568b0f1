pub mod ast;
pub mod console;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod object;
pub mod parser;
pub mod scanner;
pub mod token;
pub mod value;

use std::io::{BufRead, Write};

use console::Console;
use error::Result;
use interpreter::Interpreter;

/// Parse `source` and run its `main()` against the given program I/O.
pub fn run_source(source: &str, input: &mut dyn BufRead, output: &mut dyn Write) -> Result<()> {
    let program = parser::parse_program(source)?;
    let mut interpreter = Interpreter::new(&program, Console::new(input, output));

    interpreter.run()
}
