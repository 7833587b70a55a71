//! Interactive placeholder prompts

use std::io::{self, BufRead, Write};

use crate::template::{ResolveError, ValueResolver, NUMBER_PRECISION};

/// Asks for placeholder values line by line
///
/// End of input cancels the operation. Numbers are re-asked until they parse.
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl PromptResolver<io::StdinLock<'static>, io::Stderr> {
    /// Prompt on the terminal: read stdin, write prompts to stderr
    pub fn terminal() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output sink, e.g. to inspect prompts in tests
    pub fn into_output(self) -> W {
        self.output
    }

    fn ask(&mut self, prompt: &str) -> Result<String, ResolveError> {
        write!(self.output, "{prompt}").map_err(failed)?;
        self.output.flush().map_err(failed)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(failed)?;
        if read == 0 {
            return Err(ResolveError::Cancelled);
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }
}

impl<R: BufRead, W: Write> ValueResolver for PromptResolver<R, W> {
    fn resolve_text(&mut self, name: &str) -> Result<String, ResolveError> {
        self.ask(&format!("Enter value for {name}: "))
    }

    fn resolve_number(&mut self, name: &str) -> Result<f64, ResolveError> {
        loop {
            let answer = self.ask(&format!(
                "Enter number for {name} (up to {NUMBER_PRECISION} decimals): "
            ))?;
            match answer.trim().parse::<f64>() {
                Ok(value) if value.is_finite() => return Ok(value),
                _ => {
                    writeln!(self.output, "'{}' is not a number", answer.trim()).map_err(failed)?;
                }
            }
        }
    }
}

fn failed(err: io::Error) -> ResolveError {
    ResolveError::Failed(err.to_string())
}
