use crossterm::style::Stylize;
use std::io::{self, BufRead, StdinLock, Write};

/// Asks the operator whether a step may run.
pub trait StepConfirmer {
    fn confirm(&mut self, question: &str) -> io::Result<bool>;

    /// Releases any input handle. Calling it twice is harmless.
    fn close(&mut self) {}
}

/// Approves every step without asking.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl StepConfirmer for AutoApprove {
    fn confirm(&mut self, _question: &str) -> io::Result<bool> {
        Ok(true)
    }
}

/// Reads `y/N` answers from stdin. The stdin lock is only taken on the first
/// question and dropped again by `close`.
#[derive(Default)]
pub struct TerminalConfirmer {
    input: Option<StdinLock<'static>>,
}

impl TerminalConfirmer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.input.is_some()
    }
}

impl StepConfirmer for TerminalConfirmer {
    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let input = self.input.get_or_insert_with(|| io::stdin().lock());
        read_confirmation(input, &mut io::stdout(), question)
    }

    fn close(&mut self) {
        self.input = None;
    }
}

/// Anything starting with `y` (any case) approves; end of input refuses.
pub fn read_confirmation(
    input: &mut impl BufRead,
    output: &mut impl Write,
    question: &str,
) -> io::Result<bool> {
    write!(output, "{} ", format!("{question} (y/N):").yellow())?;
    output.flush()?;

    let mut answer = String::new();
    if input.read_line(&mut answer)? == 0 {
        return Ok(false);
    }
    Ok(answer.to_lowercase().starts_with('y'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn answer(raw: &str) -> bool {
        let mut output = Vec::new();
        read_confirmation(&mut Cursor::new(raw.as_bytes()), &mut output, "Execute this step?")
            .expect("confirmation")
    }

    #[test]
    fn only_answers_starting_with_y_approve() {
        assert!(answer("y\n"));
        assert!(answer("Yes please\n"));
        assert!(!answer("n\n"));
        assert!(!answer("\n"));
        assert!(!answer("sure\n"));
        assert!(!answer(" y\n"));
        assert!(answer("Y\r\n"));
    }

    #[test]
    fn closed_input_refuses() {
        assert!(!answer(""));
    }

    #[test]
    fn terminal_confirmer_close_is_idempotent() {
        let mut confirmer = TerminalConfirmer::new();
        confirmer.close();
        confirmer.close();
        assert!(!confirmer.is_open());
    }
}
