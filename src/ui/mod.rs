//! User interface module - interaction (prompts) and formatting.
//!
//! Separates concerns:
//! - `formatter` - Pure formatting functions
//! - This module - The release confirmation prompt

use std::cell::RefCell;
use std::io::{self, BufRead, Write};

use crate::domain::Version;

pub mod formatter;

// Re-export formatter functions for convenience
pub use formatter::{
    display_boundary_warning, display_error, display_manual_recovery, display_proposed_release,
    display_status, display_success,
};

/// Asks the operator whether a release should go ahead
pub trait Prompter {
    /// Blocks until the operator answers.
    ///
    /// # Returns
    /// * `true` - Proceed with releasing `version`
    /// * `false` - Cancel; nothing has been changed yet
    fn confirm_release(&self, version: &Version) -> bool;
}

/// Decide what a line read from the operator means.
///
/// Only an empty line (ENTER) confirms. Any other text, end of input, or a
/// read error cancels.
pub fn interpret_confirmation(read: io::Result<usize>, line: &str) -> bool {
    match read {
        Ok(0) => {
            log::debug!("Confirmation input closed");
            false
        }
        Ok(_) => line.trim().is_empty(),
        Err(e) => {
            log::warn!("Could not read confirmation: {}", e);
            false
        }
    }
}

/// Prompts on stdout and reads the answer from any line source
pub struct LinePrompter<R> {
    input: RefCell<R>,
}

impl<R: BufRead> LinePrompter<R> {
    pub fn new(input: R) -> Self {
        LinePrompter {
            input: RefCell::new(input),
        }
    }
}

impl<R: BufRead> Prompter for LinePrompter<R> {
    fn confirm_release(&self, version: &Version) -> bool {
        print!(
            "\nVERIFICATION: Release new version '{}'? (ENTER to continue, Ctrl-C to quit) ",
            version
        );
        let _ = io::stdout().flush();

        let mut line = String::new();
        let read = self.input.borrow_mut().read_line(&mut line);
        interpret_confirmation(read, &line)
    }
}

/// Prompter reading from the process's standard input
pub type StdinPrompter = LinePrompter<io::StdinLock<'static>>;

impl StdinPrompter {
    pub fn stdin() -> Self {
        LinePrompter::new(io::stdin().lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_empty_line_confirms() {
        let prompter = LinePrompter::new(Cursor::new("\n"));
        assert!(prompter.confirm_release(&Version::new(1, 0, 0)));
    }

    #[test]
    fn test_other_input_cancels() {
        let prompter = LinePrompter::new(Cursor::new("no\n"));
        assert!(!prompter.confirm_release(&Version::new(1, 0, 0)));
    }

    #[test]
    fn test_end_of_input_cancels() {
        let prompter = LinePrompter::new(Cursor::new(""));
        assert!(!prompter.confirm_release(&Version::new(1, 0, 0)));
    }

    #[test]
    fn test_read_error_cancels() {
        let err = io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8");
        assert!(!interpret_confirmation(Err(err), ""));
    }

    #[test]
    fn test_whitespace_only_line_confirms() {
        assert!(interpret_confirmation(Ok(3), "  \n"));
    }
}
