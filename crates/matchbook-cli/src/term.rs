//! Small terminal helpers: colored output and line prompts.

use std::io::{self, Write};

use crossterm::style::{style, Color, Stylize};

/// Console writer with optional ANSI colors.
pub struct Term {
    colored: bool,
}

impl Term {
    pub fn new(colored: bool) -> Self {
        Term { colored }
    }

    pub fn paint(&self, text: &str, color: Color) -> String {
        if self.colored {
            style(text).with(color).to_string()
        } else {
            text.to_string()
        }
    }

    /// Menu / heading line (cyan).
    pub fn heading(&self, text: &str) {
        println!("{}", self.paint(text, Color::Cyan));
    }

    /// Success line (green).
    pub fn notice(&self, text: &str) {
        println!("{}", self.paint(text, Color::Green));
    }

    /// Problem line (red).
    pub fn warn(&self, text: &str) {
        println!("{}", self.paint(text, Color::Red));
    }

    /// Print `label`, flush, and read one trimmed line from stdin.
    /// `None` means stdin reached end-of-file.
    pub fn prompt(&self, label: &str) -> io::Result<Option<String>> {
        print!("{}", self.paint(label, Color::Yellow));
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }
}
