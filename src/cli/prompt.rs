//! Line-based interactive prompts

use std::io::{BufRead, Write};

use anyhow::{Context, bail};

/// Questions asked during interactive selection and confirmation
pub trait Prompt {
    /// Index of the option the user picked
    fn select(&mut self, title: &str, options: &[String]) -> anyhow::Result<usize>;

    fn confirm(&mut self, question: &str) -> anyhow::Result<bool>;
}

/// Prompt reading answers line by line from `input`
pub struct LinePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_answer(&mut self) -> anyhow::Result<Option<String>> {
        self.output.flush()?;
        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .context("Failed to read answer")?;
        Ok((read > 0).then(|| line.trim().to_string()))
    }
}

impl<R: BufRead, W: Write> Prompt for LinePrompt<R, W> {
    fn select(&mut self, title: &str, options: &[String]) -> anyhow::Result<usize> {
        if options.is_empty() {
            bail!("Nothing to choose from for: {title}");
        }

        writeln!(self.output, "{title}")?;
        for (index, option) in options.iter().enumerate() {
            writeln!(self.output, "  {:>2}) {}", index + 1, option)?;
        }

        loop {
            write!(self.output, "Enter a number (1-{}): ", options.len())?;
            let Some(answer) = self.read_answer()? else {
                bail!("No selection made. Pass the value as an argument instead of using -i");
            };
            match answer.parse::<usize>() {
                Ok(choice) if (1..=options.len()).contains(&choice) => return Ok(choice - 1),
                _ => writeln!(self.output, "Invalid choice: {answer}")?,
            }
        }
    }

    fn confirm(&mut self, question: &str) -> anyhow::Result<bool> {
        write!(self.output, "{question} [y/N] ")?;
        let answer = self.read_answer()?.unwrap_or_default();
        Ok(matches!(answer.to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}
