//! Interactive decision prompts

use ripp_core::Candidate;
use std::io::{self, BufRead, Write};

/// Answer to one prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    /// Accept the candidate as shown
    Accept,
    /// Reject the candidate
    Reject,
    /// Leave undecided
    Skip,
    /// Stop prompting; remaining candidates are skipped
    Quit,
}

impl Choice {
    fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "a" | "accept" | "y" | "yes" => Some(Self::Accept),
            "r" | "reject" | "n" | "no" => Some(Self::Reject),
            "s" | "skip" | "" => Some(Self::Skip),
            "q" | "quit" => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Source of per-candidate decisions
pub trait DecisionPrompter {
    /// Ask about candidate `index` of `total`
    ///
    /// # Errors
    /// Returns error if the underlying terminal fails
    fn decide(&mut self, index: usize, total: usize, candidate: &Candidate) -> io::Result<Choice>;
}

/// Line-oriented prompter over any reader and writer
///
/// End of input counts as [`Choice::Quit`].
#[derive(Debug)]
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    /// Create a prompter
    pub const fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the prompter, returning its writer
    pub fn into_output(self) -> W {
        self.output
    }

    fn show(&mut self, index: usize, total: usize, candidate: &Candidate) -> io::Result<()> {
        writeln!(
            self.output,
            "\n[{}/{total}] {} ({}), confidence {}",
            index + 1,
            candidate.section,
            candidate.section.title(),
            candidate.confidence
        )?;
        for evidence in &candidate.evidence {
            match &evidence.snippet {
                Some(snippet) => writeln!(self.output, "  evidence {evidence}  {snippet}")?,
                None => writeln!(self.output, "  evidence {evidence}")?,
            }
        }
        let yaml = serde_yaml::to_string(&candidate.content).unwrap_or_default();
        for line in yaml.lines() {
            writeln!(self.output, "    {line}")?;
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> DecisionPrompter for LinePrompter<R, W> {
    fn decide(&mut self, index: usize, total: usize, candidate: &Candidate) -> io::Result<Choice> {
        self.show(index, total, candidate)?;
        loop {
            write!(self.output, "[a]ccept / [r]eject / [s]kip / [q]uit > ")?;
            self.output.flush()?;
            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(Choice::Quit);
            }
            match Choice::parse(&line) {
                Some(choice) => return Ok(choice),
                None => writeln!(self.output, "unrecognised answer `{}`", line.trim())?,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use ripp_core::SectionName;
    use ripp_test_utils::candidate_set;

    #[test]
    fn answers_are_parsed_and_unknown_input_reprompts() {
        let set = candidate_set(&[SectionName::Purpose]);
        let mut prompter = LinePrompter::new("maybe\nA\n".as_bytes(), Vec::new());
        let choice = prompter.decide(0, 1, &set.candidates[0]).unwrap();
        assert_eq!(choice, Choice::Accept);

        let shown = String::from_utf8(prompter.into_output()).unwrap();
        assert!(shown.contains("[1/1] purpose"));
        assert!(shown.contains("evidence src/app.js:4"));
        assert!(shown.contains("unrecognised answer `maybe`"));
    }

    #[test]
    fn end_of_input_quits() {
        let set = candidate_set(&[SectionName::Purpose]);
        let mut prompter = LinePrompter::new(&b""[..], Vec::new());
        assert_eq!(prompter.decide(0, 1, &set.candidates[0]).unwrap(), Choice::Quit);
    }

    #[test]
    fn blank_line_skips() {
        assert_eq!(Choice::parse("\n"), Some(Choice::Skip));
        assert_eq!(Choice::parse(" r "), Some(Choice::Reject));
        assert_eq!(Choice::parse("later"), None);
    }
}
