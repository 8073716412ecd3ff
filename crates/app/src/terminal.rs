//! Line-based quiz front end over any reader/writer pair.

use std::io::{self, BufRead, Write};

use services::{FinalScore, QuizSession, Selection, Verdict};

/// How an interactive run ended.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Completed(FinalScore),
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Answer(Selection),
    Restart,
    Quit,
}

/// Label shown in front of option `index`: a letter, or the 1-based number
/// past `z`. `parse_input` accepts both forms.
fn option_label(index: usize) -> String {
    match u8::try_from(index) {
        Ok(i) if i < 26 => char::from(b'a' + i).to_string(),
        _ => (index + 1).to_string(),
    }
}

/// Parses `a c`, `ac`, `a,c` or `a 27` into option indices; `-` selects
/// nothing. Numbers are 1-based and must stand alone as a token.
fn parse_input(line: &str, option_count: usize) -> Result<Input, String> {
    let trimmed = line.trim();
    match trimmed {
        "q" | "quit" => return Ok(Input::Quit),
        "r" | "restart" => return Ok(Input::Restart),
        "-" => return Ok(Input::Answer(Selection::new())),
        "" => return Err("type option letters, `-` for none, `r` to restart or `q` to quit".into()),
        _ => {}
    }

    let mut selection = Selection::new();
    let mut select = |index: usize| {
        if !selection.contains(index) {
            selection.toggle(index);
        }
    };
    for token in trimmed.split(|c: char| c.is_whitespace() || c == ',') {
        if token.is_empty() {
            continue;
        }
        if token.bytes().all(|b| b.is_ascii_digit()) {
            let index = token
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=option_count).contains(n))
                .ok_or_else(|| format!("there is no option `{token}`"))?;
            select(index - 1);
            continue;
        }
        for ch in token.chars() {
            if !ch.is_ascii_alphabetic() {
                return Err(format!("`{ch}` is not an option letter"));
            }
            let index = usize::from(ch.to_ascii_lowercase() as u8 - b'a');
            if index >= option_count {
                return Err(format!("there is no option `{ch}`"));
            }
            select(index);
        }
    }
    Ok(Input::Answer(selection))
}

pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }

    /// Walks the user through every unverified question until the run is
    /// complete or the user quits. End of input counts as quitting.
    ///
    /// # Errors
    ///
    /// Returns I/O errors from the underlying reader or writer.
    pub fn run(&mut self, session: &mut QuizSession) -> io::Result<Outcome> {
        loop {
            let next = (0..session.questions().len()).find(|i| !session.is_verified(*i));
            let Some(index) = next else {
                let Some(score) = session.final_score() else {
                    return Ok(Outcome::Quit);
                };
                self.print_final(&score)?;
                writeln!(self.output, "Press `r` to take the test again, anything else to exit.")?;
                match self.read_line()? {
                    Some(line) if line.trim() == "r" => {
                        session.restart();
                        continue;
                    }
                    _ => return Ok(Outcome::Completed(score)),
                }
            };

            self.print_question(session, index)?;
            let option_count = session.question(index).map_or(0, |q| q.options().len());

            let input = loop {
                write!(self.output, "answer> ")?;
                self.output.flush()?;
                let Some(line) = self.read_line()? else {
                    return Ok(Outcome::Quit);
                };
                match parse_input(&line, option_count) {
                    Ok(input) => break input,
                    Err(message) => writeln!(self.output, "{message}")?,
                }
            };

            match input {
                Input::Quit => return Ok(Outcome::Quit),
                Input::Restart => {
                    session.restart();
                    writeln!(self.output, "\nTest restarted.")?;
                }
                Input::Answer(selection) => {
                    // Index comes from the session itself.
                    let verdict = session
                        .verify(index, &selection.indices())
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
                    self.print_verdict(&verdict)?;
                    self.print_progress(session)?;
                }
            }
        }
    }

    fn print_question(&mut self, session: &QuizSession, index: usize) -> io::Result<()> {
        let Some(question) = session.question(index) else {
            return Ok(());
        };
        writeln!(self.output)?;
        writeln!(self.output, "#### {}. {}", index + 1, question.text())?;
        for (i, option) in question.options().iter().enumerate() {
            writeln!(self.output, "  {}) {option}", option_label(i))?;
        }
        Ok(())
    }

    fn print_verdict(&mut self, verdict: &Verdict) -> io::Result<()> {
        match verdict {
            Verdict::Correct => writeln!(self.output, "Correct!"),
            Verdict::Incorrect { correct_options } => {
                writeln!(self.output, "Wrong. Correct answer: {}", correct_options.join(", "))
            }
            Verdict::Unscored => writeln!(
                self.output,
                "This question has no answer marked in the source."
            ),
            Verdict::AlreadyVerified => writeln!(self.output, "Already checked."),
        }
    }

    fn print_progress(&mut self, session: &QuizSession) -> io::Result<()> {
        let progress = session.progress();
        write!(
            self.output,
            "Progress: {}/{} checked, {} correct",
            progress.verified, progress.total, progress.correct
        )?;
        if let Some(accuracy) = session.live_accuracy() {
            write!(self.output, ", accuracy {:.1}%", accuracy * 100.0)?;
        }
        writeln!(self.output)
    }

    fn print_final(&mut self, score: &FinalScore) -> io::Result<()> {
        writeln!(self.output, "\n=== TEST COMPLETE ===")?;
        writeln!(self.output, "Final score: {} / {}", score.correct, score.valid_total)?;
        writeln!(self.output, "Percentage: {:.2}%", score.percentage)?;
        if score.excluded > 0 {
            writeln!(
                self.output,
                "Not scored (no answer marked): {}",
                score.excluded
            )?;
        }
        if score.passed() {
            writeln!(self.output, "PASSED")
        } else {
            writeln!(self.output, "FAILED, try again")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::extract;
    use quiz_core::time::fixed_clock;

    fn session() -> QuizSession {
        let questions = extract("1. Two plus two?\na) 3\nb) 4@\n2. Unmarked\na) x\nb) y\n");
        QuizSession::seeded(questions, 5, fixed_clock()).unwrap()
    }

    fn answers_for(session: &QuizSession) -> String {
        session
            .questions()
            .iter()
            .map(|q| if q.id() == "1" { "b\n" } else { "a\n" })
            .collect()
    }

    #[test]
    fn parses_letter_lists() {
        let expected: Selection = [0, 2].into_iter().collect();
        assert_eq!(parse_input("a c", 3), Ok(Input::Answer(expected.clone())));
        assert_eq!(parse_input("AC", 3), Ok(Input::Answer(expected.clone())));
        assert_eq!(parse_input("a,c,a", 3), Ok(Input::Answer(expected)));
        assert_eq!(parse_input("-", 3), Ok(Input::Answer(Selection::new())));
        assert_eq!(parse_input(" q ", 3), Ok(Input::Quit));
        assert_eq!(parse_input("r", 3), Ok(Input::Restart));
    }

    #[test]
    fn rejects_unknown_letters() {
        assert!(parse_input("d", 3).is_err());
        assert!(parse_input("4", 3).is_err());
        assert!(parse_input("0", 3).is_err());
        assert!(parse_input("a1", 3).is_err());
        assert!(parse_input("?", 3).is_err());
        assert!(parse_input("99999999999999999999999", 3).is_err());
        assert!(parse_input("", 3).is_err());
    }

    #[test]
    fn every_printed_label_selects_its_option() {
        for index in 0..30 {
            let label = option_label(index);
            let expected: Selection = [index].into_iter().collect();
            assert_eq!(
                parse_input(&label, 30),
                Ok(Input::Answer(expected)),
                "label {label}"
            );
        }
        let mixed: Selection = [1, 26, 29].into_iter().collect();
        assert_eq!(parse_input("b 27,30", 30), Ok(Input::Answer(mixed)));
    }

    #[test]
    fn labels_fall_back_to_numbers() {
        assert_eq!(option_label(0), "a");
        assert_eq!(option_label(25), "z");
        assert_eq!(option_label(26), "27");
    }

    #[test]
    fn full_run_reports_score() {
        let mut session = session();
        let input = answers_for(&session);
        let mut output = Vec::new();
        let outcome = Terminal::new(input.as_bytes(), &mut output)
            .run(&mut session)
            .unwrap();

        let Outcome::Completed(score) = outcome else {
            panic!("expected completion, got {outcome:?}");
        };
        assert_eq!(score.correct, 1);
        assert_eq!(score.valid_total, 1);
        assert_eq!(score.excluded, 1);

        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Correct!"));
        assert!(text.contains("no answer marked in the source"));
        assert!(text.contains("Final score: 1 / 1"));
        assert!(text.contains("PASSED"));
    }

    #[test]
    fn bad_input_is_reprompted() {
        let mut session = session();
        let input = format!("zz\n{}", answers_for(&session));
        let mut output = Vec::new();
        let outcome = Terminal::new(input.as_bytes(), &mut output)
            .run(&mut session)
            .unwrap();
        assert!(matches!(outcome, Outcome::Completed(_)));
        assert!(String::from_utf8(output).unwrap().contains("there is no option `z`"));
    }

    #[test]
    fn restart_command_starts_new_run() {
        let mut session = session();
        let first = answers_for(&session);
        let first_answer = first.lines().next().unwrap_or_default();
        let input = format!("{first_answer}\nr\nq\n");
        let mut output = Vec::new();
        let outcome = Terminal::new(input.as_bytes(), &mut output)
            .run(&mut session)
            .unwrap();
        assert_eq!(outcome, Outcome::Quit);
        assert_eq!(session.session_id().value(), 1);
        assert_eq!(session.progress().verified, 0);
    }

    #[test]
    fn end_of_input_quits() {
        let mut session = session();
        let mut output = Vec::new();
        let outcome = Terminal::new(&b""[..], &mut output).run(&mut session).unwrap();
        assert_eq!(outcome, Outcome::Quit);
    }
}
