pub mod prompt;

use std::collections::VecDeque;
use std::io::Write;
use std::process::ExitCode;

use chrono::Local;
use color_print::cformat;
use eyre::Result;
use rustyline::error::ReadlineError;
use tracing::debug;

use crate::conversation::session::Turn;
use crate::conversation::{AnswerOutcome, CompletionReport, ConversationController, FlowState};
use crate::error::FlowError;
use crate::gemini_client::TextGenerator;
use prompt::generate_prompt;

pub const WELCOME_TEXT: &str = "
Hi, I'm Linkle. Tell me a little about someone you'd like to reconnect with,
and I'll suggest a few ways to start the conversation.

Answer each question in a sentence or two. When every question is answered,
type /done to get your conversation starters.

/help         Show the help dialogue
/quit         Quit the application
";

const HELP_TEXT: &str = "
Linkle

/done         Generate conversation starters (or retry after a failure)
/restart      Start the questions over
/help         Show this help dialogue
/quit         Quit the application
";

pub struct ChatContext<G> {
    output: Box<dyn Write>,
    /// Pre-supplied answers; when non-empty the chat runs without prompting.
    answers: VecDeque<String>,
    scripted: bool,
    show_welcome: bool,
    controller: ConversationController<G>,
}

impl<G: TextGenerator> ChatContext<G> {
    pub fn new(
        output: Box<dyn Write>,
        answers: Vec<String>,
        show_welcome: bool,
        controller: ConversationController<G>,
    ) -> Self {
        Self {
            output,
            scripted: !answers.is_empty(),
            answers: answers.into(),
            show_welcome,
            controller,
        }
    }

    pub async fn run(&mut self, name: &str) -> Result<ExitCode> {
        if self.show_welcome {
            writeln!(self.output, "{}", WELCOME_TEXT)?;
        }

        let first = self.controller.set_subject(name).to_string();
        self.print_question(&first)?;

        if self.scripted {
            let answers = std::mem::take(&mut self.answers);
            return self.run_scripted(answers).await;
        }
        self.run_interactive().await
    }

    async fn run_scripted(&mut self, answers: VecDeque<String>) -> Result<ExitCode> {
        for answer in answers {
            writeln!(self.output, "> {}", answer)?;
            if !self.submit(&answer).await? {
                return Ok(ExitCode::FAILURE);
            }
        }

        match self.controller.complete().await {
            Ok(report) => {
                self.print_report(&report)?;
                Ok(ExitCode::SUCCESS)
            }
            Err(e) => {
                writeln!(self.output, "{}", cformat!("<red>Could not create suggestions:</red> {}", e))?;
                Ok(ExitCode::FAILURE)
            }
        }
    }

    async fn run_interactive(&mut self) -> Result<ExitCode> {
        let mut rl = prompt::rl()?;

        loop {
            let readline = rl.readline(&generate_prompt(None));

            let line = match readline {
                Ok(line) => line,
                Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
                Err(e) => {
                    writeln!(self.output, "Error: {}", e)?;
                    break;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            rl.add_history_entry(line.as_str());

            match line.trim() {
                "/quit" => break,
                "/help" => writeln!(self.output, "{}", HELP_TEXT)?,
                "/restart" => {
                    let first = self.controller.restart()?.to_string();
                    writeln!(self.output, "Starting over.")?;
                    self.print_question(&first)?;
                }
                "/done" => {
                    if self.complete().await? {
                        return Ok(ExitCode::SUCCESS);
                    }
                }
                answer => {
                    self.submit(answer).await?;
                }
            }
        }

        Ok(ExitCode::SUCCESS)
    }

    /// Returns whether the answer was accepted.
    async fn submit(&mut self, answer: &str) -> Result<bool> {
        let outcome = match self.controller.submit_answer(answer).await {
            Ok(outcome) => outcome,
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                return Ok(false);
            }
        };

        match outcome {
            AnswerOutcome::NextQuestion { text, warning } => {
                if let Some(warning) = warning {
                    writeln!(self.output, "{}", cformat!("<yellow>Warning:</yellow> {}", warning))?;
                }
                self.print_question(&text)?;
            }
            AnswerOutcome::AllAnswered if !self.scripted => {
                writeln!(
                    self.output,
                    "All questions answered. Type /done to get your conversation starters."
                )?;
            }
            AnswerOutcome::AllAnswered => {}
        }
        Ok(true)
    }

    /// Returns true once suggestions were shown.
    async fn complete(&mut self) -> Result<bool> {
        writeln!(self.output, "Thinking of conversation starters...")?;
        match self.controller.complete().await {
            Ok(report) => {
                self.print_report(&report)?;
                Ok(true)
            }
            Err(FlowError::Completion(e)) => {
                writeln!(self.output, "{}", cformat!("<red>Could not create suggestions:</red> {}", e))?;
                if matches!(self.controller.state(), FlowState::Failed(_)) {
                    writeln!(self.output, "Type /done to try again.")?;
                }
                Ok(false)
            }
            Err(e) => {
                writeln!(self.output, "{}", e)?;
                Ok(false)
            }
        }
    }

    fn print_question(&mut self, text: &str) -> Result<()> {
        if let Some(snapshot) = self.controller.snapshot() {
            let turn = snapshot.turns.last().map(Turn::label).unwrap_or_default();
            debug!(turn = %turn, total = snapshot.total, "Asking question");
            writeln!(
                self.output,
                "{}",
                cformat!("<bold>[{}/{}]</bold> {}", snapshot.index + 1, snapshot.total, text)
            )?;
        }
        Ok(())
    }

    fn print_report(&mut self, report: &CompletionReport) -> Result<()> {
        let suggestions = &report.suggestions;

        writeln!(self.output)?;
        if let Some(snapshot) = self.controller.snapshot() {
            let elapsed = report.generated_at - snapshot.started_at;
            debug!(elapsed_secs = elapsed.num_seconds(), "Conversation finished");
        }
        let generated = report.generated_at.with_timezone(&Local);

        writeln!(self.output, "{}", cformat!("<bold>About you and {}</bold>", report.subject))?;
        if report.summary.degraded {
            writeln!(self.output, "{}", cformat!("<yellow>{}</yellow>", report.summary.text))?;
        } else {
            writeln!(self.output, "{}", report.summary.text)?;
        }
        writeln!(self.output, "Generated {}", generated.format("%Y-%m-%d %H:%M"))?;

        if suggestions.needs_raw_fallback() {
            writeln!(self.output)?;
            writeln!(self.output, "{}", suggestions.raw_text)?;
            return Ok(());
        }
        if suggestions.starters.is_empty() && suggestions.topics.is_empty() {
            writeln!(self.output, "[no response]")?;
            return Ok(());
        }

        writeln!(self.output)?;
        writeln!(self.output, "{}", cformat!("<green><bold>Conversation starters</bold></green>"))?;
        for starter in &suggestions.starters {
            writeln!(self.output, "  • {}", starter)?;
        }
        writeln!(self.output)?;
        writeln!(self.output, "{}", cformat!("<green><bold>Conversation topics</bold></green>"))?;
        for topic in &suggestions.topics {
            writeln!(self.output, "  • {}", topic)?;
        }
        Ok(())
    }
}
