use std::borrow::Cow::{self, Borrowed, Owned};

use anyhow::Result;
use colored::Colorize;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use tracing_subscriber::EnvFilter;

use sous_application::{Completion, SessionStateMachine};
use sous_core::agent_log::{AgentLogEntry, LogLevel};
use sous_core::backend::RecipeBackend;
use sous_core::content::{Section, Table};
use sous_core::conversation::{ConversationContext, DisplayEntry, MessageRole};
use sous_core::session::{Overlay, View};
use sous_infrastructure::ConfigService;
use sous_interaction::HttpRecipeBackend;

mod commands;

use commands::{COMMANDS, Command};

/// CLI helper for rustyline that provides completion, highlighting, and hints.
#[derive(Clone)]
struct CliHelper {
    commands: Vec<String>,
}

impl CliHelper {
    fn new() -> Self {
        Self {
            commands: COMMANDS.iter().map(|(name, _)| name.to_string()).collect(),
        }
    }
}

impl Helper for CliHelper {}

impl Completer for CliHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            let candidates: Vec<Pair> = self
                .commands
                .iter()
                .filter(|cmd| cmd.starts_with(line))
                .map(|cmd| Pair {
                    display: cmd.clone(),
                    replacement: cmd.clone(),
                })
                .collect();
            Ok((0, candidates))
        } else {
            Ok((0, vec![]))
        }
    }
}

impl Highlighter for CliHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        if line.starts_with('/') {
            Owned(line.bright_cyan().to_string())
        } else {
            Borrowed(line)
        }
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Hinter for CliHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &Context<'_>) -> Option<String> {
        let line = &line[..pos];

        if line.starts_with('/') && !line.contains(' ') {
            self.commands
                .iter()
                .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
                .map(|cmd| cmd[line.len()..].to_string())
        } else {
            None
        }
    }
}

impl Validator for CliHelper {}

/// Drives one recipe session from the terminal.
struct Repl<B> {
    session: SessionStateMachine,
    backend: B,
    /// Number of log entries already printed.
    shown: usize,
}

impl<B: RecipeBackend> Repl<B> {
    fn new(backend: B) -> Self {
        Self {
            session: SessionStateMachine::new(),
            backend,
            shown: 0,
        }
    }

    fn prompt(&self) -> String {
        let view = self.session.view().to_string().to_lowercase();
        match self.session.open_overlay() {
            Some(Overlay::Explain) => format!("{view}/explain> "),
            Some(Overlay::Chat) => format!("{view}/chat> "),
            None => format!("{view}> "),
        }
    }

    /// Runs one command. Returns `false` when the REPL should exit.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Help => print_help(),
            Command::Log => {
                for entry in self.session.log().entries() {
                    print_log_entry(entry);
                }
                self.shown = self.session.log().len();
                return true;
            }
            Command::Meal(meal_type) => self.session.select_meal_type(meal_type),
            Command::Text(text) => {
                if self.session.form().shows_free_text() {
                    self.session.set_free_text(text);
                } else {
                    println!("{}", "Select /meal custom before describing your situation.".yellow());
                }
            }
            Command::Submit => {
                println!("{}", "Asking the kitchen for ideas...".bright_black());
                if self.session.submit_request(&self.backend).await.is_ok() {
                    print_options(&self.session);
                }
            }
            Command::Options => print_options(&self.session),
            Command::Select(index) => {
                let Some(title) = self
                    .session
                    .options()
                    .get(index - 1)
                    .map(|option| option.title.clone())
                else {
                    println!("{}", format!("There is no option {index}.").yellow());
                    return true;
                };
                println!("{}", format!("Loading '{title}'...").bright_black());
                let _ = self.session.select_recipe(&self.backend, &title).await;
                print_detail(&self.session);
            }
            Command::Back => {
                let result = match self.session.view() {
                    View::Cooking => self.session.exit_cooking(),
                    View::Detail => self.session.back_to_options(),
                    View::Selecting => self.session.back_to_request(),
                    View::Requesting => Ok(()),
                };
                if result.is_ok() && self.session.view() == View::Selecting {
                    print_options(&self.session);
                }
            }
            Command::Cook => {
                if self.session.enter_cooking().is_ok() {
                    print_step(&self.session);
                }
            }
            Command::Next => {
                if let Ok(moved) = self.session.next_step() {
                    if !moved {
                        println!("{}", "This is the last step.".bright_black());
                    }
                    print_step(&self.session);
                }
            }
            Command::Prev => {
                if let Ok(moved) = self.session.previous_step() {
                    if !moved {
                        println!("{}", "This is the first step.".bright_black());
                    }
                    print_step(&self.session);
                }
            }
            Command::Explain => {
                if self.session.explain_current_step(&self.backend).await.is_ok() {
                    if let Some(explanation) = self.session.explanation() {
                        print_conversation(explanation);
                    }
                }
            }
            Command::Chat => {
                let anchor = self.session.current_step().cloned();
                if self.session.open_chat(anchor).is_ok() {
                    println!(
                        "{}",
                        "Chat open. Type a question, or /close to leave.".bright_black()
                    );
                }
            }
            Command::Ask(question) => {
                let outcome = self.session.send_chat_message(&self.backend, &question).await;
                let answered = match &outcome {
                    Ok(completion) => *completion == Completion::Applied,
                    Err(err) => err.is_transport(),
                };
                if answered {
                    if let Some(chat) = self.session.chat() {
                        print_last_display(chat);
                    }
                }
            }
            Command::Close => {
                match self.session.open_overlay() {
                    Some(Overlay::Explain) => self.session.close_explanation(),
                    Some(Overlay::Chat) => self.session.close_chat(),
                    None => println!("{}", "Nothing to close.".bright_black()),
                }
            }
            Command::Profile => {
                if self.session.load_profile_data(&self.backend).await.is_ok() {
                    if let Some(data) = self.session.profile_data() {
                        println!(
                            "{}",
                            format!(
                                "Profile data: {} ingredients, {} calendar entries, {} rules",
                                data.ingredients.len(),
                                data.calendar.len(),
                                data.ruleset.len()
                            )
                            .bright_blue()
                        );
                    }
                }
            }
            Command::Reset => self.session.reset(),
        }
        self.flush_log();
        true
    }

    /// Prints log entries appended since the last flush.
    fn flush_log(&mut self) {
        for entry in self.session.log().since(self.shown) {
            print_log_entry(entry);
        }
        self.shown = self.session.log().len();
    }
}

fn print_help() {
    println!("{}", "Commands:".bright_magenta());
    for (name, description) in COMMANDS {
        println!("  {} {}", name.bright_cyan(), description.bright_black());
    }
    println!("  {} {}", "quit".bright_cyan(), "exit the REPL".bright_black());
}

fn print_log_entry(entry: &AgentLogEntry) {
    let line = entry.to_string();
    match entry.level {
        LogLevel::Error => println!("{}", line.red()),
        LogLevel::Success => println!("{}", line.green()),
        LogLevel::Info => println!("{}", line.bright_black()),
    }
}

fn print_options(session: &SessionStateMachine) {
    if session.options().is_empty() {
        println!("{}", "No recipe options yet. Use /submit.".bright_black());
        return;
    }
    for (index, option) in session.options().iter().enumerate() {
        println!("{}", format!("{}. {}", index + 1, option.title).bright_magenta().bold());
        if !option.summary.is_empty() {
            println!("   {}", option.summary);
        }
        if let Some(why) = &option.why_perfect {
            println!("   {}", why.bright_blue());
        }
        let mut facts = Vec::new();
        if let Some(time) = &option.estimated_cook_time {
            facts.push(time.clone());
        }
        if !option.tags.is_empty() {
            facts.push(option.tags.join(", "));
        }
        if !facts.is_empty() {
            println!("   {}", facts.join(" | ").bright_black());
        }
    }
}

fn print_detail(session: &SessionStateMachine) {
    let Some(selection) = session.selection() else {
        return;
    };
    println!("{}", selection.option.title.bright_magenta().bold());
    if let Some(error) = &selection.error {
        println!("{}", error.red());
        return;
    }
    let (Some(detail), Some(sections)) = (&selection.detail, &selection.sections) else {
        return;
    };
    if let Some(url) = &detail.hero_image_url {
        println!("{}", url.bright_black());
    }
    for section in [Section::Ingredients, Section::Instructions, Section::Nutrition] {
        println!("{}", section.label().bright_yellow());
        match sections.get(section) {
            Some(table) => print_table(table),
            None => println!("  {}", section.placeholder().bright_black()),
        }
    }
    if session.can_enter_cooking() {
        println!("{}", "Type /cook to start cooking mode.".bright_black());
    }
}

fn print_table(table: &Table) {
    if !table.header.is_empty() {
        println!("  {}", table.header.join(" | ").bold());
    }
    for row in &table.rows {
        println!("  {}", row.join(" | "));
    }
}

fn print_step(session: &SessionStateMachine) {
    let Some(cooking) = session.cooking() else {
        return;
    };
    let step = cooking.current();
    println!(
        "{}",
        format!(
            "Step {} of {} ({})",
            cooking.current_index() + 1,
            cooking.len(),
            step.number
        )
        .bright_magenta()
    );
    println!("  {}", step.instruction);
}

fn print_conversation(context: &ConversationContext) {
    for entry in context.display() {
        print_display_entry(entry);
    }
}

fn print_last_display(context: &ConversationContext) {
    if let Some(entry) = context.display().last() {
        print_display_entry(entry);
    }
}

fn print_display_entry(entry: &DisplayEntry) {
    match entry {
        DisplayEntry::Message(message) => match message.role {
            MessageRole::User => println!("{}", format!("> {}", message.content).green()),
            MessageRole::Assistant => {
                for line in message.content.lines() {
                    println!("{}", line.bright_blue());
                }
            }
        },
        DisplayEntry::Error { content, .. } => println!("{}", content.red()),
    }
}

/// Entry point for the Sous Chef REPL.
///
/// Loads `config.toml`, installs the tracing subscriber, and drives a single
/// recipe session against the HTTP backend.
#[tokio::main]
async fn main() -> Result<()> {
    let config = ConfigService::new().get_config();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("[Bootstrap] Using backend at {}", config.backend.base_url);

    let mut repl = Repl::new(HttpRecipeBackend::new(config.backend));

    let mut rl = Editor::new()?;
    rl.set_helper(Some(CliHelper::new()));

    println!("{}", "=== Sous Chef ===".bright_magenta().bold());
    println!(
        "{}",
        "Choose a meal with /meal, then /submit. Type /help for all commands, or 'quit' to exit."
            .bright_black()
    );
    println!();
    repl.flush_log();

    loop {
        match rl.readline(&repl.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(trimmed);

                match commands::parse(trimmed) {
                    Ok(command) => {
                        if !repl.handle(command).await {
                            println!("{}", "Goodbye!".bright_green());
                            break;
                        }
                    }
                    Err(message) => println!("{}", message.yellow()),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                println!("{}", "CTRL-C detected. Type 'quit' to exit.".yellow());
            }
            Err(rustyline::error::ReadlineError::Eof) => {
                println!("{}", "CTRL-D detected. Exiting...".bright_green());
                break;
            }
            Err(err) => {
                eprintln!("{}", format!("Error: {:?}", err).red());
                break;
            }
        }
    }

    Ok(())
}
