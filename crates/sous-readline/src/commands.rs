//! Slash-command parsing for the REPL.

use sous_core::meal::MealType;

/// Every slash command, in the order `/help` lists them.
pub const COMMANDS: &[(&str, &str)] = &[
    ("/meal", "<breakfast|lunch|dinner|custom>  choose a meal type"),
    ("/text", "<description>  describe a custom situation"),
    ("/submit", "ask the backend for recipe options"),
    ("/options", "list the current recipe options"),
    ("/select", "<N>  open recipe option N"),
    ("/back", "return to the previous view"),
    ("/cook", "start cooking mode"),
    ("/next", "go to the next step"),
    ("/prev", "go to the previous step"),
    ("/explain", "explain the current step"),
    ("/chat", "open the recipe chat"),
    ("/ask", "<question>  send a chat message"),
    ("/close", "close the open explanation or chat"),
    ("/log", "show the full diagnostic log"),
    ("/profile", "load the preference and calendar data"),
    ("/reset", "start over"),
    ("/help", "show this list"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Meal(MealType),
    Text(String),
    Submit,
    Options,
    Select(usize),
    Back,
    Cook,
    Next,
    Prev,
    Explain,
    Chat,
    Ask(String),
    Close,
    Log,
    Profile,
    Reset,
    Help,
    Quit,
}

/// Parses one input line.
///
/// Plain text (no leading slash) is treated as a chat question. Errors are
/// short messages meant for the prompt.
pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    if line == "quit" || line == "exit" {
        return Ok(Command::Quit);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Ask(line.to_string()));
    };

    let (name, argument) = match rest.split_once(char::is_whitespace) {
        Some((name, argument)) => (name, argument.trim()),
        None => (rest, ""),
    };

    match name {
        "meal" => argument
            .parse::<MealType>()
            .map(Command::Meal)
            .map_err(|_| format!("Unknown meal type '{argument}'. Use breakfast, lunch, dinner or custom.")),
        "text" => Ok(Command::Text(argument.to_string())),
        "submit" => Ok(Command::Submit),
        "options" => Ok(Command::Options),
        "select" => argument
            .parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .map(Command::Select)
            .ok_or_else(|| "Usage: /select <N> (1-based)".to_string()),
        "back" => Ok(Command::Back),
        "cook" => Ok(Command::Cook),
        "next" => Ok(Command::Next),
        "prev" => Ok(Command::Prev),
        "explain" => Ok(Command::Explain),
        "chat" => Ok(Command::Chat),
        "ask" => Ok(Command::Ask(argument.to_string())),
        "close" => Ok(Command::Close),
        "log" => Ok(Command::Log),
        "profile" => Ok(Command::Profile),
        "reset" => Ok(Command::Reset),
        "help" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("Unknown command '/{other}'. Type /help for the list.")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_is_case_insensitive() {
        assert_eq!(parse("/meal Dinner"), Ok(Command::Meal(MealType::Dinner)));
        assert_eq!(parse("/meal custom"), Ok(Command::Meal(MealType::Custom)));
        assert!(parse("/meal brunch").is_err());
    }

    #[test]
    fn test_text_keeps_inner_spacing() {
        assert_eq!(
            parse("/text  leftover chicken and rice "),
            Ok(Command::Text("leftover chicken and rice".to_string()))
        );
    }

    #[test]
    fn test_select_is_one_based() {
        assert_eq!(parse("/select 2"), Ok(Command::Select(2)));
        assert!(parse("/select 0").is_err());
        assert!(parse("/select two").is_err());
    }

    #[test]
    fn test_plain_text_is_a_question() {
        assert_eq!(
            parse("can I swap the butter?"),
            Ok(Command::Ask("can I swap the butter?".to_string()))
        );
        assert_eq!(parse("quit"), Ok(Command::Quit));
        assert!(parse("/bake").is_err());
    }
}
