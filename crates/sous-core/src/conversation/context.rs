use serde::{Deserialize, Serialize};

use super::message::{ConversationMessage, MessageRole};
use crate::cooking::CookingStep;
use crate::error::{Result, SousError};

/// How a conversation accepts input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationMode {
    /// One exchange explaining a single instruction. Not user-extensible.
    Explanation,
    /// Multi-turn chat about the recipe.
    Chat,
}

/// An item on the conversation's display surface.
///
/// Errors share the surface with replies but never enter the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DisplayEntry {
    Message(ConversationMessage),
    Error { content: String, timestamp: String },
}

/// Transcript and anchor for one assistant conversation.
///
/// The anchor step and recipe text are fixed when the context is opened.
/// Navigating to another step does not rebind an open context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationContext {
    mode: ConversationMode,
    anchor_step: Option<CookingStep>,
    recipe_text: String,
    transcript: Vec<ConversationMessage>,
    display: Vec<DisplayEntry>,
    exchanges_started: usize,
    awaiting_reply: bool,
}

impl ConversationContext {
    /// Opens a single-shot explanation of `instruction_text`.
    pub fn explanation(instruction_text: impl Into<String>, recipe_text: impl Into<String>) -> Self {
        let question = ConversationMessage::user(instruction_text);
        Self {
            mode: ConversationMode::Explanation,
            anchor_step: None,
            recipe_text: recipe_text.into(),
            display: vec![DisplayEntry::Message(question.clone())],
            transcript: vec![question],
            exchanges_started: 0,
            awaiting_reply: false,
        }
    }

    /// Opens a multi-turn chat bound to `anchor_step`.
    pub fn chat(recipe_text: impl Into<String>, anchor_step: Option<CookingStep>) -> Self {
        Self {
            mode: ConversationMode::Chat,
            anchor_step,
            recipe_text: recipe_text.into(),
            transcript: Vec::new(),
            display: Vec::new(),
            exchanges_started: 0,
            awaiting_reply: false,
        }
    }

    /// Binds the step the explanation was requested for.
    pub fn with_anchor(mut self, step: CookingStep) -> Self {
        self.anchor_step = Some(step);
        self
    }

    pub fn mode(&self) -> ConversationMode {
        self.mode
    }

    pub fn anchor_step(&self) -> Option<&CookingStep> {
        self.anchor_step.as_ref()
    }

    pub fn recipe_text(&self) -> &str {
        &self.recipe_text
    }

    /// Well-formed turns only; this is what the backend sees.
    pub fn transcript(&self) -> &[ConversationMessage] {
        &self.transcript
    }

    /// Everything shown to the user, including failures.
    pub fn display(&self) -> &[DisplayEntry] {
        &self.display
    }

    pub fn is_awaiting_reply(&self) -> bool {
        self.awaiting_reply
    }

    /// The instruction being explained (explanation mode only).
    pub fn question(&self) -> Option<&str> {
        match self.mode {
            ConversationMode::Explanation => self.transcript.first().map(|m| m.content.as_str()),
            ConversationMode::Chat => None,
        }
    }

    /// The latest assistant reply, if any.
    pub fn last_reply(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::Assistant)
            .map(|m| m.content.as_str())
    }

    /// Whether another exchange may be started now.
    pub fn can_start_exchange(&self) -> bool {
        match self.mode {
            ConversationMode::Explanation => self.exchanges_started == 0,
            ConversationMode::Chat => !self.awaiting_reply,
        }
    }

    /// Marks the single explanation exchange as started.
    ///
    /// # Errors
    ///
    /// Fails if this is not an explanation or the exchange was already made.
    pub fn begin_explanation(&mut self) -> Result<()> {
        if self.mode != ConversationMode::Explanation {
            return Err(SousError::internal("begin_explanation called on a chat context"));
        }
        if !self.can_start_exchange() {
            return Err(SousError::RequestPending("explanation".to_string()));
        }
        self.exchanges_started += 1;
        self.awaiting_reply = true;
        Ok(())
    }

    /// Appends a user message before the chat call is issued.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty text or explanation contexts, and
    /// [`SousError::RequestPending`] while a reply is outstanding.
    pub fn push_user_message(&mut self, content: impl Into<String>) -> Result<()> {
        if self.mode == ConversationMode::Explanation {
            return Err(SousError::validation(
                "Step explanations do not accept follow-up questions.",
            ));
        }
        let content = content.into();
        if content.trim().is_empty() {
            return Err(SousError::validation("Please type a question first."));
        }
        if self.awaiting_reply {
            return Err(SousError::RequestPending("chat".to_string()));
        }
        let message = ConversationMessage::user(content.trim());
        self.transcript.push(message.clone());
        self.display.push(DisplayEntry::Message(message));
        self.exchanges_started += 1;
        self.awaiting_reply = true;
        Ok(())
    }

    /// Appends the assistant reply of a successful exchange.
    pub fn record_reply(&mut self, content: impl Into<String>) {
        let message = ConversationMessage::assistant(content);
        self.transcript.push(message.clone());
        self.display.push(DisplayEntry::Message(message));
        self.awaiting_reply = false;
    }

    /// Shows a failed exchange. The transcript is left as it was.
    pub fn record_failure(&mut self, error: impl Into<String>) {
        self.display.push(DisplayEntry::Error {
            content: error.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        });
        self.awaiting_reply = false;
    }
}
