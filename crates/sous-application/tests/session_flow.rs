use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sous_application::{Completion, SessionStateMachine};
use sous_core::SousError;
use sous_core::agent_log::{AgentLogEntry, LogLevel};
use sous_core::content::Section;
use sous_core::backend::{ChatAnswer, FetchedDetail, GeneratedOptions, RecipeBackend, StepExplanation};
use sous_core::conversation::{ConversationMessage, DisplayEntry, MessageRole};
use sous_core::cooking::CookingStep;
use sous_core::error::Result;
use sous_core::meal::MealType;
use sous_core::recipe::{ProfileData, RecipeOption, UserProfile};
use sous_core::session::{RequestKind, View};

const RECIPE_MARKDOWN: &str = "\
## Chicken Fried Rice

Quantified Ingredients
| Ingredient | Amount |
|---|---|
| Cooked rice | 3 cups |
| Cooked chicken | 200 g |

Instructions
| Step | Instruction |
|---|---|
| 1 | Heat the wok until smoking. |
| 2 | Scramble the eggs and set aside. |
| 3 | Fry the chicken for two minutes. |
| 4 | Add the rice and toss until hot. |
| 5 | Return the eggs and season. |

Nutrition count
| Nutrient | Per serving |
|---|---|
| Calories | 520 |
";

/// Backend double that replays scripted responses and records what it saw.
#[derive(Default)]
struct ScriptedBackend {
    options: Mutex<VecDeque<Result<GeneratedOptions>>>,
    details: Mutex<VecDeque<Result<FetchedDetail>>>,
    explanations: Mutex<VecDeque<Result<StepExplanation>>>,
    answers: Mutex<VecDeque<Result<ChatAnswer>>>,
    option_calls: Mutex<Vec<(MealType, String)>>,
    detail_calls: Mutex<Vec<(UserProfile, String)>>,
    explain_calls: Mutex<Vec<String>>,
    chat_calls: Mutex<Vec<(Option<CookingStep>, Vec<ConversationMessage>)>>,
}

impl ScriptedBackend {
    fn push_options(&self, result: Result<GeneratedOptions>) {
        self.options.lock().unwrap().push_back(result);
    }

    fn push_detail(&self, result: Result<FetchedDetail>) {
        self.details.lock().unwrap().push_back(result);
    }

    fn push_explanation(&self, result: Result<StepExplanation>) {
        self.explanations.lock().unwrap().push_back(result);
    }

    fn push_answer(&self, result: Result<ChatAnswer>) {
        self.answers.lock().unwrap().push_back(result);
    }
}

fn exhausted(what: &str) -> SousError {
    SousError::internal(format!("no scripted {what} response"))
}

#[async_trait]
impl RecipeBackend for ScriptedBackend {
    async fn generate_recipe_options(
        &self,
        meal_type: MealType,
        free_text: &str,
    ) -> Result<GeneratedOptions> {
        self.option_calls
            .lock()
            .unwrap()
            .push((meal_type, free_text.to_string()));
        self.options
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("options")))
    }

    async fn fetch_recipe_detail(
        &self,
        user_profile: &UserProfile,
        dish_title: &str,
    ) -> Result<FetchedDetail> {
        self.detail_calls
            .lock()
            .unwrap()
            .push((user_profile.clone(), dish_title.to_string()));
        self.details
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("detail")))
    }

    async fn explain_step(
        &self,
        instruction_text: &str,
        _recipe_context: &str,
    ) -> Result<StepExplanation> {
        self.explain_calls
            .lock()
            .unwrap()
            .push(instruction_text.to_string());
        self.explanations
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("explanation")))
    }

    async fn ask_chatbot(
        &self,
        _recipe_context: &str,
        anchor_step: Option<&CookingStep>,
        transcript: &[ConversationMessage],
    ) -> Result<ChatAnswer> {
        self.chat_calls
            .lock()
            .unwrap()
            .push((anchor_step.cloned(), transcript.to_vec()));
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(exhausted("chat")))
    }

    async fn get_all_profile_data(&self) -> Result<ProfileData> {
        Ok(ProfileData::default())
    }
}

fn option(title: &str) -> RecipeOption {
    RecipeOption {
        title: title.to_string(),
        summary: format!("A quick take on {title}."),
        tags: vec!["leftovers".to_string()],
        estimated_cook_time: Some("20 min".to_string()),
        main_ingredients: None,
        why_perfect: None,
    }
}

fn three_options() -> GeneratedOptions {
    GeneratedOptions {
        user_profile: UserProfile::new("profile-token-1"),
        recipe_options: vec![
            option("Chicken Congee"),
            option("Chicken Fried Rice"),
            option("Rice Bowl Salad"),
        ],
        agent_logs: vec![
            AgentLogEntry::new("Strategist", LogLevel::Info).with_output("briefing ready"),
            AgentLogEntry::new("Chef", LogLevel::Info).with_output("3 options"),
        ],
    }
}

fn detail() -> FetchedDetail {
    FetchedDetail {
        recipe_html: RECIPE_MARKDOWN.to_string(),
        hero_image_url: Some("https://img.example/rice.png".to_string()),
        agent_logs: Vec::new(),
    }
}

/// Drives a fresh session to the `Detail` view for "Chicken Fried Rice".
async fn session_at_detail(backend: &ScriptedBackend) -> SessionStateMachine {
    backend.push_options(Ok(three_options()));
    backend.push_detail(Ok(detail()));

    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Custom);
    session.set_free_text("leftover chicken and rice");
    assert_eq!(session.submit_request(backend).await.unwrap(), Completion::Applied);
    assert_eq!(
        session.select_recipe(backend, "Chicken Fried Rice").await.unwrap(),
        Completion::Applied
    );
    session
}

#[tokio::test]
async fn test_leftovers_end_to_end() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;

    assert_eq!(
        backend.option_calls.lock().unwrap().as_slice(),
        &[(MealType::Custom, "leftover chicken and rice".to_string())]
    );
    assert_eq!(
        backend.detail_calls.lock().unwrap().as_slice(),
        &[(UserProfile::new("profile-token-1"), "Chicken Fried Rice".to_string())]
    );
    assert_eq!(session.options().len(), 3);
    assert_eq!(session.view(), View::Detail);

    let selection = session.selection().unwrap();
    assert!(selection.is_ready());
    let sections = selection.sections.as_ref().unwrap();
    assert_eq!(sections.instructions.as_ref().unwrap().rows.len(), 5);
    assert!(sections.missing().is_empty());
    assert!(session.can_enter_cooking());

    session.enter_cooking().unwrap();
    assert_eq!(session.view(), View::Cooking);
    for _ in 0..3 {
        assert!(session.next_step().unwrap());
    }
    let cooking = session.cooking().unwrap();
    assert_eq!(cooking.current_index(), 3);
    assert_eq!(cooking.current().number, "4");

    backend.push_explanation(Ok(StepExplanation {
        explanation: "Keep the rice moving so it crisps evenly.".to_string(),
    }));
    let step = session.current_step().cloned().unwrap();
    assert_eq!(
        session.explain_step(&backend, step).await.unwrap(),
        Completion::Applied
    );
    assert_eq!(
        backend.explain_calls.lock().unwrap().as_slice(),
        &["Add the rice and toss until hot.".to_string()]
    );

    let explanation = session.explanation().unwrap();
    assert_eq!(explanation.anchor_step().unwrap().number, "4");
    assert_eq!(
        explanation.last_reply(),
        Some("Keep the rice moving so it crisps evenly.")
    );

    session.close_explanation();
    assert!(session.explanation().is_none());
    assert_eq!(session.cooking().unwrap().current_index(), 3);
}

#[tokio::test]
async fn test_failed_submission_leaves_state_untouched() {
    let backend = ScriptedBackend::default();
    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Dinner);

    backend.push_options(Err(SousError::from_status(500, None)));
    let err = session.submit_request(&backend).await.unwrap_err();
    assert!(err.is_transport());
    assert_eq!(err.to_string(), "Server error: 500");
    assert_eq!(session.view(), View::Requesting);
    assert!(session.options().is_empty());
    assert!(session.user_profile().is_none());
    assert!(!session.is_pending(RequestKind::GenerateOptions));

    let outputs: Vec<&str> = session
        .log()
        .entries()
        .iter()
        .filter_map(|e| e.output.as_deref())
        .collect();
    assert!(outputs.contains(&"Server error: 500"));
    assert_eq!(outputs.last(), Some(&"Process complete. Ready for new input."));

    // The same form can be resubmitted.
    backend.push_options(Ok(three_options()));
    session.submit_request(&backend).await.unwrap();
    assert_eq!(session.view(), View::Selecting);
}

#[tokio::test]
async fn test_custom_without_text_never_reaches_backend() {
    let backend = ScriptedBackend::default();
    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Custom);
    session.set_free_text("   ");

    let err = session.submit_request(&backend).await.unwrap_err();
    assert!(err.is_validation());
    assert!(backend.option_calls.lock().unwrap().is_empty());
    assert_eq!(session.view(), View::Requesting);
}

#[test]
fn test_submit_is_disabled_while_in_flight() {
    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Lunch);

    let first = session.begin_generate_options().unwrap();
    assert!(session.is_pending(RequestKind::GenerateOptions));
    let err = session.begin_generate_options().unwrap_err();
    assert!(err.is_request_pending());

    session
        .complete_generate_options(first.ticket, Ok(three_options()))
        .unwrap();
    assert!(!session.is_pending(RequestKind::GenerateOptions));
}

#[test]
fn test_stale_detail_response_is_discarded() {
    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Lunch);
    let request = session.begin_generate_options().unwrap();
    session
        .complete_generate_options(request.ticket, Ok(three_options()))
        .unwrap();

    let fetch = session.begin_fetch_detail("Chicken Congee").unwrap();
    session.back_to_options().unwrap();
    assert_eq!(session.view(), View::Selecting);

    let outcome = session.complete_fetch_detail(fetch.ticket, Ok(detail())).unwrap();
    assert_eq!(outcome, Completion::Discarded);
    assert!(session.selection().is_none());
    assert_eq!(session.view(), View::Selecting);
}

#[test]
fn test_superseded_detail_request_is_discarded() {
    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Lunch);
    let request = session.begin_generate_options().unwrap();
    session
        .complete_generate_options(request.ticket, Ok(three_options()))
        .unwrap();

    let first = session.begin_fetch_detail("Chicken Congee").unwrap();
    session.back_to_options().unwrap();
    let second = session.begin_fetch_detail("Rice Bowl Salad").unwrap();

    assert_eq!(
        session.complete_fetch_detail(first.ticket, Ok(detail())).unwrap(),
        Completion::Discarded
    );
    assert!(session.selection().unwrap().is_loading());

    assert_eq!(
        session.complete_fetch_detail(second.ticket, Ok(detail())).unwrap(),
        Completion::Applied
    );
    assert_eq!(session.selection().unwrap().option.title, "Rice Bowl Salad");
}

#[tokio::test]
async fn test_explanation_after_close_is_discarded() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.enter_cooking().unwrap();

    let request = session.begin_explain_current_step().unwrap();
    session.close_explanation();
    let outcome = session
        .complete_explanation(
            request.ticket,
            Ok(StepExplanation {
                explanation: "late".to_string(),
            }),
        )
        .unwrap();
    assert_eq!(outcome, Completion::Discarded);
    assert!(session.explanation().is_none());
}

#[tokio::test]
async fn test_explanation_is_discarded_when_leaving_cooking() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.enter_cooking().unwrap();

    let request = session.begin_explain_current_step().unwrap();
    session.exit_cooking().unwrap();
    assert_eq!(session.view(), View::Detail);
    assert!(session.explanation().is_none());

    let outcome = session
        .complete_explanation(
            request.ticket,
            Ok(StepExplanation {
                explanation: "late".to_string(),
            }),
        )
        .unwrap();
    assert_eq!(outcome, Completion::Discarded);
}

#[tokio::test]
async fn test_chat_transcript_growth() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.enter_cooking().unwrap();
    session.next_step().unwrap();
    let anchor = session.current_step().cloned();
    session.open_chat(anchor).unwrap();

    backend.push_answer(Ok(ChatAnswer {
        answer: "Yes, day-old rice works best.".to_string(),
    }));
    session
        .send_chat_message(&backend, "Can I use yesterday's rice?")
        .await
        .unwrap();
    assert_eq!(session.chat().unwrap().transcript().len(), 2);

    backend.push_answer(Err(SousError::from_status(
        503,
        Some("Chat agent unavailable".to_string()),
    )));
    let err = session
        .send_chat_message(&backend, "What about brown rice?")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Chat agent unavailable");

    let chat = session.chat().unwrap();
    let roles: Vec<MessageRole> = chat.transcript().iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![MessageRole::User, MessageRole::Assistant, MessageRole::User]
    );
    assert!(matches!(chat.display().last(), Some(DisplayEntry::Error { .. })));
    assert!(!chat.is_awaiting_reply());

    let calls = backend.chat_calls.lock().unwrap();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0.as_ref().unwrap().number, "2");
    assert_eq!(calls[1].1.len(), 3);
    // The failed exchange does not move the cooking session.
    assert_eq!(session.cooking().unwrap().current_index(), 1);
}

#[tokio::test]
async fn test_chat_rejects_empty_and_overlapping_messages() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.open_chat(None).unwrap();

    let err = session.begin_chat_message("  ").unwrap_err();
    assert!(err.is_validation());
    assert!(session.chat().unwrap().transcript().is_empty());

    let request = session.begin_chat_message("Is this spicy?").unwrap();
    assert!(session.begin_chat_message("Hello?").unwrap_err().is_request_pending());
    session
        .complete_chat_message(
            request.ticket,
            Ok(ChatAnswer {
                answer: "Mildly.".to_string(),
            }),
        )
        .unwrap();
    assert_eq!(session.chat().unwrap().transcript().len(), 2);
}

#[tokio::test]
async fn test_missing_instructions_refuses_cooking() {
    let backend = ScriptedBackend::default();
    backend.push_options(Ok(three_options()));
    backend.push_detail(Ok(FetchedDetail {
        recipe_html: "<p>Quantified Ingredients</p><table><tr><td>Rice</td><td>1 cup</td></tr></table>"
            .to_string(),
        hero_image_url: None,
        agent_logs: Vec::new(),
    }));

    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Breakfast);
    session.submit_request(&backend).await.unwrap();
    session.select_recipe(&backend, "Chicken Congee").await.unwrap();

    let sections = session.selection().unwrap().sections.clone().unwrap();
    assert!(sections.ingredients.is_some());
    assert!(sections.instructions.is_none());
    assert!(!session.can_enter_cooking());

    let errors: Vec<String> = session
        .log()
        .entries()
        .iter()
        .filter(|e| e.level == LogLevel::Error)
        .filter_map(|e| e.output.clone())
        .collect();
    assert_eq!(
        errors,
        vec![
            Section::Instructions.placeholder(),
            Section::Nutrition.placeholder()
        ]
    );

    let err = session.enter_cooking().unwrap_err();
    assert!(err.is_sequencing());
    assert_eq!(session.view(), View::Detail);
    assert!(session.cooking().is_none());
}

#[tokio::test]
async fn test_failed_detail_shows_inline_error() {
    let backend = ScriptedBackend::default();
    backend.push_options(Ok(three_options()));
    backend.push_detail(Err(SousError::from_status(502, None)));

    let mut session = SessionStateMachine::new();
    session.select_meal_type(MealType::Dinner);
    session.submit_request(&backend).await.unwrap();
    let err = session
        .select_recipe(&backend, "Rice Bowl Salad")
        .await
        .unwrap_err();
    assert!(err.is_transport());

    assert_eq!(session.view(), View::Detail);
    let selection = session.selection().unwrap();
    assert_eq!(selection.error.as_deref(), Some("Server error: 502"));
    assert!(!selection.is_ready());
    assert!(session.open_chat(None).is_err());
}

#[tokio::test]
async fn test_navigation_clamps_at_both_ends() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.enter_cooking().unwrap();

    assert!(!session.previous_step().unwrap());
    while session.next_step().unwrap() {}
    let cooking = session.cooking().unwrap();
    assert!(cooking.is_last());
    assert_eq!(cooking.current_index(), 4);
}

#[tokio::test]
async fn test_failed_resubmission_keeps_previous_results() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.back_to_options().unwrap();
    session.back_to_request().unwrap();
    assert_eq!(session.view(), View::Requesting);

    backend.push_options(Err(SousError::from_status(500, None)));
    let err = session.submit_request(&backend).await.unwrap_err();
    assert!(err.is_transport());

    assert_eq!(session.view(), View::Requesting);
    assert_eq!(
        session.user_profile(),
        Some(&UserProfile::new("profile-token-1"))
    );
    let titles: Vec<&str> = session.options().iter().map(|o| o.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Chicken Congee", "Chicken Fried Rice", "Rice Bowl Salad"]
    );
}

#[tokio::test]
async fn test_chat_keeps_its_anchor_after_navigation() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.enter_cooking().unwrap();
    session.next_step().unwrap();
    let anchor = session.current_step().cloned();
    session.open_chat(anchor).unwrap();

    assert!(session.next_step().unwrap());
    assert_eq!(session.current_step().unwrap().number, "3");

    backend.push_answer(Ok(ChatAnswer {
        answer: "Medium-high heat.".to_string(),
    }));
    session
        .send_chat_message(&backend, "How hot should the pan be?")
        .await
        .unwrap();

    let calls = backend.chat_calls.lock().unwrap();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0.as_ref().unwrap().number, "2");
    assert_eq!(session.chat().unwrap().anchor_step().unwrap().number, "2");
    assert_eq!(session.current_step().unwrap().number, "3");
}

#[tokio::test]
async fn test_reopened_explanation_starts_fresh() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.enter_cooking().unwrap();

    backend.push_explanation(Ok(StepExplanation {
        explanation: "Wait for a wisp of smoke.".to_string(),
    }));
    session.explain_current_step(&backend).await.unwrap();
    session.close_explanation();

    backend.push_explanation(Ok(StepExplanation {
        explanation: "A dry wok stops the rice sticking.".to_string(),
    }));
    session.explain_current_step(&backend).await.unwrap();

    let explanation = session.explanation().unwrap();
    assert_eq!(explanation.transcript().len(), 2);
    assert_eq!(
        explanation.last_reply(),
        Some("A dry wok stops the rice sticking.")
    );
    assert!(!explanation.display().iter().any(|entry| matches!(
        entry,
        DisplayEntry::Message(m) if m.content == "Wait for a wisp of smoke."
    )));
}

#[tokio::test]
async fn test_replacing_an_explanation_does_not_log_a_close() {
    let backend = ScriptedBackend::default();
    let mut session = session_at_detail(&backend).await;
    session.enter_cooking().unwrap();

    backend.push_explanation(Ok(StepExplanation {
        explanation: "Wait for a wisp of smoke.".to_string(),
    }));
    session.explain_current_step(&backend).await.unwrap();
    session.next_step().unwrap();
    backend.push_explanation(Ok(StepExplanation {
        explanation: "Low heat keeps the eggs soft.".to_string(),
    }));
    session.explain_current_step(&backend).await.unwrap();
    assert_eq!(session.explanation().unwrap().anchor_step().unwrap().number, "2");

    let closes = |session: &SessionStateMachine| {
        session
            .log()
            .entries()
            .iter()
            .filter(|e| e.input.as_deref() == Some("Close step explanation"))
            .count()
    };
    assert_eq!(closes(&session), 0);

    session.close_explanation();
    session.close_explanation();
    assert_eq!(closes(&session), 1);
}
