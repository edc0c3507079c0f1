use serde::{Deserialize, Serialize};
use strum::Display;

/// The user action a backend request belongs to.
///
/// At most one request per kind is outstanding at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum RequestKind {
    #[strum(serialize = "recipe options")]
    GenerateOptions,
    #[strum(serialize = "recipe detail")]
    FetchDetail,
    #[strum(serialize = "step explanation")]
    ExplainStep,
    #[strum(serialize = "chat")]
    Chat,
    #[strum(serialize = "profile data")]
    ProfileData,
}

/// Tag attached to an in-flight request.
///
/// `generation` is the session generation when the request was issued, and
/// `instance` identifies the overlay instance for explanation and chat
/// requests. A completion whose ticket is no longer the live ticket for its
/// kind is stale and must be dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestTicket {
    pub kind: RequestKind,
    pub generation: u64,
    pub instance: Option<u64>,
    pub sequence: u64,
}
