//=========================================================================
// Outbound Events
//=========================================================================
//
// Notifications published to the Outbox for the presentation layer.
// The outbox is cleared at the start of every tick, so a consumer reads
// them after `Game::tick` returns.
//
//=========================================================================

//=== DialogueEvent =======================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DialogueEvent {
    Opened { scene: String },
    LineShown {
        scene: String,
        index: usize,
        speaker: Option<String>,
        text: String,
    },
    LineSkipped { scene: String, index: usize },
    Exhausted { scene: String },
    Closed { scene: String },
}

//=== SessionEvent ========================================================

/// Activity and minigame session milestones, keyed by content id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Started { session: String },
    StepEntered { session: String, step: String },
    Interaction { session: String, object: String, correct: bool },
    HintShown { session: String, remaining: u32 },
    RewardShown { session: String, resource: String, quantity: u32 },
    Completed { session: String, first_time: bool },
    /// The session cannot continue; the player may only leave.
    Failed { session: String, reason: String },
    Abandoned { session: String },
    Terminated { session: String },
}

//=== NavigationEvent =====================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationEvent {
    SceneChanged {
        from: Option<String>,
        to: String,
        reference: Option<String>,
    },
    WentBack { to: String },
    /// goBack with an empty history.
    BackIgnored,
    PopupShown(String),
    PopupHidden(String),
    CompanionChanged(Option<String>),
    BiomeChanged(String),
}

//=== Progress & Platform =================================================

/// Activities that became playable, announced as one batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivitiesUnlocked(pub Vec<String>);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Feedback,
    Warning,
    Error,
}

/// Non-modal message for the player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserNotification {
    pub kind: NoticeKind,
    pub text: String,
}

impl UserNotification {
    pub fn feedback(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Feedback,
            text: text.into(),
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Warning,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// The presentation surface changed size; text should be re-resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportResized {
    pub width: u32,
    pub height: u32,
}
