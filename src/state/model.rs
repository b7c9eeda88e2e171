/// Edit-session state for a single palette role. The active states carry
/// the editing context: the role under edit, the value captured when the
/// edit began, and the latest previewed value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EditState {
    #[default]
    Idle,
    Editing {
        role: String,
        original_value: String,
    },
    LivePreviewing {
        role: String,
        original_value: String,
        temp_value: String,
    },
}

impl EditState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The role under edit, if any.
    pub fn editing_role(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Editing { role, .. } | Self::LivePreviewing { role, .. } => Some(role),
        }
    }
}
