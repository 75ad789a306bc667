use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ToggleState {
    Expanded,
    Collapsed,
}

/// View-private open/closed flag. Starts expanded and is dropped with its view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalToggle {
    state: ToggleState,
}

impl Default for LocalToggle {
    fn default() -> Self {
        Self {
            state: ToggleState::Expanded,
        }
    }
}

impl LocalToggle {
    pub fn state(&self) -> ToggleState {
        self.state
    }

    pub fn is_expanded(&self) -> bool {
        self.state == ToggleState::Expanded
    }

    pub fn toggle(&mut self) -> ToggleState {
        self.state = match self.state {
            ToggleState::Expanded => ToggleState::Collapsed,
            ToggleState::Collapsed => ToggleState::Expanded,
        };
        self.state
    }
}
