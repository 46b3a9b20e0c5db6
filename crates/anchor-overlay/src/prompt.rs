//! User-facing tracking status prompt.

use log::debug;
use serde::{Deserialize, Serialize};

use anchor_overlay_core::TrackingState;

/// Prompt texts shown while no overlay can be displayed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessages {
    /// No marker is currently held at all.
    pub searching: String,
    /// A marker is held but its pose is not live.
    pub unstable: String,
}

impl Default for PromptMessages {
    fn default() -> Self {
        Self {
            searching: "Point the camera at the marker.".to_owned(),
            unstable: "Move the camera until the marker is clearly visible.".to_owned(),
        }
    }
}

/// Maps the overall tracking situation to a prompt text, reporting only
/// changes.
#[derive(Clone, Debug)]
pub struct StatusPrompt {
    messages: PromptMessages,
    current: String,
}

impl StatusPrompt {
    pub fn new(messages: PromptMessages) -> Self {
        let current = messages.searching.clone();
        Self { messages, current }
    }

    /// Feed the best tracking state across held markers (`None` when no
    /// marker is held). Returns the new text when it changed.
    pub fn update(&mut self, state: Option<TrackingState>) -> Option<&str> {
        let next = match state {
            None => self.messages.searching.as_str(),
            Some(TrackingState::Tracking) => "",
            Some(_) => self.messages.unstable.as_str(),
        };
        if next != self.current {
            self.current = next.to_owned();
            debug!("prompt changed to {:?} (state: {:?})", next, state);
            return Some(&self.current);
        }
        None
    }

    /// Current prompt text; empty while tracking is live.
    pub fn text(&self) -> &str {
        &self.current
    }
}

impl Default for StatusPrompt {
    fn default() -> Self {
        Self::new(PromptMessages::default())
    }
}
