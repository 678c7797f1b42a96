// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};

use crate::format::DisplayText;

/// Identifies one widget instance of the host.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WidgetId(pub u32);

impl std::fmt::Display for WidgetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What caused a pipeline run.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Periodic refresh or a retry of an earlier run.
    Scheduled,
    /// The user tapped a widget.
    UserInitiated { widget_id: WidgetId },
}

/// Tap-to-refresh binding of a single widget.
///
/// Every render hands a fresh handle to the target, which must rebind the
/// widget's tap action to it.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct TapHandle {
    widget_id: WidgetId,
}

impl TapHandle {
    pub fn new(widget_id: WidgetId) -> Self {
        Self { widget_id }
    }

    pub fn widget_id(&self) -> WidgetId {
        self.widget_id
    }

    /// The trigger to fire when the widget is tapped.
    pub fn trigger(&self) -> Trigger {
        Trigger::UserInitiated { widget_id: self.widget_id }
    }
}

/// Everything pushed to a widget on one render.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct WidgetView {
    pub text: DisplayText,
    pub tap: TapHandle,
}

#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum RenderError {
    #[error("widget {0} is not registered")]
    UnknownWidget(WidgetId),

    #[error("widget {0} could not be updated: {1}")]
    Backend(WidgetId, String),
}

/// The sink the pipeline renders into, usually the host's widget manager.
pub trait WidgetRenderTarget {
    /// Replaces the content of widget `id` with `view`.
    ///
    /// Must be idempotent: rendering the same view twice leaves the widget in
    /// the same state.
    fn render(&self, id: WidgetId, view: &WidgetView) -> Result<(), RenderError>;
}

#[test]
fn test_tap_handle_trigger() {
    let tap = TapHandle::new(WidgetId(7));

    assert_eq!(tap.widget_id(), WidgetId(7));
    assert_eq!(tap.trigger(), Trigger::UserInitiated { widget_id: WidgetId(7) });
    assert_eq!(WidgetId(7).to_string(), "#7");
}
