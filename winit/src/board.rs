// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use climate_widget_common::{RenderError, ValueStore, WidgetId, WidgetRenderTarget, WidgetView};

/// The registered widgets of the host.
///
/// Rendering only parks the view in the widget's [`ValueStore`]. The UI thread
/// picks it up from there, so the pipeline never touches slint objects.
#[derive(Default)]
pub struct WidgetBoard {
    widgets: Mutex<BTreeMap<WidgetId, ValueStore<WidgetView>>>,
}

impl WidgetBoard {
    /// Registers `id` and returns the store its window should poll.
    pub fn register(&self, id: WidgetId) -> ValueStore<WidgetView> {
        let store = ValueStore::default();
        self.lock().insert(id, store.clone());
        store
    }

    pub fn unregister(&self, id: WidgetId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Snapshot of the currently registered widgets.
    pub fn ids(&self) -> Vec<WidgetId> {
        self.lock().keys().copied().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<WidgetId, ValueStore<WidgetView>>> {
        self.widgets.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WidgetRenderTarget for WidgetBoard {
    fn render(&self, id: WidgetId, view: &WidgetView) -> Result<(), RenderError> {
        let widgets = self.lock();
        let store = widgets.get(&id).ok_or(RenderError::UnknownWidget(id))?;
        store.set(view.clone());
        Ok(())
    }
}
