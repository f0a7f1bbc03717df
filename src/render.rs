// src/render.rs
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::models::{DisplayModel, HeadlineClass};

/// One painted line of the per-row list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowLine {
    pub text: String,
    pub color: String,
}

/// Everything the page paints for one display model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedView {
    pub badge_text: String,
    pub badge_class: HeadlineClass,
    pub badge_color: String,
    pub subtitle: String,
    pub is_error: bool,
    pub lines: Vec<RowLine>,
    /// "… and N more rows", when rows were cut.
    pub overflow_note: Option<String>,
    pub summary: Option<String>,
    /// The result container is shown for successes and errors alike.
    pub visible: bool,
}

impl From<&DisplayModel> for RenderedView {
    fn from(model: &DisplayModel) -> Self {
        let lines = model
            .rows
            .iter()
            .map(|row| RowLine {
                text: format!("Row {}: {} → {}", row.index + 1, row.value, row.label),
                color: row.color_hint.clone(),
            })
            .collect();

        let overflow_note = (model.hidden_rows > 0).then(|| {
            format!(
                "… and {} more row{}",
                model.hidden_rows,
                if model.hidden_rows == 1 { "" } else { "s" }
            )
        });

        let summary = model.row_count.map(|n| match n {
            1 => "1 row predicted".to_string(),
            n => format!("{} rows predicted", n),
        });

        RenderedView {
            badge_text: model.headline.clone(),
            badge_class: model.headline_class,
            badge_color: model.headline_color.clone(),
            subtitle: model.subtitle.clone(),
            is_error: model.is_error,
            lines,
            overflow_note,
            summary,
            visible: true,
        }
    }
}

/// Paints a finished display model. Invoked only at the edge of the pipeline.
pub trait Renderer: Send + Sync {
    fn render(&self, model: &DisplayModel);
}

/// Writes the view to the log.
#[derive(Debug, Default)]
pub struct ConsoleRenderer;

impl Renderer for ConsoleRenderer {
    fn render(&self, model: &DisplayModel) {
        let view = RenderedView::from(model);
        if view.is_error {
            log::warn!("❌ {} {}", view.badge_text, view.subtitle);
            return;
        }
        log::info!("🏷️  {} [{}] {}", view.badge_text, view.badge_class, view.subtitle);
        for line in &view.lines {
            log::info!("   {}", line.text);
        }
        if let Some(note) = &view.overflow_note {
            log::info!("   {}", note);
        }
    }
}

/// Keeps the latest view so it can be served to the page.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    latest: RwLock<Option<RenderedView>>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn latest(&self) -> Option<RenderedView> {
        match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl Renderer for MemoryRenderer {
    fn render(&self, model: &DisplayModel) {
        let view = RenderedView::from(model);
        match self.latest.write() {
            Ok(mut guard) => *guard = Some(view),
            Err(poisoned) => *poisoned.into_inner() = Some(view),
        }
    }
}

/// Fans one model out to several renderers.
pub struct Renderers(pub Vec<std::sync::Arc<dyn Renderer>>);

impl Renderer for Renderers {
    fn render(&self, model: &DisplayModel) {
        for renderer in &self.0 {
            renderer.render(model);
        }
    }
}
