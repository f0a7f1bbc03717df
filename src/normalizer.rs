// src/normalizer.rs
//! Turns whatever JSON the prediction backend returned into one `DisplayModel`.
//!
//! The backend's response shape has changed across versions, so every field is
//! resolved through a fixed precedence chain:
//!
//! | Output        | Sources, first present wins                                                     |
//! |---------------|---------------------------------------------------------------------------------|
//! | headline      | `results[0].label`, `predicted_label`, `label`, `predicted`, `predictions[0]`, `"--"` |
//! | category      | `results[0].class` / `.value` / `.color`, numeric `predictions[0]`, label inference   |
//! | rows          | `results`, `predictions` list                                                   |
//! | subtitle      | `score` + `probability`, category phrase                                        |
//! | row count     | `n_rows`, `predictions` length, `results` length                                |

use crate::models::{
    format_score, DisplayModel, DisplayRow, HeadlineClass, RawResult, ResultEntry, Scalar,
    PLACEHOLDER,
};

/// Scores at or above this are read as the adverse outcome.
pub const DECISION_THRESHOLD: f64 = 0.75;

/// At most this many per-row lines are displayed.
pub const ROW_DISPLAY_CAP: usize = 20;

/// Badge color for errors and unknown categories.
pub const NEUTRAL_COLOR: &str = "#6c757d";

const SUBTITLE_SEPARATOR: &str = " | ";

/// Display wording and color for one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryStyle {
    /// Replaces a bare indicator headline such as `"0"`.
    pub short_label: &'static str,
    /// Row label when the backend gives none.
    pub phrase: &'static str,
    /// Subtitle when no score or probability is present.
    pub class_text: &'static str,
    pub color: &'static str,
    /// Exact tokens, compared case-insensitively.
    pub tokens: &'static [&'static str],
    /// Words that mark the category anywhere inside a label.
    pub words: &'static [&'static str],
    /// Numeric class index.
    pub index: usize,
}

pub const POSITIVE: CategoryStyle = CategoryStyle {
    short_label: "Abnormal",
    phrase: "Moderate to severe OSA",
    class_text: "Class: 1 (Moderate/severe OSA)",
    color: "#dc3545",
    tokens: &["1"],
    words: &["positive"],
    index: 1,
};

pub const NEGATIVE: CategoryStyle = CategoryStyle {
    short_label: "Normal",
    phrase: "No or mild OSA",
    class_text: "Class: 0 (No/mild OSA)",
    color: "#28a745",
    tokens: &["0"],
    words: &["negative"],
    index: 0,
};

impl CategoryStyle {
    fn for_class(class: HeadlineClass) -> Option<&'static CategoryStyle> {
        match class {
            HeadlineClass::Positive => Some(&POSITIVE),
            HeadlineClass::Negative => Some(&NEGATIVE),
            HeadlineClass::Unknown => None,
        }
    }

    fn is_token(&self, label: &str) -> bool {
        let label = label.trim();
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(label))
            || self.words.iter().any(|w| w.eq_ignore_ascii_case(label))
            || label
                .parse::<f64>()
                .is_ok_and(|v| v == self.index as f64)
    }

    fn matches(&self, label: &str) -> bool {
        let lower = label.trim().to_lowercase();
        self.is_token(&lower)
            || self.words.iter().any(|w| lower.contains(w))
            || lower == self.phrase.to_lowercase()
    }
}

fn color_of(class: HeadlineClass) -> &'static str {
    CategoryStyle::for_class(class).map_or(NEUTRAL_COLOR, |s| s.color)
}

fn phrase_of(class: HeadlineClass) -> &'static str {
    CategoryStyle::for_class(class).map_or(PLACEHOLDER, |s| s.phrase)
}

/// Case-insensitive category inference from a label.
pub fn infer_class(label: &str) -> HeadlineClass {
    if NEGATIVE.matches(label) {
        HeadlineClass::Negative
    } else if POSITIVE.matches(label) {
        HeadlineClass::Positive
    } else {
        HeadlineClass::Unknown
    }
}

/// Where the headline text came from.
enum HeadlineSource {
    Label(String),
    Score(f64),
    Placeholder,
}

/// Maps raw backend responses to display models. Holds only immutable settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultNormalizer {
    threshold: f64,
    row_cap: usize,
}

impl Default for ResultNormalizer {
    fn default() -> Self {
        Self {
            threshold: DECISION_THRESHOLD,
            row_cap: ROW_DISPLAY_CAP,
        }
    }
}

impl ResultNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn classify_score(&self, score: f64) -> HeadlineClass {
        if score >= self.threshold {
            HeadlineClass::Positive
        } else {
            HeadlineClass::Negative
        }
    }

    pub fn normalize(&self, raw: &RawResult) -> DisplayModel {
        let source = headline_source(raw);
        let (headline_class, entry_color) = self.headline_category(raw, &source);

        let headline = match &source {
            HeadlineSource::Label(label) => CategoryStyle::for_class(headline_class)
                .filter(|style| style.is_token(label))
                .map_or_else(|| label.clone(), |style| style.short_label.to_string()),
            HeadlineSource::Score(score) => format_score(*score),
            HeadlineSource::Placeholder => PLACEHOLDER.to_string(),
        };

        let (rows, hidden_rows) = self.display_rows(raw);

        DisplayModel {
            headline,
            headline_class,
            headline_color: entry_color.unwrap_or_else(|| color_of(headline_class).to_string()),
            subtitle: subtitle(raw, headline_class),
            rows,
            hidden_rows,
            row_count: row_count(raw),
            is_error: false,
        }
    }

    pub fn normalize_error(&self, message: impl Into<String>) -> DisplayModel {
        DisplayModel {
            headline: PLACEHOLDER.to_string(),
            headline_class: HeadlineClass::Unknown,
            headline_color: NEUTRAL_COLOR.to_string(),
            subtitle: message.into(),
            rows: Vec::new(),
            hidden_rows: 0,
            row_count: None,
            is_error: true,
        }
    }

    /// Category and, when the backend supplied one, the badge color.
    fn headline_category(
        &self,
        raw: &RawResult,
        source: &HeadlineSource,
    ) -> (HeadlineClass, Option<String>) {
        if let Some(entry) = raw
            .first_result()
            .filter(|e| e.class.is_some() || e.color.is_some())
        {
            return (self.entry_class(entry), entry.color.clone());
        }

        let class = match source {
            HeadlineSource::Score(score) => self.classify_score(*score),
            HeadlineSource::Label(label) => infer_class(label),
            HeadlineSource::Placeholder => HeadlineClass::Unknown,
        };
        (class, None)
    }

    fn entry_class(&self, entry: &ResultEntry) -> HeadlineClass {
        if let Some(class) = &entry.class {
            return match class.as_count() {
                Some(1) => HeadlineClass::Positive,
                Some(0) => HeadlineClass::Negative,
                _ => infer_class(&class.as_label()),
            };
        }
        if let Some(value) = entry.value {
            return self.classify_score(value);
        }
        entry
            .label
            .as_deref()
            .map_or(HeadlineClass::Unknown, infer_class)
    }

    /// Per-row lines, capped, plus the number of rows left out.
    fn display_rows(&self, raw: &RawResult) -> (Vec<DisplayRow>, usize) {
        let rows: Vec<DisplayRow> = if let Some(results) =
            raw.results.as_ref().filter(|r| !r.is_empty())
        {
            results
                .iter()
                .take(self.row_cap)
                .enumerate()
                .map(|(index, entry)| self.result_row(index, entry))
                .collect()
        } else if let Some(predictions) = raw.predictions.as_ref().and_then(|p| p.per_row()) {
            let labels = raw.labels.as_deref().unwrap_or_default();
            predictions
                .iter()
                .take(self.row_cap)
                .enumerate()
                .map(|(index, prediction)| self.prediction_row(index, prediction, labels.get(index)))
                .collect()
        } else {
            Vec::new()
        };

        let total = raw
            .results
            .as_ref()
            .filter(|r| !r.is_empty())
            .map(Vec::len)
            .or_else(|| raw.predictions.as_ref().and_then(|p| p.per_row()).map(<[_]>::len))
            .unwrap_or(0);

        let hidden = total.saturating_sub(rows.len());
        (rows, hidden)
    }

    fn result_row(&self, index: usize, entry: &ResultEntry) -> DisplayRow {
        let class = self.entry_class(entry);
        let value = entry
            .value
            .map(format_score)
            .or_else(|| entry.class.as_ref().map(Scalar::as_label))
            .unwrap_or_else(|| PLACEHOLDER.to_string());

        DisplayRow {
            index,
            value,
            label: entry
                .label
                .clone()
                .unwrap_or_else(|| phrase_of(class).to_string()),
            color_hint: entry
                .color
                .clone()
                .unwrap_or_else(|| color_of(class).to_string()),
        }
    }

    fn prediction_row(&self, index: usize, prediction: &Scalar, label: Option<&Scalar>) -> DisplayRow {
        let (value, class) = match prediction.as_f64() {
            Some(score) => (format_score(score), self.classify_score(score)),
            None => {
                let text = prediction
                    .non_blank_label()
                    .unwrap_or_else(|| PLACEHOLDER.to_string());
                let class = infer_class(&text);
                (text, class)
            }
        };

        let label = match label.and_then(Scalar::non_blank_label) {
            Some(label) => label,
            None if class == HeadlineClass::Unknown => value.clone(),
            None => phrase_of(class).to_string(),
        };

        DisplayRow {
            index,
            value,
            label,
            color_hint: color_of(class).to_string(),
        }
    }
}

fn headline_source(raw: &RawResult) -> HeadlineSource {
    let label = raw
        .first_result()
        .and_then(|e| e.label.clone())
        .or_else(|| raw.predicted_label.as_ref().and_then(Scalar::non_blank_label))
        .or_else(|| raw.label.as_ref().and_then(Scalar::non_blank_label))
        .or_else(|| raw.predicted.as_ref().and_then(Scalar::non_blank_label));

    if let Some(label) = label {
        return HeadlineSource::Label(label);
    }

    match raw.predictions.as_ref().and_then(|p| p.first()) {
        Some(first) => match (first.as_f64(), first.non_blank_label()) {
            (Some(score), _) => HeadlineSource::Score(score),
            (None, Some(label)) => HeadlineSource::Label(label),
            (None, None) => HeadlineSource::Placeholder,
        },
        None => HeadlineSource::Placeholder,
    }
}

fn subtitle(raw: &RawResult, class: HeadlineClass) -> String {
    let probability = raw.probability.as_ref().or_else(|| {
        raw.probabilities
            .as_ref()
            .and_then(|p| p.first())
            .filter(|p| p.as_f64().is_some())
    });

    let parts: Vec<String> = [("Score", raw.score.as_ref()), ("Probability", probability)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| format!("{}: {}", name, v)))
        .collect();

    if !parts.is_empty() {
        return parts.join(SUBTITLE_SEPARATOR);
    }

    CategoryStyle::for_class(class)
        .map(|s| s.class_text.to_string())
        .unwrap_or_default()
}

fn row_count(raw: &RawResult) -> Option<usize> {
    raw.n_rows
        .as_ref()
        .and_then(Scalar::as_count)
        .or_else(|| {
            raw.predictions
                .as_ref()
                .and_then(|p| p.per_row())
                .filter(|p| !p.is_empty())
                .map(<[_]>::len)
        })
        .or_else(|| raw.results.as_ref().filter(|r| !r.is_empty()).map(Vec::len))
}
