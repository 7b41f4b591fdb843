//! Annotation data model and store
//!
//! An annotation is a set of highlight rectangles on one page plus editable
//! metadata. Rectangles are always stored in document units so re-projecting
//! at any zoom is a multiplication.

use crate::geometry::{CoordinateSpace, HighlightRect, Rect};
use crate::selection::CollapsibleSelection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Unique identifier for an annotation
///
/// Stable across sessions, persisted with the annotation.
pub type AnnotationId = uuid::Uuid;

/// Default fill for highlights without an explicit color
pub const DEFAULT_HIGHLIGHT_COLOR: &str = "rgba(255, 255, 0, 0.3)";

/// Errors raised when building or storing annotations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnnotationError {
    #[error("annotation has no highlight rectangles")]
    NoHighlights,
    #[error("highlight on page {found} does not belong to annotation page {expected}")]
    PageMismatch { expected: u32, found: u32 },
    #[error("highlight is in {0:?}, annotations store document units")]
    NotDocumentUnits(CoordinateSpace),
    #[error("page numbers start at 1")]
    InvalidPage,
}

/// A stored highlight with optional comment and color
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub id: AnnotationId,
    pub page_number: u32,
    /// Rectangles in document units, all on `page_number`
    pub highlights: Vec<HighlightRect>,
    pub comment: Option<String>,
    /// CSS color
    pub color: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Annotation {
    /// Build an annotation from a validated draft
    pub fn from_draft(draft: AnnotationDraft, now: DateTime<Utc>) -> Result<Self, AnnotationError> {
        draft.validate()?;
        Ok(Self {
            id: AnnotationId::new_v4(),
            page_number: draft.page_number,
            highlights: draft.highlights,
            comment: draft.comment,
            color: draft.color,
            created_at: now,
            updated_at: now,
        })
    }

    /// Bounding box of all highlights in document units
    pub fn bounds(&self) -> Option<Rect> {
        let rects: Vec<Rect> = self.highlights.iter().map(HighlightRect::rect).collect();
        Rect::union_all(&rects)
    }

    pub fn color_or_default(&self) -> &str {
        self.color.as_deref().unwrap_or(DEFAULT_HIGHLIGHT_COLOR)
    }

    /// Created within `window` of `now`
    pub fn is_new_at(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        let age = now.signed_duration_since(self.created_at);
        age >= chrono::Duration::zero() && age < window
    }

    fn apply(&mut self, update: AnnotationUpdate, now: DateTime<Utc>) {
        if let Some(comment) = update.comment {
            self.comment = comment;
        }
        if let Some(color) = update.color {
            self.color = color;
        }
        self.updated_at = now;
    }
}

/// An annotation that has not been stored yet
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationDraft {
    pub page_number: u32,
    pub highlights: Vec<HighlightRect>,
    pub comment: Option<String>,
    pub color: Option<String>,
}

impl AnnotationDraft {
    pub fn new(page_number: u32, highlights: Vec<HighlightRect>) -> Self {
        Self {
            page_number,
            highlights,
            comment: None,
            color: None,
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// One draft per page covered by the selection
    ///
    /// The selection text becomes the comment of every draft.
    pub fn from_selection(selection: &CollapsibleSelection) -> Vec<AnnotationDraft> {
        let mut by_page: BTreeMap<u32, Vec<HighlightRect>> = BTreeMap::new();
        for highlight in &selection.highlights {
            by_page
                .entry(highlight.page_number)
                .or_default()
                .push(*highlight);
        }

        let comment = (!selection.text.is_empty()).then(|| selection.text.clone());
        by_page
            .into_iter()
            .map(|(page_number, highlights)| AnnotationDraft {
                page_number,
                highlights,
                comment: comment.clone(),
                color: None,
            })
            .collect()
    }

    fn validate(&self) -> Result<(), AnnotationError> {
        if self.page_number == 0 {
            return Err(AnnotationError::InvalidPage);
        }
        if self.highlights.is_empty() {
            return Err(AnnotationError::NoHighlights);
        }
        for highlight in &self.highlights {
            if highlight.space != CoordinateSpace::DocumentUnits {
                return Err(AnnotationError::NotDocumentUnits(highlight.space));
            }
            if highlight.page_number != self.page_number {
                return Err(AnnotationError::PageMismatch {
                    expected: self.page_number,
                    found: highlight.page_number,
                });
            }
        }
        Ok(())
    }
}

/// Partial update; `Some(None)` clears a field
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationUpdate {
    pub comment: Option<Option<String>>,
    pub color: Option<Option<String>>,
}

impl AnnotationUpdate {
    pub fn comment(comment: impl Into<String>) -> Self {
        Self {
            comment: Some(Some(comment.into())),
            ..Self::default()
        }
    }

    pub fn color(color: impl Into<String>) -> Self {
        Self {
            color: Some(Some(color.into())),
            ..Self::default()
        }
    }
}

/// Application-level annotation store
///
/// Keeps insertion order, which is also the render order.
#[derive(Debug, Clone, Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and store a draft, returning the new id
    pub fn add(&mut self, draft: AnnotationDraft) -> Result<AnnotationId, AnnotationError> {
        self.add_at(draft, Utc::now())
    }

    pub fn add_at(
        &mut self,
        draft: AnnotationDraft,
        now: DateTime<Utc>,
    ) -> Result<AnnotationId, AnnotationError> {
        let annotation = Annotation::from_draft(draft, now).map_err(|err| {
            log::warn!("rejected annotation draft: {}", err);
            err
        })?;
        let id = annotation.id;
        self.annotations.push(annotation);
        Ok(id)
    }

    /// Apply an update and refresh `updated_at`. Returns false for unknown ids.
    pub fn update(&mut self, id: AnnotationId, update: AnnotationUpdate) -> bool {
        self.update_at(id, update, Utc::now())
    }

    pub fn update_at(
        &mut self,
        id: AnnotationId,
        update: AnnotationUpdate,
        now: DateTime<Utc>,
    ) -> bool {
        match self.annotations.iter_mut().find(|a| a.id == id) {
            Some(annotation) => {
                annotation.apply(update, now);
                true
            }
            None => false,
        }
    }

    pub fn delete(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id == id)?;
        Some(self.annotations.remove(index))
    }

    /// Replace the whole list, e.g. after restoring from persistence
    ///
    /// Entries without highlights, or with highlights off their own page,
    /// are dropped.
    pub fn set_all(&mut self, annotations: Vec<Annotation>) {
        let total = annotations.len();
        self.annotations = annotations
            .into_iter()
            .filter(|annotation| {
                annotation.page_number > 0
                    && !annotation.highlights.is_empty()
                    && annotation.highlights.iter().all(|h| {
                        h.page_number == annotation.page_number
                            && h.space == CoordinateSpace::DocumentUnits
                    })
            })
            .collect();
        if self.annotations.len() != total {
            log::warn!(
                "dropped {} malformed annotations",
                total - self.annotations.len()
            );
        }
    }

    /// Replace every annotation on `page_number` with one-rect annotations
    /// built from embedded PDF annotation rectangles `[x1, y1, x2, y2]`
    pub fn import_page_annotations(
        &mut self,
        page_number: u32,
        rects: &[[f32; 4]],
    ) -> Vec<AnnotationId> {
        if page_number == 0 {
            return Vec::new();
        }
        self.annotations.retain(|a| a.page_number != page_number);

        let now = Utc::now();
        let mut ids = Vec::with_capacity(rects.len());
        for [x1, y1, x2, y2] in rects {
            let rect = Rect::from_edges(*x1, *y1, *x2, *y2);
            let highlight = HighlightRect::document(page_number, rect);
            let draft = AnnotationDraft::new(page_number, vec![highlight]);
            if let Ok(id) = self.add_at(draft, now) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id == id)
    }

    pub fn for_page(&self, page_number: u32) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.page_number == page_number)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    pub fn as_slice(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

/// RFC 3339 with nanoseconds, so a save/load cycle is lossless
pub(crate) mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &DateTime<Utc>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Nanos, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|parsed| parsed.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rect_on(page: u32, left: f32) -> HighlightRect {
        HighlightRect::document(page, Rect::new(left, 10.0, 30.0, 12.0))
    }

    fn selection(highlights: Vec<HighlightRect>) -> CollapsibleSelection {
        CollapsibleSelection {
            highlights,
            text: "quoted text".to_string(),
            is_collapsed: false,
        }
    }

    #[test]
    fn test_add_and_get() {
        let mut store = AnnotationStore::new();
        let draft = AnnotationDraft::new(1, vec![rect_on(1, 0.0)]);
        let id = store.add(draft.with_color("red")).unwrap();

        let annotation = store.get(id).unwrap();
        assert_eq!(annotation.page_number, 1);
        assert_eq!(annotation.color_or_default(), "red");
        assert_eq!(annotation.created_at, annotation.updated_at);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_cross_page_draft_is_rejected() {
        let mut store = AnnotationStore::new();
        let draft = AnnotationDraft::new(1, vec![rect_on(1, 0.0), rect_on(2, 0.0)]);
        let result = store.add(draft);
        assert_eq!(
            result,
            Err(AnnotationError::PageMismatch {
                expected: 1,
                found: 2
            })
        );
        assert!(store.is_empty());
    }

    #[test]
    fn test_non_document_rects_are_rejected() {
        let viewport = HighlightRect::new(
            1,
            Rect::new(0.0, 0.0, 5.0, 5.0),
            CoordinateSpace::ViewportPixels,
        );
        let result = Annotation::from_draft(AnnotationDraft::new(1, vec![viewport]), Utc::now());
        let expected = AnnotationError::NotDocumentUnits(CoordinateSpace::ViewportPixels);
        assert_eq!(result, Err(expected));
    }

    #[test]
    fn test_empty_and_zero_page_drafts_are_rejected() {
        let now = Utc::now();
        assert_eq!(
            Annotation::from_draft(AnnotationDraft::new(1, Vec::new()), now),
            Err(AnnotationError::NoHighlights)
        );
        assert_eq!(
            Annotation::from_draft(AnnotationDraft::new(0, vec![rect_on(0, 0.0)]), now),
            Err(AnnotationError::InvalidPage)
        );
    }

    #[test]
    fn test_drafts_from_selection_split_per_page() {
        let drafts = AnnotationDraft::from_selection(&selection(vec![
            rect_on(1, 0.0),
            rect_on(1, 50.0),
            rect_on(2, 0.0),
        ]));

        assert_eq!(drafts.len(), 2);
        assert_eq!(drafts[0].page_number, 1);
        assert_eq!(drafts[0].highlights.len(), 2);
        assert_eq!(drafts[1].page_number, 2);
        assert_eq!(drafts[1].comment.as_deref(), Some("quoted text"));
    }

    #[test]
    fn test_update_refreshes_updated_at() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let later = created + chrono::Duration::seconds(30);

        let mut store = AnnotationStore::new();
        let id = store
            .add_at(AnnotationDraft::new(3, vec![rect_on(3, 0.0)]), created)
            .unwrap();

        let update = AnnotationUpdate::comment("note");
        assert!(store.update_at(id, update, later));
        let annotation = store.get(id).unwrap();
        assert_eq!(annotation.comment.as_deref(), Some("note"));
        assert_eq!(annotation.created_at, created);
        assert_eq!(annotation.updated_at, later);

        let clear = AnnotationUpdate {
            comment: Some(None),
            ..AnnotationUpdate::default()
        };
        assert!(store.update(id, clear));
        assert_eq!(store.get(id).unwrap().comment, None);

        let unknown = AnnotationId::new_v4();
        assert!(!store.update(unknown, AnnotationUpdate::color("blue")));
    }

    #[test]
    fn test_delete() {
        let mut store = AnnotationStore::new();
        let id = store.add(AnnotationDraft::new(1, vec![rect_on(1, 0.0)])).unwrap();
        assert!(store.delete(id).is_some());
        assert!(store.delete(id).is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_for_page_filters() {
        let mut store = AnnotationStore::new();
        store.add(AnnotationDraft::new(1, vec![rect_on(1, 0.0)])).unwrap();
        store.add(AnnotationDraft::new(2, vec![rect_on(2, 0.0)])).unwrap();
        store.add(AnnotationDraft::new(1, vec![rect_on(1, 40.0)])).unwrap();

        assert_eq!(store.for_page(1).count(), 2);
        assert_eq!(store.for_page(2).count(), 1);
        assert_eq!(store.for_page(9).count(), 0);
    }

    #[test]
    fn test_import_replaces_page_annotations() {
        let mut store = AnnotationStore::new();
        store.add(AnnotationDraft::new(4, vec![rect_on(4, 0.0)])).unwrap();
        let kept = store.add(AnnotationDraft::new(5, vec![rect_on(5, 0.0)])).unwrap();

        let rects = [[10.0, 20.0, 110.0, 40.0], [0.0, 0.0, 5.0, 5.0]];
        let ids = store.import_page_annotations(4, &rects);
        assert_eq!(ids.len(), 2);
        assert_eq!(store.len(), 3);
        assert!(store.get(kept).is_some());

        let imported = store.get(ids[0]).unwrap();
        assert_eq!(
            imported.highlights[0].rect(),
            Rect::new(10.0, 20.0, 100.0, 20.0)
        );
    }

    #[test]
    fn test_set_all_drops_multi_page_entries() {
        let now = Utc::now();
        let good =
            Annotation::from_draft(AnnotationDraft::new(1, vec![rect_on(1, 0.0)]), now).unwrap();
        let mut bad = good.clone();
        bad.id = AnnotationId::new_v4();
        bad.highlights.push(rect_on(2, 0.0));

        let mut store = AnnotationStore::new();
        store.set_all(vec![good.clone(), bad]);
        assert_eq!(store.as_slice(), &[good]);
    }

    #[test]
    fn test_recency_window() {
        let created = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let annotation =
            Annotation::from_draft(AnnotationDraft::new(1, vec![rect_on(1, 0.0)]), created)
                .unwrap();
        let window = chrono::Duration::seconds(1);
        let at = |millis: i64| created + chrono::Duration::milliseconds(millis);

        assert!(annotation.is_new_at(at(400), window));
        assert!(!annotation.is_new_at(at(1500), window));
        assert!(!annotation.is_new_at(at(-5000), window));
    }

    #[test]
    fn test_bounds() {
        let annotation = Annotation::from_draft(
            AnnotationDraft::new(1, vec![rect_on(1, 0.0), rect_on(1, 100.0)]),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(annotation.bounds(), Some(Rect::new(0.0, 10.0, 130.0, 12.0)));
    }

    #[test]
    fn test_timestamps_round_trip_through_json() {
        let created = Utc.timestamp_opt(1_714_564_800, 123_456_789).unwrap();
        let annotation = Annotation::from_draft(
            AnnotationDraft::new(2, vec![rect_on(2, 0.0)]).with_comment("c"),
            created,
        )
        .unwrap();

        let json = serde_json::to_string(&annotation).unwrap();
        assert!(json.contains("2024-05-01T12:00:00.123456789Z"));
        let restored: Annotation = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, annotation);
    }
}
