//! Rectangle consolidation
//!
//! A text selection produces one client rectangle per line fragment, and
//! inline spans often split a single visual line into many slivers. The
//! consolidation policy merges overlapping or adjacent rectangles on the same
//! page into a small set of bounding boxes.

use crate::geometry::{CoordinateSpace, HighlightRect, Inset, Rect};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Default horizontal merge distance in document units
pub const DEFAULT_MERGE_THRESHOLD: f32 = 2.0;

/// Test deciding whether two rectangles belong to the same box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePredicate {
    /// Vertical spans intersect and the horizontal gap is under the threshold
    /// (or the rectangles already overlap horizontally)
    #[default]
    Proximity,
    /// Bounding boxes strictly intersect
    Overlap,
}

/// How merges are applied across a rectangle set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Pairwise merging repeated until no pair satisfies the predicate.
    /// Order independent.
    #[default]
    TransitiveClosure,
    /// Sort by (top, left) and merge runs of rectangles sitting on the same
    /// line in a single pass. Cheaper, but can leave mergeable boxes apart
    /// when a later line reaches back over an earlier one.
    LineSweep,
}

/// Configurable consolidation behavior
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RectConsolidationPolicy {
    pub merge_threshold: f32,
    pub predicate: MergePredicate,
    pub strategy: MergeStrategy,
    /// Outward padding applied to every consolidated rectangle
    pub padding: Inset,
}

impl Default for RectConsolidationPolicy {
    fn default() -> Self {
        Self {
            merge_threshold: DEFAULT_MERGE_THRESHOLD,
            predicate: MergePredicate::default(),
            strategy: MergeStrategy::default(),
            padding: Inset::default(),
        }
    }
}

impl RectConsolidationPolicy {
    pub fn new(merge_threshold: f32, predicate: MergePredicate, strategy: MergeStrategy) -> Self {
        Self {
            merge_threshold,
            predicate,
            strategy,
            padding: Inset::default(),
        }
    }

    pub fn with_threshold(mut self, merge_threshold: f32) -> Self {
        self.merge_threshold = merge_threshold;
        self
    }

    pub fn with_predicate(mut self, predicate: MergePredicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_padding(mut self, padding: Inset) -> Self {
        self.padding = padding;
        self
    }

    /// Padding used by highlight layers that want a little air around text
    pub fn highlight_padding() -> Inset {
        Inset::new(2.0, 2.0, 2.0, 0.0)
    }

    /// Whether `a` and `b` should become one rectangle
    pub fn should_merge(&self, a: &Rect, b: &Rect) -> bool {
        match self.predicate {
            MergePredicate::Proximity => {
                let threshold = self.merge_threshold;
                let horizontally_close = (a.right() - b.left).abs() < threshold
                    || (b.right() - a.left).abs() < threshold
                    || a.overlaps_horizontally(b);
                a.overlaps_vertically(b) && horizontally_close
            }
            MergePredicate::Overlap => a.intersects(b),
        }
    }

    /// Consolidate rectangles that all belong to one page
    pub fn consolidate(&self, rects: &[Rect]) -> Vec<Rect> {
        let merged = match self.strategy {
            MergeStrategy::TransitiveClosure => self.merge_to_fixed_point(rects),
            MergeStrategy::LineSweep => self.merge_line_runs(rects),
        };

        if self.padding.is_zero() {
            merged
        } else {
            merged
                .iter()
                .map(|rect| rect.inflate(&self.padding))
                .collect()
        }
    }

    /// Consolidate highlights independently per page
    ///
    /// Rectangles on different pages never merge. The result is ordered by
    /// page number, then top, then left.
    pub fn consolidate_highlights(&self, highlights: &[HighlightRect]) -> Vec<HighlightRect> {
        let mut groups: BTreeMap<u32, Vec<&HighlightRect>> = BTreeMap::new();
        for highlight in highlights {
            groups
                .entry(highlight.page_number)
                .or_default()
                .push(highlight);
        }

        let mut result = Vec::with_capacity(highlights.len());
        for (page_number, members) in groups {
            // Rectangles in different spaces are not comparable.
            let mut by_space: Vec<(CoordinateSpace, Vec<Rect>)> = Vec::new();
            for member in members {
                match by_space.iter_mut().find(|(space, _)| *space == member.space) {
                    Some((_, rects)) => rects.push(member.rect()),
                    None => by_space.push((member.space, vec![member.rect()])),
                }
            }

            for (space, rects) in by_space {
                let merged = self.consolidate(&rects);
                log::debug!(
                    "page {}: consolidated {} rects into {}",
                    page_number,
                    rects.len(),
                    merged.len()
                );
                result.extend(
                    merged.into_iter().map(|rect| HighlightRect::new(page_number, rect, space)),
                );
            }
        }
        result
    }

    fn merge_to_fixed_point(&self, rects: &[Rect]) -> Vec<Rect> {
        let mut merged: Vec<Rect> = rects.to_vec();

        loop {
            let mut changed = false;
            let mut settled: Vec<Rect> = Vec::with_capacity(merged.len());

            for rect in merged {
                let mut current = rect;
                let mut index = 0;
                // Absorbing a neighbour grows `current`, which may make an
                // earlier-rejected rect mergeable, so rescan from the start.
                while index < settled.len() {
                    if self.should_merge(&settled[index], &current) {
                        current = current.union(&settled.swap_remove(index));
                        changed = true;
                        index = 0;
                    } else {
                        index += 1;
                    }
                }
                settled.push(current);
            }

            merged = settled;
            if !changed {
                break;
            }
        }

        merged.sort_by(reading_order);
        merged
    }

    fn merge_line_runs(&self, rects: &[Rect]) -> Vec<Rect> {
        let mut sorted = rects.to_vec();
        sorted.sort_by(reading_order);

        let mut iter = sorted.into_iter();
        let Some(mut current) = iter.next() else {
            return Vec::new();
        };

        let mut merged = Vec::new();
        for next in iter {
            let same_line = (next.top - current.top).abs() < self.merge_threshold;
            let adjacent = next.left - current.right() < self.merge_threshold;

            if same_line && adjacent {
                current = current.union(&next);
            } else {
                merged.push(current);
                current = next;
            }
        }
        merged.push(current);
        merged
    }
}

fn reading_order(a: &Rect, b: &Rect) -> Ordering {
    a.top.total_cmp(&b.top).then(a.left.total_cmp(&b.left))
}
