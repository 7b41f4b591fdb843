use pdf_annotator_core::{
    AnnotationDraft, AnnotationSink, HighlightRect, JsonFileSink, Point, Rect, SelectionRange,
    SelectionSource, Size, TextLayerHit, TextLayerLocator,
};
use pdf_annotator_ui::{
    ClientRect, DismissEvent, Viewer, ViewerConfig, ViewerEvent, ViewportContainer,
};
use std::cell::Cell;
use std::rc::Rc;

const PAGE_LEFT: f32 = 100.0;
const PAGE_TOP: f32 = 50.0;
const PAGE_HEIGHT: f32 = 800.0;
const PAGE_GAP: f32 = 20.0;

/// Three pages stacked in a scrollable container
struct ScrolledPages {
    scroll_top: Cell<f32>,
    zoom: Cell<f32>,
}

impl ScrolledPages {
    fn new() -> Rc<Self> {
        Rc::new(Self {
            scroll_top: Cell::new(0.0),
            zoom: Cell::new(1.0),
        })
    }

    fn origin(&self, page_number: u32) -> Point {
        let stride = (PAGE_HEIGHT + PAGE_GAP) * self.zoom.get();
        let top = PAGE_TOP + (page_number - 1) as f32 * stride - self.scroll_top.get();
        Point::new(PAGE_LEFT, top)
    }
}

impl ViewportContainer for ScrolledPages {
    fn page_origin(&self, page_number: u32) -> Option<Point> {
        (1..=3)
            .contains(&page_number)
            .then(|| self.origin(page_number))
    }

    fn viewport_size(&self) -> Size {
        Size::new(1280.0, 900.0)
    }
}

impl TextLayerLocator for ScrolledPages {
    fn text_layer_at(&self, point: Point) -> Option<TextLayerHit> {
        (1..=3).find_map(|page_number| {
            let origin = self.origin(page_number);
            let bottom = origin.y + PAGE_HEIGHT * self.zoom.get();
            (point.x >= origin.x && point.y >= origin.y && point.y <= bottom)
                .then(|| TextLayerHit {
                    page_number,
                    origin,
                })
        })
    }
}

struct Selection(SelectionRange);

impl SelectionSource for Selection {
    fn active_range(&self) -> Option<SelectionRange> {
        Some(self.0.clone())
    }
}

fn viewer_with(sink: JsonFileSink, pages: &Rc<ScrolledPages>) -> Viewer {
    let container: Rc<dyn ViewportContainer> = pages.clone();
    Viewer::new(ViewerConfig::default(), Box::new(sink)).with_container(container)
}

fn draft_on(page_number: u32, rect: Rect) -> AnnotationDraft {
    let highlight = HighlightRect::document(page_number, rect);
    AnnotationDraft::new(page_number, vec![highlight])
}

fn anchor_rect(anchor: ClientRect) -> Rect {
    Rect::from(anchor)
}

#[test]
fn selection_across_pages_becomes_one_annotation_per_page() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let sink = JsonFileSink::new(temp.path(), "document");
    let pages = ScrolledPages::new();
    let mut viewer = viewer_with(sink.clone(), &pages);

    // last two lines of page 1, a 1px artifact, first line of page 2
    let selection = Selection(SelectionRange {
        client_rects: vec![
            Rect::new(120.0, 800.0, 200.0, 14.0),
            Rect::new(321.0, 800.0, 100.0, 14.0),
            Rect::new(120.0, 816.0, 150.0, 14.0),
            Rect::new(430.0, 800.0, 1.0, 14.0),
            Rect::new(120.0, 880.0, 180.0, 14.0),
        ],
        text: "  spans a page break \n".to_string(),
        is_collapsed: false,
    });

    let ids = viewer.create_annotation_from_selection(&selection, &*pages);
    assert_eq!(ids.len(), 2);

    let first = viewer.store().get(ids[0]).unwrap();
    let second = viewer.store().get(ids[1]).unwrap();
    assert_eq!(first.page_number, 1);
    assert_eq!(second.page_number, 2);
    assert!(first.highlights.iter().all(|h| h.page_number == 1));
    assert_eq!(first.comment.as_deref(), Some("spans a page break"));
    assert_eq!(
        second.highlights,
        vec![HighlightRect::document(2, Rect::new(20.0, 10.0, 180.0, 14.0))]
    );

    // the 1px artifact never shows up
    assert!(first
        .highlights
        .iter()
        .all(|h| h.width >= 2.0 && h.height >= 2.0));

    assert!(sink.path().exists());
    assert_eq!(sink.load().unwrap(), viewer.store().as_slice());
}

#[test]
fn restored_annotations_round_trip_through_file_sink() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let sink = JsonFileSink::new(temp.path(), "document");
    let pages = ScrolledPages::new();

    let mut writer = viewer_with(sink.clone(), &pages);
    let draft = draft_on(3, Rect::new(5.0, 6.0, 7.0, 8.0));
    let id = writer.add_annotation(draft.with_color("#ffcc00")).unwrap();
    let original = writer.store().get(id).unwrap().clone();

    let mut reader = viewer_with(sink, &pages);
    assert_eq!(reader.restore(), 1);
    assert_eq!(reader.store().get(id), Some(&original));
    assert_eq!(reader.mount_tooltips_for_page(3), 1);
    assert!(reader.tooltip(id).is_some());
}

#[test]
fn anchor_covers_every_highlight_and_follows_zoom() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pages = ScrolledPages::new();
    let mut viewer = viewer_with(JsonFileSink::new(temp.path(), "document"), &pages);

    let id = viewer
        .add_annotation(AnnotationDraft::new(
            1,
            vec![
                HighlightRect::document(1, Rect::new(20.0, 10.0, 30.0, 5.0)),
                HighlightRect::document(1, Rect::new(300.0, 400.0, 40.0, 10.0)),
            ],
        ))
        .unwrap();

    let tooltip = viewer.tooltip(id).unwrap();
    assert!(tooltip.is_open());
    assert_eq!(
        anchor_rect(tooltip.anchor()),
        Rect::new(120.0, 60.0, 320.0, 400.0)
    );

    pages.zoom.set(2.0);
    viewer.set_zoom(2.0);
    assert_eq!(viewer.run_frame().executed, 1);

    let anchor = viewer.tooltip(id).unwrap().anchor();
    assert_eq!(anchor.top, PAGE_TOP + 20.0);
    assert_eq!(anchor.left, PAGE_LEFT + 40.0);
    assert_eq!(anchor.right, PAGE_LEFT + 680.0);
    assert_eq!(anchor.bottom, PAGE_TOP + 820.0);
}

#[test]
fn scroll_bursts_recompute_once_and_close_cancels_pending_work() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pages = ScrolledPages::new();
    let mut viewer = viewer_with(JsonFileSink::new(temp.path(), "document"), &pages);

    let line_at = |top: f32| draft_on(1, Rect::new(10.0, top, 50.0, 12.0));
    let kept = viewer.add_annotation(line_at(100.0)).unwrap();
    let closed = viewer.add_annotation(line_at(300.0)).unwrap();
    let kept_before = viewer.tooltip(kept).unwrap().recompute_count();
    let closed_before = viewer.tooltip(closed).unwrap().recompute_count();

    pages.scroll_top.set(75.0);
    for _ in 0..20 {
        viewer.events().emit(&ViewerEvent::Scroll);
    }
    viewer.tooltip_mut(closed).unwrap().close();

    let stats = viewer.run_frame();
    assert_eq!(stats.executed, 1);
    assert_eq!(stats.skipped, 1);

    let kept_tooltip = viewer.tooltip(kept).unwrap();
    assert_eq!(kept_tooltip.recompute_count(), kept_before + 1);
    assert_eq!(kept_tooltip.anchor().top, PAGE_TOP + 100.0 - 75.0);

    let closed_tooltip = viewer.tooltip(closed).unwrap();
    assert_eq!(closed_tooltip.recompute_count(), closed_before);
    assert!(!closed_tooltip.is_open());

    // nothing left for later frames either
    assert_eq!(viewer.run_frame().executed, 0);
}

#[test]
fn unmounted_page_degrades_to_zero_anchor() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pages = ScrolledPages::new();
    let mut viewer = viewer_with(JsonFileSink::new(temp.path(), "document"), &pages);

    let id = viewer
        .add_annotation(draft_on(9, Rect::new(1.0, 1.0, 10.0, 10.0)))
        .unwrap();
    let tooltip = viewer.tooltip(id).unwrap();
    assert!(tooltip.is_open());
    assert!(tooltip.anchor().is_zero());
    assert!(tooltip.position().is_some());
}

#[test]
fn outside_click_dismisses_and_releases_listeners() {
    let temp = tempfile::tempdir().expect("temp dir should be created");
    let pages = ScrolledPages::new();
    let mut viewer = viewer_with(JsonFileSink::new(temp.path(), "document"), &pages);
    let registration = viewer.registry().register(1);

    let id = viewer
        .add_annotation(draft_on(1, Rect::new(10.0, 10.0, 50.0, 12.0)))
        .unwrap();
    let listeners_with_tooltip = viewer.events().total_listeners();

    let inside = Point::new(PAGE_LEFT + 20.0, PAGE_TOP + 15.0);
    assert_eq!(viewer.dismiss(DismissEvent::OutsidePointerDown(inside)), 0);
    let outside = Point::new(1200.0, 880.0);
    assert_eq!(viewer.dismiss(DismissEvent::OutsidePointerDown(outside)), 1);
    assert!(!viewer.tooltip(id).unwrap().is_open());
    assert_eq!(
        viewer.events().total_listeners(),
        listeners_with_tooltip - 3
    );

    drop(registration);
    assert_eq!(viewer.events().total_listeners(), 0);
}
