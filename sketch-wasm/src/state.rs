use std::cell::RefCell;
use std::rc::Rc;

use sketch_core::compose::SketchLayout;
use sketch_core::{InspectionFeed, LayoutConfig, SketchEditor, Size};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, Window};

use crate::api::ApiClient;

/// Screen padding used by zoom-to-fit, in canvas pixels.
pub const FIT_PADDING: f64 = 24.0;

/// Global application state stored behind an `Rc<RefCell<_>>` so it can be
/// shared across the WASM callbacks.
pub struct State {
    pub window: Window,
    pub document: Document,
    pub canvas: HtmlCanvasElement,
    pub ctx: CanvasRenderingContext2d,
    pub cfg: LayoutConfig,
    pub feed: InspectionFeed,
    pub layout: SketchLayout,
    pub editor: SketchEditor,
    /// `None` keeps every edit in the local feed.
    pub api: Option<ApiClient>,
    pub error: Option<String>,
    /// Called with the room id (or `null`) whenever the selection changes.
    pub on_select: Option<js_sys::Function>,
    fitted: bool,
}

impl State {
    pub fn new(
        window: Window,
        document: Document,
        canvas: HtmlCanvasElement,
        ctx: CanvasRenderingContext2d,
        cfg: LayoutConfig,
        api: Option<ApiClient>,
    ) -> Self {
        State {
            window,
            document,
            canvas,
            ctx,
            editor: SketchEditor::new(cfg.clone()),
            cfg,
            feed: InspectionFeed::default(),
            layout: SketchLayout::default(),
            api,
            error: None,
            on_select: None,
            fitted: false,
        }
    }

    pub fn viewport(&self) -> Size {
        Size::new(self.canvas.width() as f64, self.canvas.height() as f64)
    }

    /// Recompose from the feed and hand the result to the editor.
    pub fn relayout(&mut self) {
        self.layout = self.feed.layout(&self.cfg);
        self.editor.refresh(&self.layout);
    }

    /// Replace the whole feed. The first non-empty feed is zoomed to fit.
    pub fn set_feed(&mut self, feed: InspectionFeed) {
        self.feed = feed;
        self.relayout();
        if !self.fitted && !self.layout.is_empty() {
            self.zoom_to_fit();
            self.fitted = true;
        }
    }

    pub fn zoom_to_fit(&mut self) {
        let viewport = self.viewport();
        self.editor.zoom_to_fit(viewport, FIT_PADDING);
    }
}

thread_local! {
    pub static STATE: RefCell<Option<Rc<RefCell<State>>>> = const { RefCell::new(None) };
}
