mod api;
mod canvas;
mod state;
mod upload;
mod utils;

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use blueprint_core::{SvgOptions, build_sketch_svg, svg_escape};
use log::{LevelFilter, debug, info, warn};
use sketch_core::compose::dimension_label;
use sketch_core::editor::{DragMode, Handle, HitTarget};
use sketch_core::{
    EditorIntent, InspectionFeed, LayoutConfig, OpeningSpec, OpeningType, Point, Rect, RoomId,
    RoomUpdate,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{
    CanvasRenderingContext2d, Document, Event, HtmlCanvasElement, HtmlElement, HtmlInputElement,
    HtmlSelectElement, KeyboardEvent, MouseEvent, WheelEvent,
};

use crate::api::{ApiClient, ApiError};
use crate::canvas::{
    draw_grid, draw_opening, draw_partition, draw_room, draw_section_title, draw_selection,
    draw_structure_header, set_fill_style,
};
use crate::state::{STATE, State};
use crate::utils::{
    event_canvas_coords, get_query_param, init_logging, save_text_as_file, sync_canvas_size,
};

pub(crate) fn draw(s: &mut State) {
    sync_canvas_size(s);
    let width = s.canvas.width() as f64;
    let height = s.canvas.height() as f64;
    let ctx = s.ctx.clone();
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.clear_rect(0.0, 0.0, width, height);
    set_fill_style(&ctx, "#ffffff");
    ctx.fill_rect(0.0, 0.0, width, height);

    if s.layout.is_empty() {
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.set_font("16px sans-serif");
        set_fill_style(&ctx, "#6b7280");
        let _ = ctx.fill_text("No rooms yet", width / 2.0, height / 2.0);
        update_status_dom(s);
        return;
    }

    let view = s.editor.view;
    let _ = ctx.set_transform(view.zoom, 0.0, 0.0, view.zoom, view.origin.x, view.origin.y);
    if s.editor.snap_enabled() {
        let tl = view.screen_to_canvas(Point::new(0.0, 0.0));
        let br = view.screen_to_canvas(Point::new(width, height));
        let area = Rect::new(tl.x, tl.y, br.x - tl.x, br.y - tl.y);
        draw_grid(&ctx, &area, s.cfg.grid_size, view.zoom);
    }
    for header in &s.layout.headers {
        draw_structure_header(&ctx, header, s.layout.width, s.layout.margin);
    }
    for section in &s.layout.sections {
        draw_section_title(&ctx, section, s.layout.margin);
    }
    for room in &s.layout.rooms {
        let rect = s.editor.rect_of(room.id).unwrap_or(room.rect);
        draw_room(&ctx, room, &rect, view.zoom, s.cfg.scale);
    }
    for wall in &s.layout.shared_walls {
        if s.editor.has_override(wall.room_a) || s.editor.has_override(wall.room_b) {
            continue;
        }
        draw_partition(&ctx, &wall.segment, view.zoom);
    }
    for sym in &s.layout.openings {
        let Some(room) = s.layout.room(sym.room_id) else {
            continue;
        };
        let rect = s.editor.rect_of(room.id).unwrap_or(room.rect);
        if (rect.w - room.rect.w).abs() > 1e-9 || (rect.h - room.rect.h).abs() > 1e-9 {
            // placement is recomputed once the resize is saved
            continue;
        }
        draw_opening(&ctx, sym, rect.x - room.rect.x, rect.y - room.rect.y, view.zoom);
    }

    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    if let Some(id) = s.editor.selected() {
        if let Some(rect) = s.editor.rect_of(id) {
            let corners = rect.corners().map(|p| view.canvas_to_screen(p));
            let handles: Vec<(Handle, Point)> = Handle::ALL
                .iter()
                .map(|h| (*h, view.canvas_to_screen(h.anchor(&rect))))
                .collect();
            draw_selection(&ctx, corners, &handles, s.cfg.handle_size);
        }
    }
    update_status_dom(s);
}

fn html_element(doc: &Document, id: &str) -> Option<HtmlElement> {
    doc.get_element_by_id(id)?.dyn_into::<HtmlElement>().ok()
}

fn update_status_dom(s: &State) {
    let Some(el) = html_element(&s.document, "status") else {
        return;
    };
    let text = format!(
        "{} rooms · {} openings · {:.0}% · grid {}",
        s.layout.rooms.len(),
        s.layout.openings.len(),
        s.editor.view.zoom * 100.0,
        if s.editor.snap_enabled() { "on" } else { "off" }
    );
    el.set_text_content(Some(&text));
}

pub(crate) fn update_details_dom(s: &State) {
    let Some(el) = html_element(&s.document, "details") else {
        return;
    };
    let Some(room) = s.editor.selected().and_then(|id| s.feed.room(id)) else {
        el.set_inner_html("<p class=\"hint\">Select a room to see its details.</p>");
        return;
    };
    let placed = s.layout.room(room.id);
    let view = placed.map(|p| p.view.title()).unwrap_or("");
    let label = placed
        .map(|p| p.label.clone())
        .unwrap_or_else(|| dimension_label(room));
    let mut html = format!(
        "<h3>{}</h3><dl>\
         <dt>Type</dt><dd>{}</dd>\
         <dt>View</dt><dd>{}</dd>\
         <dt>Structure</dt><dd>{}</dd>\
         <dt>Size</dt><dd>{}</dd>\
         <dt>Status</dt><dd>{}</dd>\
         <dt>Damage</dt><dd>{}</dd>\
         <dt>Photos</dt><dd>{}</dd></dl>",
        svg_escape(&room.name),
        svg_escape(room.room_type.as_deref().unwrap_or("—")),
        view,
        svg_escape(room.structure_name()),
        svg_escape(&label),
        room.status.as_str(),
        room.damage_count,
        room.photo_count,
    );
    let openings = s.feed.openings_for(room.id);
    if openings.is_empty() {
        html.push_str("<p class=\"hint\">No openings.</p>");
    } else {
        html.push_str("<ul class=\"openings\">");
        for o in openings {
            html.push_str(&format!(
                "<li>{} × {} · {} <button class=\"remove-opening\" data-opening-id=\"{}\">✕</button></li>",
                o.units(),
                svg_escape(o.opening_type.as_str()),
                svg_escape(o.wall_direction.as_deref().unwrap_or("auto")),
                o.id
            ));
        }
        html.push_str("</ul>");
    }
    el.set_inner_html(&html);
}

pub(crate) fn show_error(s: &mut State, msg: &str) {
    warn!("{msg}");
    s.error = Some(msg.to_string());
    if let Some(el) = html_element(&s.document, "errorBanner") {
        el.set_text_content(Some(msg));
        el.set_hidden(false);
    }
}

fn clear_error(s: &mut State) {
    s.error = None;
    if let Some(el) = html_element(&s.document, "errorBanner") {
        el.set_hidden(true);
    }
}

fn dispatch(st: &Rc<RefCell<State>>, intent: EditorIntent) {
    match intent {
        EditorIntent::SelectRoom(id) => {
            let cb = st.borrow().on_select.clone();
            update_details_dom(&st.borrow());
            if let Some(cb) = cb {
                let arg = id
                    .map(|i| JsValue::from_f64(i as f64))
                    .unwrap_or(JsValue::NULL);
                if let Err(e) = cb.call1(&JsValue::NULL, &arg) {
                    warn!("selection callback failed: {e:?}");
                }
            }
        }
        EditorIntent::UpdateRoom { room_id, update } => save_room(st, room_id, update),
        EditorIntent::CreateOpening { room_id, spec } => {
            let local = spec.clone();
            run_write(
                st,
                "Adding opening",
                move |feed| feed.add_opening(room_id, local).map(|_| ()),
                move |api| async move { api.create_opening(room_id, &spec).await },
            );
        }
        EditorIntent::DeleteRoom(room_id) => run_write(
            st,
            "Deleting room",
            move |feed| feed.remove_room(room_id),
            move |api| async move { api.delete_room(room_id).await },
        ),
    }
}

/// Persist a drag or resize. The editor keeps its override until the
/// store answers.
fn save_room(st: &Rc<RefCell<State>>, room_id: RoomId, update: RoomUpdate) {
    let api = st.borrow().api.clone();
    let Some(api) = api else {
        let mut s = st.borrow_mut();
        match s.feed.apply_room_update(room_id, &update) {
            Ok(()) => s.editor.acknowledge(room_id),
            Err(e) if e.is_not_found() => s.editor.acknowledge(room_id),
            Err(e) => {
                let msg = e.to_string();
                s.editor.persist_failed(room_id, &msg);
                show_error(&mut s, &msg);
                draw(&mut s);
                return;
            }
        }
        s.relayout();
        update_details_dom(&s);
        draw(&mut s);
        return;
    };
    let st = st.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let res = api.patch_room(room_id, &update).await;
        let mut s = st.borrow_mut();
        match res {
            Ok(()) => {
                if let Err(e) = s.feed.apply_room_update(room_id, &update) {
                    debug!("local copy of room {room_id} not updated: {e}");
                }
                s.editor.acknowledge(room_id);
                s.relayout();
            }
            Err(ApiError::NotFound) => {
                s.editor.acknowledge(room_id);
                drop(s);
                reload(&st);
                return;
            }
            Err(e) => {
                s.editor.persist_failed(room_id, &e.to_string());
                show_error(&mut s, &format!("Saving room {room_id} failed: {e}"));
            }
        }
        update_details_dom(&s);
        draw(&mut s);
    });
}

/// Apply a write to the local feed, or send it to the store and reload.
/// A missing target counts as done.
fn run_write<L, R, Fut>(st: &Rc<RefCell<State>>, what: &str, local: L, remote: R)
where
    L: FnOnce(&mut InspectionFeed) -> sketch_core::Result<()>,
    R: FnOnce(ApiClient) -> Fut + 'static,
    Fut: Future<Output = Result<(), ApiError>> + 'static,
{
    let api = st.borrow().api.clone();
    let Some(api) = api else {
        let mut s = st.borrow_mut();
        match local(&mut s.feed) {
            Ok(()) => {}
            Err(e) if e.is_not_found() => debug!("{what}: {e}"),
            Err(e) => show_error(&mut s, &format!("{what} failed: {e}")),
        }
        s.relayout();
        update_details_dom(&s);
        draw(&mut s);
        return;
    };
    let st = st.clone();
    let what = what.to_string();
    wasm_bindgen_futures::spawn_local(async move {
        match remote(api).await {
            Ok(()) => reload(&st),
            Err(e) if e.is_not_found() => {
                debug!("{what}: {e}");
                reload(&st);
            }
            Err(e) => {
                let mut s = st.borrow_mut();
                show_error(&mut s, &format!("{what} failed: {e}"));
                draw(&mut s);
            }
        }
    });
}

/// Fetch the whole feed from the store.
fn reload(st: &Rc<RefCell<State>>) {
    let Some(api) = st.borrow().api.clone() else {
        return;
    };
    let st = st.clone();
    wasm_bindgen_futures::spawn_local(async move {
        let res = api.fetch_feed().await;
        let mut s = st.borrow_mut();
        match res {
            Ok(feed) => {
                info!("feed: {} rooms, {} openings", feed.rooms.len(), feed.openings.len());
                s.set_feed(feed);
                clear_error(&mut s);
            }
            Err(e) => show_error(&mut s, &format!("Loading rooms failed: {e}")),
        }
        update_details_dom(&s);
        draw(&mut s);
    });
}

fn delete_opening(st: &Rc<RefCell<State>>, id: i64) {
    run_write(
        st,
        "Removing opening",
        move |feed| feed.remove_opening(id),
        move |api| async move { api.delete_opening(id).await },
    );
}

fn request_delete(st: &Rc<RefCell<State>>) {
    let pending = {
        let mut s = st.borrow_mut();
        let Some(id) = s.editor.selected() else {
            return;
        };
        s.editor.request_delete(id);
        s.editor.pending_delete()
    };
    let Some(id) = pending else {
        return;
    };
    let ok = {
        let s = st.borrow();
        let name = s
            .feed
            .room(id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| format!("room {id}"));
        s.window
            .confirm_with_message(&format!("Delete {name}? Its openings go with it."))
            .unwrap_or(false)
    };
    let intent = {
        let mut s = st.borrow_mut();
        if ok {
            s.editor.confirm_delete()
        } else {
            s.editor.cancel_delete();
            None
        }
    };
    if let Some(intent) = intent {
        dispatch(st, intent);
        dispatch(st, EditorIntent::SelectRoom(None));
    }
}

fn add_opening(st: &Rc<RefCell<State>>, opening_type: OpeningType) {
    let intent = {
        let s = st.borrow();
        let Some(id) = s.editor.selected() else {
            return;
        };
        let wall = s
            .document
            .get_element_by_id("openingWall")
            .and_then(|el| el.dyn_into::<HtmlSelectElement>().ok())
            .map(|sel| sel.value())
            .filter(|v| !v.is_empty());
        let spec = OpeningSpec {
            opening_type,
            wall_direction: wall,
            quantity: 1,
            ..Default::default()
        };
        s.editor.create_opening(id, spec)
    };
    if let Some(intent) = intent {
        dispatch(st, intent);
    }
}

fn on_click<F>(doc: &Document, id: &str, f: F) -> Result<(), JsValue>
where
    F: FnMut() + 'static,
{
    let Some(el) = html_element(doc, id) else {
        return Ok(());
    };
    let cb = Closure::<dyn FnMut()>::wrap(Box::new(f));
    el.set_onclick(Some(cb.as_ref().unchecked_ref()));
    cb.forget();
    Ok(())
}

fn attach_ui(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc = state.borrow().document.clone();
    upload::attach_file_input(state.clone())?;

    let st = state.clone();
    on_click(&doc, "zoomFit", move || {
        let mut s = st.borrow_mut();
        s.zoom_to_fit();
        draw(&mut s);
    })?;
    let st = state.clone();
    on_click(&doc, "toggleGrid", move || {
        let mut s = st.borrow_mut();
        let on = s.editor.toggle_grid();
        debug!("grid snap {}", if on { "on" } else { "off" });
        draw(&mut s);
    })?;
    let st = state.clone();
    on_click(&doc, "exportSvg", move || {
        let s = st.borrow();
        let (svg, _, _) = build_sketch_svg(&s.layout, &SvgOptions::default());
        if let Err(e) = save_text_as_file(&s.document, "sketch.svg", &svg) {
            warn!("SVG export failed: {e:?}");
        }
    })?;
    let st = state.clone();
    on_click(&doc, "deleteRoom", move || request_delete(&st))?;
    let st = state.clone();
    on_click(&doc, "addDoor", move || add_opening(&st, OpeningType::Door))?;
    let st = state.clone();
    on_click(&doc, "addWindow", move || add_opening(&st, OpeningType::Window))?;
    let st = state.clone();
    on_click(&doc, "reload", move || reload(&st))?;
    let st = state.clone();
    on_click(&doc, "errorBanner", move || clear_error(&mut st.borrow_mut()))?;

    // Opening remove buttons are re-rendered with the panel
    if let Some(panel) = doc.get_element_by_id("details") {
        let st = state.clone();
        let onclick = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |e: Event| {
            let id = e
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
                .and_then(|el| el.get_attribute("data-opening-id"))
                .and_then(|v| v.parse::<i64>().ok());
            if let Some(id) = id {
                delete_opening(&st, id);
            }
        }));
        panel.add_event_listener_with_callback("click", onclick.as_ref().unchecked_ref())?;
        onclick.forget();
    }

    // Mouse events
    {
        let st = state.clone();
        let mousedown = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let intent = {
                let mut s = st.borrow_mut();
                let pt = event_canvas_coords(&e, &s.canvas);
                let intent = s.editor.pointer_down(pt, e.shift_key() || e.alt_key());
                draw(&mut s);
                intent
            };
            if let Some(intent) = intent {
                dispatch(&st, intent);
            }
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousedown", mousedown.as_ref().unchecked_ref())?;
        mousedown.forget();
    }
    {
        let st = state.clone();
        let mousemove = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |e: MouseEvent| {
            let mut s = st.borrow_mut();
            let pt = event_canvas_coords(&e, &s.canvas);
            if s.editor.pointer_move(pt) {
                draw(&mut s);
            }
            let cursor = match s.editor.drag_mode() {
                Some(DragMode::Pan) => "grabbing",
                Some(DragMode::Move) => "move",
                Some(DragMode::Resize(h)) => h.cursor(),
                None => match s.editor.hit_test(pt) {
                    HitTarget::Handle(_, h) => h.cursor(),
                    HitTarget::Room(_) => "move",
                    HitTarget::Canvas if e.shift_key() || e.alt_key() => "grab",
                    HitTarget::Canvas => "default",
                },
            };
            let _ = s.canvas.style().set_property("cursor", cursor);
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("mousemove", mousemove.as_ref().unchecked_ref())?;
        mousemove.forget();
    }
    {
        let st = state.clone();
        let mouseup = Closure::<dyn FnMut(MouseEvent)>::wrap(Box::new(move |_e: MouseEvent| {
            let intent = {
                let mut s = st.borrow_mut();
                let intent = s.editor.pointer_up();
                draw(&mut s);
                intent
            };
            if let Some(intent) = intent {
                dispatch(&st, intent);
            }
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("mouseup", mouseup.as_ref().unchecked_ref())?;
        mouseup.forget();
    }
    {
        let st = state.clone();
        let wheel = Closure::<dyn FnMut(WheelEvent)>::wrap(Box::new(move |e: WheelEvent| {
            e.prevent_default();
            let mut s = st.borrow_mut();
            let pt = event_canvas_coords(&e, &s.canvas);
            s.editor.wheel(pt, e.delta_y());
            draw(&mut s);
        }));
        state
            .borrow()
            .canvas
            .add_event_listener_with_callback("wheel", wheel.as_ref().unchecked_ref())?;
        wheel.forget();
    }

    // Keyboard
    {
        let st = state.clone();
        let keydown =
            Closure::<dyn FnMut(KeyboardEvent)>::wrap(Box::new(move |e: KeyboardEvent| {
                let typing = e
                    .target()
                    .and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
                    .is_some();
                if typing {
                    return;
                }
                match e.key().as_str() {
                    "Delete" | "Backspace" => request_delete(&st),
                    "Escape" => {
                        {
                            let mut s = st.borrow_mut();
                            s.editor.cancel_delete();
                            s.editor.select(None);
                            draw(&mut s);
                        }
                        dispatch(&st, EditorIntent::SelectRoom(None));
                    }
                    "g" | "G" => {
                        let mut s = st.borrow_mut();
                        s.editor.toggle_grid();
                        draw(&mut s);
                    }
                    "f" | "F" => {
                        let mut s = st.borrow_mut();
                        s.zoom_to_fit();
                        draw(&mut s);
                    }
                    _ => {}
                }
            }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("keydown", keydown.as_ref().unchecked_ref())?;
        keydown.forget();
    }
    {
        let st = state.clone();
        let onresize = Closure::<dyn FnMut()>::wrap(Box::new(move || {
            draw(&mut st.borrow_mut());
        }));
        state
            .borrow()
            .window
            .add_event_listener_with_callback("resize", onresize.as_ref().unchecked_ref())?;
        onresize.forget();
    }
    Ok(())
}

fn init_canvas(
    document: &Document,
) -> Result<(HtmlCanvasElement, CanvasRenderingContext2d), JsValue> {
    let cv = document
        .get_element_by_id("cv")
        .ok_or_else(|| JsValue::from_str("canvas #cv not found"))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = cv
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2D context not available"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok((cv, ctx))
}

fn current_state() -> Result<Rc<RefCell<State>>, JsValue> {
    STATE
        .with(|st| st.borrow().clone())
        .ok_or_else(|| JsValue::from_str("sketch editor not started"))
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("no window")?;
    let document = window.document().ok_or("no document")?;
    let search = window.location().search().unwrap_or_default();
    let level = if get_query_param(&search, "debug").is_some() {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    init_logging(level);

    let (canvas, ctx) = init_canvas(&document)?;
    let cfg = match get_query_param(&search, "mode").as_deref() {
        Some("expanded") => LayoutConfig::expanded(),
        _ => LayoutConfig::compact(),
    };
    let api = get_query_param(&search, "api")
        .filter(|b| !b.trim().is_empty())
        .map(|b| ApiClient::new(&b));
    match &api {
        Some(_) => info!("sketch editor backed by the store"),
        None => info!("sketch editor in local mode"),
    }

    let state = Rc::new(RefCell::new(State::new(
        window, document, canvas, ctx, cfg, api,
    )));
    STATE.with(|st| st.replace(Some(state.clone())));
    attach_ui(state.clone())?;
    {
        let mut s = state.borrow_mut();
        update_details_dom(&s);
        draw(&mut s);
    }
    reload(&state);
    Ok(())
}

/// Push a complete feed from the host page, e.g. after the inspection
/// client added a room.
#[wasm_bindgen]
pub fn set_feed_json(json: &str) -> Result<(), JsValue> {
    let feed = InspectionFeed::from_json_str(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let st = current_state()?;
    let mut s = st.borrow_mut();
    s.set_feed(feed);
    update_details_dom(&s);
    draw(&mut s);
    Ok(())
}

/// Register `callback(roomId | null)` for selection changes.
#[wasm_bindgen]
pub fn on_room_selected(callback: js_sys::Function) -> Result<(), JsValue> {
    current_state()?.borrow_mut().on_select = Some(callback);
    Ok(())
}

/// Select a room from the host page.
#[wasm_bindgen]
pub fn select_room(id: Option<f64>) -> Result<(), JsValue> {
    let st = current_state()?;
    {
        let mut s = st.borrow_mut();
        s.editor.select(id.map(|v| v as RoomId));
        draw(&mut s);
    }
    let selected = st.borrow().editor.selected();
    dispatch(&st, EditorIntent::SelectRoom(selected));
    Ok(())
}

/// Current layout as JSON.
#[wasm_bindgen]
pub fn layout_json() -> Result<String, JsValue> {
    let st = current_state()?;
    let s = st.borrow();
    serde_json::to_string(&s.layout).map_err(|e| JsValue::from_str(&e.to_string()))
}
