use std::cell::RefCell;
use std::rc::Rc;

use log::{info, warn};
use sketch_core::InspectionFeed;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Event, FileReader, HtmlInputElement};

use crate::state::State;
use crate::{draw, show_error, update_details_dom};

// Wires up the file input handler for loading an inspection feed JSON file.
pub fn attach_file_input(state: Rc<RefCell<State>>) -> Result<(), JsValue> {
    let doc: Document = state.borrow().document.clone();
    let Some(input) = doc.get_element_by_id("file") else {
        return Ok(());
    };
    let input: HtmlInputElement = input.dyn_into()?;
    let st = state.clone();
    let input_for_closure = input.clone();
    let onchange = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_e: Event| {
        let Some(file) = input_for_closure.files().and_then(|f| f.item(0)) else {
            info!("no file selected");
            return;
        };
        let reader = match FileReader::new() {
            Ok(r) => r,
            Err(e) => {
                warn!("FileReader unavailable: {e:?}");
                return;
            }
        };
        let st2 = st.clone();
        let reader_for_closure = reader.clone();
        let onload = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |_ev: Event| {
            let text = reader_for_closure
                .result()
                .ok()
                .and_then(|v| v.as_string())
                .unwrap_or_default();
            let mut s = st2.borrow_mut();
            if text.is_empty() {
                show_error(&mut s, "Selected file is empty or unreadable");
                return;
            }
            match InspectionFeed::from_json_str(&text) {
                Ok(feed) => {
                    info!(
                        "loaded {} rooms, {} openings from file",
                        feed.rooms.len(),
                        feed.openings.len()
                    );
                    s.set_feed(feed);
                    s.zoom_to_fit();
                    update_details_dom(&s);
                    draw(&mut s);
                }
                Err(e) => show_error(&mut s, &e.to_string()),
            }
        }));
        reader.set_onload(Some(onload.as_ref().unchecked_ref()));
        if let Err(e) = reader.read_as_text(&file) {
            warn!("failed to read file: {e:?}");
        }
        onload.forget();
    }));
    input.set_onchange(Some(onchange.as_ref().unchecked_ref()));
    onchange.forget();
    Ok(())
}
