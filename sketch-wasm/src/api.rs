//! REST client for the inspection store.
//!
//! Paths are relative to the `api` query parameter:
//! `GET rooms|openings|adjacencies`, `PATCH rooms/{id}`,
//! `POST rooms/{id}/openings`, `DELETE openings/{id}` and `DELETE rooms/{id}`.

use std::fmt;

use log::debug;
use serde::de::DeserializeOwned;
use sketch_core::model::OpeningId;
use sketch_core::{InspectionFeed, OpeningSpec, RoomId, RoomUpdate};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestInit, Response};

#[derive(Debug)]
pub enum ApiError {
    /// 404: the target is already gone.
    NotFound,
    Status(u16),
    Network(String),
    Decode(serde_json::Error),
}

impl ApiError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound => write!(f, "not found"),
            ApiError::Status(code) => write!(f, "server answered {code}"),
            ApiError::Network(msg) => write!(f, "network error: {msg}"),
            ApiError::Decode(e) => write!(f, "bad response: {e}"),
        }
    }
}

impl From<ApiError> for JsValue {
    fn from(e: ApiError) -> Self {
        JsValue::from_str(&e.to_string())
    }
}

fn js_err(v: JsValue) -> ApiError {
    ApiError::Network(v.as_string().unwrap_or_else(|| format!("{v:?}")))
}

#[derive(Clone, Debug)]
pub struct ApiClient {
    base: String,
}

impl ApiClient {
    pub fn new(base: &str) -> Self {
        ApiClient {
            base: base.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base, path)
    }

    async fn send(&self, method: &str, path: &str, body: Option<String>) -> Result<String, ApiError> {
        let init = RequestInit::new();
        init.set_method(method);
        if let Some(body) = &body {
            let headers = Headers::new().map_err(js_err)?;
            headers
                .set("Content-Type", "application/json")
                .map_err(js_err)?;
            init.set_headers(&headers);
            init.set_body(&JsValue::from_str(body));
        }
        let url = self.url(path);
        debug!("{method} {url}");
        let req = Request::new_with_str_and_init(&url, &init).map_err(js_err)?;
        let window = web_sys::window().ok_or_else(|| ApiError::Network("no window".into()))?;
        let resp: Response = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        if resp.status() == 404 {
            return Err(ApiError::NotFound);
        }
        if !resp.ok() {
            return Err(ApiError::Status(resp.status()));
        }
        let text = JsFuture::from(resp.text().map_err(js_err)?)
            .await
            .map_err(js_err)?;
        Ok(text.as_string().unwrap_or_default())
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let txt = self.send("GET", path, None).await?;
        serde_json::from_str(&txt).map_err(ApiError::Decode)
    }

    pub async fn fetch_feed(&self) -> Result<InspectionFeed, ApiError> {
        Ok(InspectionFeed {
            rooms: self.get("rooms").await?,
            openings: self.get("openings").await?,
            adjacencies: self.get("adjacencies").await?,
        })
    }

    pub async fn patch_room(&self, id: RoomId, update: &RoomUpdate) -> Result<(), ApiError> {
        let body = serde_json::to_string(update).map_err(ApiError::Decode)?;
        self.send("PATCH", &format!("rooms/{id}"), Some(body)).await?;
        Ok(())
    }

    pub async fn create_opening(&self, room_id: RoomId, spec: &OpeningSpec) -> Result<(), ApiError> {
        let body = serde_json::to_string(spec).map_err(ApiError::Decode)?;
        self.send("POST", &format!("rooms/{room_id}/openings"), Some(body))
            .await?;
        Ok(())
    }

    pub async fn delete_opening(&self, id: OpeningId) -> Result<(), ApiError> {
        self.send("DELETE", &format!("openings/{id}"), None).await?;
        Ok(())
    }

    pub async fn delete_room(&self, id: RoomId) -> Result<(), ApiError> {
        self.send("DELETE", &format!("rooms/{id}"), None).await?;
        Ok(())
    }
}
