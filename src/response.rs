//! Success envelope: `{"ok": true, ...fields}`.
use axum::Json;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct Envelope<T> {
    pub ok: bool,
    #[serde(flatten)]
    pub body: T,
}

#[derive(Serialize, Debug)]
pub struct Data<T> {
    pub data: T,
}

/// Flattens `body`'s fields next to `ok`.
pub fn ok<T: Serialize>(body: T) -> Json<Envelope<T>> {
    Json(Envelope { ok: true, body })
}

/// Wraps `value` as `{"ok": true, "data": value}`.
pub fn data<T: Serialize>(value: T) -> Json<Envelope<Data<T>>> {
    ok(Data { data: value })
}
