use crate::error::ViewError;
use crate::ipc::error::{err, view_err};
use crate::ipc::types::{AppState, Request};
use crate::store::LookupStore;
use rusqlite::Connection;
use serde_json::json;

pub fn required_str(req: &Request, key: &str) -> Result<String, serde_json::Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|v| v.to_string())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn optional_str(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_str().map(|s| Some(s.to_string())).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a string", key),
                None,
            )
        }),
    }
}

pub fn optional_bool(req: &Request, key: &str) -> Result<Option<bool>, serde_json::Value> {
    match req.params.get(key) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(v) => v.as_bool().map(Some).ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a boolean", key),
                None,
            )
        }),
    }
}

/// Reads an array of strings; a missing key is an empty list.
pub fn str_list(req: &Request, key: &str) -> Result<Vec<String>, serde_json::Value> {
    let Some(v) = req.params.get(key) else {
        return Ok(Vec::new());
    };
    let Some(items) = v.as_array() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be an array of strings", key),
            None,
        ));
    };
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            item.as_str().map(|s| s.to_string()).ok_or_else(|| {
                err(
                    &req.id,
                    "bad_params",
                    format!("{} must be an array of strings", key),
                    Some(json!({ "index": i })),
                )
            })
        })
        .collect()
}

pub fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_workspace", "select a workspace first", None))
}

/// The current snapshot, or `not_loaded` when no workspace has been opened.
pub fn store_ref<'a>(state: &'a AppState, req: &Request) -> Result<&'a LookupStore, serde_json::Value> {
    state
        .store
        .as_ref()
        .ok_or_else(|| view_err(&req.id, &ViewError::NotLoaded))
}

/// Swaps in a fresh snapshot after a write. If the reload fails the old
/// snapshot is dropped, so reads report `not_loaded` instead of stale data.
pub fn reload_store(state: &mut AppState, req: &Request) -> Result<(), serde_json::Value> {
    let conn = db_conn(state, req)?;
    match crate::db::load_store(conn) {
        Ok(store) => {
            state.store = Some(store);
            Ok(())
        }
        Err(e) => {
            tracing::error!(method = %req.method, error = %e, "snapshot reload failed after write");
            state.store = None;
            Err(err(&req.id, "db_query_failed", e.to_string(), None))
        }
    }
}
