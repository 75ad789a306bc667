use crate::db;
use crate::i18n::StringTable;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::{Path, PathBuf};

pub const STRINGS_FILE_NAME: &str = "coach_strings.json";

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string()),
            "storeLoaded": state.store.is_some(),
        }),
    )
}

/// Opens the workspace database, loads the lookup snapshot and any string
/// overrides. Previously mounted views belong to the old workspace and are
/// dropped.
pub fn open_workspace(state: &mut AppState, path: &Path) -> anyhow::Result<()> {
    let conn = db::open_db(path)?;
    let store = db::load_store(&conn)?;

    let mut strings = StringTable::default();
    // Best-effort: a broken overrides file must not prevent the workspace from opening.
    let strings_path = path.join(STRINGS_FILE_NAME);
    if strings_path.is_file() {
        match strings.load_overrides(&strings_path) {
            Ok(n) => tracing::info!(count = n, "loaded string overrides"),
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable string overrides"),
        }
    }

    state.workspace = Some(path.to_path_buf());
    state.db = Some(conn);
    state.store = Some(store);
    state.strings = strings;
    state.views.clear();
    tracing::info!(workspace = %path.display(), "workspace opened");
    Ok(())
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(state, &path) {
        Ok(()) => ok(&req.id, json!({ "workspacePath": path.to_string_lossy() })),
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
