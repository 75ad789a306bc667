use crate::error::{EntityKind, ViewError};
use crate::ipc::error::{err, ok, view_err};
use crate::i18n::Localizer;
use crate::ipc::helpers::{optional_str, required_str};
use crate::ipc::types::{AppState, MountedView, Request, ViewKind};
use crate::toggle::LocalToggle;
use serde_json::json;
use uuid::Uuid;

fn view_json(strings: &dyn Localizer, view_id: &str, view: &MountedView) -> serde_json::Value {
    // The label names what the next toggle does.
    let toggle_label = if view.toggle.is_expanded() {
        strings.resolve("bannerCollapse", &[])
    } else {
        strings.resolve("bannerExpand", &[])
    };
    json!({
        "viewId": view_id,
        "kind": view.kind.as_str(),
        "state": view.toggle.state(),
        "expanded": view.toggle.is_expanded(),
        "toggleLabel": toggle_label,
    })
}

fn parse_kind(req: &Request) -> Result<ViewKind, serde_json::Value> {
    match optional_str(req, "kind")?.as_deref() {
        None | Some("banner") => Ok(ViewKind::Banner),
        Some(other) => Err(err(
            &req.id,
            "bad_params",
            "kind must be one of: banner",
            Some(json!({ "kind": other })),
        )),
    }
}

fn view_id_param(req: &Request) -> Result<String, serde_json::Value> {
    required_str(req, "viewId")
}

fn unknown_view(req: &Request, view_id: &str) -> serde_json::Value {
    view_err(&req.id, &ViewError::not_found(EntityKind::View, view_id))
}

fn handle_views_mount(state: &mut AppState, req: &Request) -> serde_json::Value {
    let kind = match parse_kind(req) {
        Ok(k) => k,
        Err(e) => return e,
    };
    let view_id = Uuid::new_v4().to_string();
    let view = MountedView {
        kind,
        toggle: LocalToggle::default(),
    };
    let body = view_json(&state.strings, &view_id, &view);
    state.views.insert(view_id, view);
    ok(&req.id, body)
}

fn handle_views_toggle(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view_id = match view_id_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let Some(view) = state.views.get_mut(&view_id) else {
        return unknown_view(req, &view_id);
    };
    view.toggle.toggle();
    ok(&req.id, view_json(&state.strings, &view_id, view))
}

fn handle_views_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view_id = match view_id_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.views.get(&view_id) {
        Some(view) => ok(&req.id, view_json(&state.strings, &view_id, view)),
        None => unknown_view(req, &view_id),
    }
}

fn handle_views_unmount(state: &mut AppState, req: &Request) -> serde_json::Value {
    let view_id = match view_id_param(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    match state.views.remove(&view_id) {
        Some(_) => ok(&req.id, json!({ "viewId": view_id, "unmounted": true })),
        None => unknown_view(req, &view_id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "views.mount" => Some(handle_views_mount(state, req)),
        "views.toggle" => Some(handle_views_toggle(state, req)),
        "views.get" => Some(handle_views_get(state, req)),
        "views.unmount" => Some(handle_views_unmount(state, req)),
        _ => None,
    }
}
