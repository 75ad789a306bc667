use crate::error::ViewError;
use crate::ipc::error::{ok, view_err};
use crate::ipc::helpers::{optional_str, required_str, store_ref, str_list};
use crate::ipc::types::{AppState, Request};
use crate::menu;
use crate::resolver::{self, ReportParams};
use serde_json::json;

fn handle_average_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let quiz_id = match required_str(req, "quizId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let learner_ids = match str_list(req, "learnerIds") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match resolver::score_summary(store, &quiz_id, learner_ids.as_slice()) {
        Ok(summary) => ok(
            &req.id,
            json!({
                "quizId": quiz_id,
                "averageScore": summary.average,
                "scoredCount": summary.scored_count,
                "noMarkCount": summary.no_mark_count,
            }),
        ),
        Err(e) => view_err(&req.id, &e),
    }
}

fn handle_report_header(state: &mut AppState, req: &Request) -> serde_json::Value {
    let quiz_id = match required_str(req, "quizId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let group_id = match optional_str(req, "groupId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let params = ReportParams { quiz_id, group_id };
    match resolver::recompute_report_header(&params, store, &state.strings) {
        Ok(header) => ok(&req.id, json!({ "header": header })),
        Err(e) => view_err(&req.id, &e),
    }
}

fn handle_menu_options(state: &mut AppState, req: &Request) -> serde_json::Value {
    let options_for = match required_str(req, "optionsFor") {
        Ok(v) => v,
        Err(e) => return e,
    };
    match menu::resolve_options(&options_for, &state.strings) {
        Ok(options) => ok(&req.id, json!({ "options": options })),
        Err(e @ ViewError::UnrecognizedContext(_)) => {
            tracing::warn!(options_for = %options_for, "menu requested for unknown context");
            view_err(&req.id, &e)
        }
        Err(e) => view_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "quizzes.averageScore" => Some(handle_average_score(state, req)),
        "reports.header" => Some(handle_report_header(state, req)),
        "menu.options" => Some(handle_menu_options(state, req)),
        _ => None,
    }
}
