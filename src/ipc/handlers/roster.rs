use crate::db;
use crate::error::{EntityKind, ViewError};
use crate::ipc::error::{err, ok, view_err};
use crate::ipc::helpers::{
    db_conn, optional_bool, reload_store, required_str, store_ref, str_list,
};
use crate::ipc::types::{AppState, Request};
use crate::resolver;
use serde_json::json;

fn ensure_rows_exist(
    conn: &rusqlite::Connection,
    req: &Request,
    table: &str,
    kind: EntityKind,
    ids: &[String],
) -> Result<(), serde_json::Value> {
    for id in ids {
        match db::exists(conn, table, id) {
            Ok(true) => {}
            Ok(false) => return Err(view_err(&req.id, &ViewError::not_found(kind, id.as_str()))),
            Err(e) => return Err(err(&req.id, "db_query_failed", e.to_string(), None)),
        }
    }
    Ok(())
}

fn handle_groups_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let name = match required_str(req, "name") {
        Ok(v) => v.trim().to_string(),
        Err(e) => return e,
    };
    if name.is_empty() {
        return err(&req.id, "bad_params", "name must not be empty", None);
    }
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    let group_id = match db::insert_group(conn, &name) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "db_insert_failed",
                e.to_string(),
                Some(json!({ "table": "learner_groups" })),
            )
        }
    };
    if let Err(e) = reload_store(state, req) {
        return e;
    }
    ok(&req.id, json!({ "groupId": group_id, "name": name }))
}

fn handle_groups_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    let groups: Vec<serde_json::Value> = store
        .groups()
        .map(|g| {
            json!({
                "id": g.id,
                "name": g.name,
                "learnerCount": store.learners_in_group(&g.id).map(|m| m.len()).unwrap_or(0),
            })
        })
        .collect();
    ok(&req.id, json!({ "groups": groups }))
}

fn handle_groups_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let group_id = match required_str(req, "groupId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match resolver::resolve_group(store, &group_id) {
        Ok(g) => ok(&req.id, json!({ "group": g })),
        Err(e) => view_err(&req.id, &e),
    }
}

fn handle_learners_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let full_name = match required_str(req, "fullName") {
        Ok(v) => v.trim().to_string(),
        Err(e) => return e,
    };
    if full_name.is_empty() {
        return err(&req.id, "bad_params", "fullName must not be empty", None);
    }
    let group_ids = match str_list(req, "groupIds") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    if let Err(e) = ensure_rows_exist(conn, req, "learner_groups", EntityKind::Group, &group_ids) {
        return e;
    }
    let learner_id = match db::insert_learner(conn, &full_name, &group_ids) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "db_insert_failed",
                e.to_string(),
                Some(json!({ "table": "learners" })),
            )
        }
    };
    if let Err(e) = reload_store(state, req) {
        return e;
    }
    ok(&req.id, json!({ "learnerId": learner_id }))
}

fn handle_quizzes_create(state: &mut AppState, req: &Request) -> serde_json::Value {
    let title = match required_str(req, "title") {
        Ok(v) => v.trim().to_string(),
        Err(e) => return e,
    };
    if title.is_empty() {
        return err(&req.id, "bad_params", "title must not be empty", None);
    }
    let active = match optional_bool(req, "active") {
        Ok(v) => v.unwrap_or(false),
        Err(e) => return e,
    };
    let group_ids = match str_list(req, "groupIds") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    if let Err(e) = ensure_rows_exist(conn, req, "learner_groups", EntityKind::Group, &group_ids) {
        return e;
    }
    let quiz_id = match db::insert_quiz(conn, &title, active, &group_ids) {
        Ok(v) => v,
        Err(e) => {
            return err(
                &req.id,
                "db_insert_failed",
                e.to_string(),
                Some(json!({ "table": "quizzes" })),
            )
        }
    };
    if let Err(e) = reload_store(state, req) {
        return e;
    }
    ok(&req.id, json!({ "quizId": quiz_id }))
}

fn handle_quizzes_set_active(state: &mut AppState, req: &Request) -> serde_json::Value {
    let quiz_id = match required_str(req, "quizId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let active = match optional_bool(req, "active") {
        Ok(Some(v)) => v,
        Ok(None) => return err(&req.id, "bad_params", "missing active", None),
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    match db::set_quiz_active(conn, &quiz_id, active) {
        Ok(0) => return view_err(&req.id, &ViewError::not_found(EntityKind::Quiz, quiz_id)),
        Ok(_) => {}
        Err(e) => return err(&req.id, "db_update_failed", e.to_string(), None),
    }
    if let Err(e) = reload_store(state, req) {
        return e;
    }
    ok(&req.id, json!({ "quizId": quiz_id, "active": active }))
}

fn handle_quizzes_record_score(state: &mut AppState, req: &Request) -> serde_json::Value {
    let quiz_id = match required_str(req, "quizId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let learner_id = match required_str(req, "learnerId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let score = match req.params.get("score").and_then(|v| v.as_f64()) {
        Some(v) => v,
        None => return err(&req.id, "bad_params", "missing score", None),
    };
    if !score.is_finite() || !(0.0..=100.0).contains(&score) {
        return err(
            &req.id,
            "bad_params",
            "score must be between 0 and 100",
            Some(json!({ "score": score })),
        );
    }
    let conn = match db_conn(state, req) {
        Ok(c) => c,
        Err(e) => return e,
    };
    if let Err(e) = ensure_rows_exist(conn, req, "quizzes", EntityKind::Quiz, &[quiz_id.clone()]) {
        return e;
    }
    if let Err(e) =
        ensure_rows_exist(conn, req, "learners", EntityKind::Learner, &[learner_id.clone()])
    {
        return e;
    }
    if let Err(e) = db::upsert_score(conn, &quiz_id, &learner_id, score) {
        return err(
            &req.id,
            "db_insert_failed",
            e.to_string(),
            Some(json!({ "table": "quiz_scores" })),
        );
    }
    if let Err(e) = reload_store(state, req) {
        return e;
    }
    ok(
        &req.id,
        json!({ "quizId": quiz_id, "learnerId": learner_id, "score": score }),
    )
}

fn handle_quizzes_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let quiz_id = match required_str(req, "quizId") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match resolver::resolve_assessment(store, &quiz_id) {
        Ok(q) => ok(&req.id, json!({ "quiz": q })),
        Err(e) => view_err(&req.id, &e),
    }
}

fn handle_recipients_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let group_ids = match str_list(req, "groupIds") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let store = match store_ref(state, req) {
        Ok(s) => s,
        Err(e) => return e,
    };
    match resolver::resolve_recipients(store, group_ids.as_slice()) {
        Ok(learner_ids) => {
            let learners: Vec<serde_json::Value> = learner_ids
                .iter()
                .map(|id| {
                    json!({
                        "id": id,
                        "fullName": store.learner(id).map(|l| l.full_name.as_str()),
                    })
                })
                .collect();
            ok(
                &req.id,
                json!({ "learnerIds": learner_ids, "learners": learners }),
            )
        }
        Err(e) => view_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "groups.create" => Some(handle_groups_create(state, req)),
        "groups.list" => Some(handle_groups_list(state, req)),
        "groups.resolve" => Some(handle_groups_resolve(state, req)),
        "learners.create" => Some(handle_learners_create(state, req)),
        "quizzes.create" => Some(handle_quizzes_create(state, req)),
        "quizzes.setActive" => Some(handle_quizzes_set_active(state, req)),
        "quizzes.recordScore" => Some(handle_quizzes_record_score(state, req)),
        "quizzes.resolve" => Some(handle_quizzes_resolve(state, req)),
        "recipients.resolve" => Some(handle_recipients_resolve(state, req)),
        _ => None,
    }
}
