use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_coachd");
    let mut child = Command::new(exe)
        .env_remove("COACHD_WORKSPACE")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn coachd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

fn result_str(value: &serde_json::Value, key: &str) -> String {
    value
        .get("result")
        .and_then(|v| v.get(key))
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("missing result.{}", key))
        .to_string()
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("coachd-router-smoke");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(&mut stdin, &mut reader, "1", "health", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let group = request(
        &mut stdin,
        &mut reader,
        "3",
        "groups.create",
        json!({ "name": "Smoke Group" }),
    );
    let group_id = result_str(&group, "groupId");
    let learner = request(
        &mut stdin,
        &mut reader,
        "4",
        "learners.create",
        json!({ "fullName": "Smoke Learner", "groupIds": [group_id] }),
    );
    let learner_id = result_str(&learner, "learnerId");
    let quiz = request(
        &mut stdin,
        &mut reader,
        "5",
        "quizzes.create",
        json!({ "title": "Smoke Quiz", "active": true, "groupIds": [group_id] }),
    );
    let quiz_id = result_str(&quiz, "quizId");

    let _ = request(&mut stdin, &mut reader, "6", "groups.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "groups.resolve",
        json!({ "groupId": group_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "8",
        "quizzes.recordScore",
        json!({ "quizId": quiz_id, "learnerId": learner_id, "score": 75 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "9",
        "quizzes.setActive",
        json!({ "quizId": quiz_id, "active": false }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "10",
        "quizzes.resolve",
        json!({ "quizId": quiz_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "recipients.resolve",
        json!({ "groupIds": [group_id] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "12",
        "quizzes.averageScore",
        json!({ "quizId": quiz_id, "learnerIds": [learner_id] }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "reports.header",
        json!({ "quizId": quiz_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "menu.options",
        json!({ "optionsFor": "plan" }),
    );
    let mounted = request(
        &mut stdin,
        &mut reader,
        "15",
        "views.mount",
        json!({ "kind": "banner" }),
    );
    let view_id = result_str(&mounted, "viewId");
    for (id, method) in [("16", "views.toggle"), ("17", "views.get"), ("18", "views.unmount")] {
        let _ = request(
            &mut stdin,
            &mut reader,
            id,
            method,
            json!({ "viewId": view_id }),
        );
    }

    let unknown = {
        let payload = json!({ "id": "19", "method": "nope.nothing", "params": {} });
        writeln!(stdin, "{}", payload).expect("write request");
        stdin.flush().expect("flush request");
        let mut line = String::new();
        reader.read_line(&mut line).expect("read response line");
        serde_json::from_str::<serde_json::Value>(line.trim()).expect("parse response json")
    };
    assert_eq!(unknown["error"]["code"], json!("not_implemented"));

    writeln!(stdin, "this is not json").expect("write garbage");
    stdin.flush().expect("flush garbage");
    let mut line = String::new();
    reader.read_line(&mut line).expect("read bad_json line");
    let bad: serde_json::Value = serde_json::from_str(line.trim()).expect("parse bad_json");
    assert_eq!(bad["error"]["code"], json!("bad_json"));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
