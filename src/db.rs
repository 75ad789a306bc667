use crate::store::{Assessment, Group, Learner, LookupStore};
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

pub const DB_FILE_NAME: &str = "coach.sqlite3";

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join(DB_FILE_NAME);
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS learner_groups(
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS learners(
            id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            sort_order INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS memberships(
            group_id TEXT NOT NULL,
            learner_id TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            PRIMARY KEY(group_id, learner_id),
            FOREIGN KEY(group_id) REFERENCES learner_groups(id),
            FOREIGN KEY(learner_id) REFERENCES learners(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_memberships_group_sort ON memberships(group_id, sort_order)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quizzes(
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            active INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quiz_assignments(
            quiz_id TEXT NOT NULL,
            group_id TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            PRIMARY KEY(quiz_id, group_id),
            FOREIGN KEY(quiz_id) REFERENCES quizzes(id),
            FOREIGN KEY(group_id) REFERENCES learner_groups(id)
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS quiz_scores(
            quiz_id TEXT NOT NULL,
            learner_id TEXT NOT NULL,
            percent REAL NOT NULL,
            PRIMARY KEY(quiz_id, learner_id),
            FOREIGN KEY(quiz_id) REFERENCES quizzes(id),
            FOREIGN KEY(learner_id) REFERENCES learners(id)
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_quiz_scores_learner ON quiz_scores(learner_id)",
        [],
    )?;

    // Workspaces created before score timestamps were tracked lack this column.
    ensure_quiz_scores_updated_at(&conn)?;

    Ok(conn)
}

fn ensure_quiz_scores_updated_at(conn: &Connection) -> anyhow::Result<()> {
    if table_has_column(conn, "quiz_scores", "updated_at")? {
        return Ok(());
    }
    conn.execute("ALTER TABLE quiz_scores ADD COLUMN updated_at TEXT", [])?;
    Ok(())
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> anyhow::Result<bool> {
    let sql = format!("PRAGMA table_info({})", table);
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        if name == column {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Reads the whole workspace into a fresh snapshot.
pub fn load_store(conn: &Connection) -> anyhow::Result<LookupStore> {
    let mut store = LookupStore::new();

    let mut stmt = conn.prepare("SELECT id, name FROM learner_groups ORDER BY sort_order, rowid")?;
    let groups = stmt
        .query_map([], |row| {
            Ok(Group {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for g in groups {
        store.insert_group(g);
    }

    let mut stmt = conn.prepare("SELECT id, full_name FROM learners ORDER BY sort_order, rowid")?;
    let learners = stmt
        .query_map([], |row| {
            Ok(Learner {
                id: row.get(0)?,
                full_name: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for l in learners {
        store.insert_learner(l);
    }

    let mut stmt = conn.prepare(
        "SELECT group_id, learner_id FROM memberships ORDER BY group_id, sort_order, rowid",
    )?;
    let memberships = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (gid, lid) in memberships {
        store.add_membership(&gid, &lid);
    }

    let mut stmt =
        conn.prepare("SELECT quiz_id, group_id FROM quiz_assignments ORDER BY quiz_id, sort_order")?;
    let mut assigned: HashMap<String, Vec<String>> = HashMap::new();
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (qid, gid) in rows {
        assigned.entry(qid).or_default().push(gid);
    }

    let mut stmt = conn.prepare("SELECT id, title, active FROM quizzes ORDER BY rowid")?;
    let quizzes = stmt
        .query_map([], |row| {
            let id: String = row.get(0)?;
            let title: String = row.get(1)?;
            let active: i64 = row.get(2)?;
            Ok((id, title, active != 0))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (id, title, active) in quizzes {
        let assigned_group_ids = assigned.remove(&id).unwrap_or_default();
        store.insert_assessment(Assessment {
            id,
            title,
            active,
            assigned_group_ids,
        });
    }

    let mut stmt = conn.prepare("SELECT quiz_id, learner_id, percent FROM quiz_scores")?;
    let scores = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, f64>(2)?,
            ))
        })?
        .collect::<Result<Vec<_>, _>>()?;
    for (qid, lid, pct) in scores {
        store.set_score(&qid, &lid, pct);
    }

    Ok(store)
}

fn next_sort_order(conn: &Connection, sql: &str, key: Option<&str>) -> anyhow::Result<i64> {
    let v: Option<i64> = match key {
        Some(k) => conn.query_row(sql, [k], |r| r.get(0))?,
        None => conn.query_row(sql, [], |r| r.get(0))?,
    };
    Ok(v.map(|n| n + 1).unwrap_or(0))
}

pub fn exists(conn: &Connection, table: &str, id: &str) -> anyhow::Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE id = ?", table);
    let found: Option<i64> = conn.query_row(&sql, [id], |r| r.get(0)).optional()?;
    Ok(found.is_some())
}

pub fn insert_group(conn: &Connection, name: &str) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    let sort_order = next_sort_order(conn, "SELECT MAX(sort_order) FROM learner_groups", None)?;
    conn.execute(
        "INSERT INTO learner_groups(id, name, sort_order) VALUES(?, ?, ?)",
        (&id, name, sort_order),
    )?;
    Ok(id)
}

pub fn insert_learner(conn: &Connection, full_name: &str, group_ids: &[String]) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    let tx = conn.unchecked_transaction()?;
    let sort_order = next_sort_order(&tx, "SELECT MAX(sort_order) FROM learners", None)?;
    tx.execute(
        "INSERT INTO learners(id, full_name, sort_order) VALUES(?, ?, ?)",
        (&id, full_name, sort_order),
    )?;
    for gid in group_ids {
        let member_order = next_sort_order(
            &tx,
            "SELECT MAX(sort_order) FROM memberships WHERE group_id = ?",
            Some(gid),
        )?;
        tx.execute(
            "INSERT OR IGNORE INTO memberships(group_id, learner_id, sort_order) VALUES(?, ?, ?)",
            (gid, &id, member_order),
        )?;
    }
    tx.commit()?;
    Ok(id)
}

pub fn insert_quiz(
    conn: &Connection,
    title: &str,
    active: bool,
    group_ids: &[String],
) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO quizzes(id, title, active) VALUES(?, ?, ?)",
        (&id, title, active as i64),
    )?;
    for (i, gid) in group_ids.iter().enumerate() {
        tx.execute(
            "INSERT OR IGNORE INTO quiz_assignments(quiz_id, group_id, sort_order) VALUES(?, ?, ?)",
            (&id, gid, i as i64),
        )?;
    }
    tx.commit()?;
    Ok(id)
}

pub fn set_quiz_active(conn: &Connection, quiz_id: &str, active: bool) -> anyhow::Result<usize> {
    Ok(conn.execute(
        "UPDATE quizzes SET active = ? WHERE id = ?",
        (active as i64, quiz_id),
    )?)
}

pub fn upsert_score(
    conn: &Connection,
    quiz_id: &str,
    learner_id: &str,
    percent: f64,
) -> anyhow::Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO quiz_scores(quiz_id, learner_id, percent, updated_at)
         VALUES(?, ?, ?, ?)
         ON CONFLICT(quiz_id, learner_id) DO UPDATE SET
           percent = excluded.percent,
           updated_at = excluded.updated_at",
        (quiz_id, learner_id, percent, &now),
    )?;
    Ok(())
}
