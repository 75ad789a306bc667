use crate::error::{EntityKind, ViewError};
use crate::i18n::Localizer;
use crate::menu::{options_for_context, MenuContext, MenuOption};
use crate::store::{Assessment, Group, LookupStore};
use serde::Serialize;
use std::collections::HashSet;

pub fn resolve_group<'a>(store: &'a LookupStore, group_id: &str) -> Result<&'a Group, ViewError> {
    store
        .group(group_id)
        .ok_or_else(|| ViewError::not_found(EntityKind::Group, group_id))
}

pub fn resolve_assessment<'a>(
    store: &'a LookupStore,
    quiz_id: &str,
) -> Result<&'a Assessment, ViewError> {
    store
        .assessment(quiz_id)
        .ok_or_else(|| ViewError::not_found(EntityKind::Quiz, quiz_id))
}

/// Learners of the given groups: groups in argument order, members in
/// membership order, each learner once at its first occurrence.
pub fn resolve_recipients<S: AsRef<str>>(
    store: &LookupStore,
    group_ids: &[S],
) -> Result<Vec<String>, ViewError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for gid in group_ids {
        let gid = gid.as_ref();
        let members = store
            .learners_in_group(gid)
            .ok_or_else(|| ViewError::not_found(EntityKind::Group, gid))?;
        for m in members {
            if seen.insert(m.as_str()) {
                out.push(m.clone());
            }
        }
    }
    Ok(out)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSummary {
    pub average: f64,
    pub scored_count: usize,
    pub no_mark_count: usize,
}

/// Recipients without a recorded score are "no mark" and stay out of the
/// denominator. A recorded 0 counts. Every recipient must be a known learner.
pub fn score_summary<S: AsRef<str>>(
    store: &LookupStore,
    assessment_id: &str,
    recipients: &[S],
) -> Result<ScoreSummary, ViewError> {
    resolve_assessment(store, assessment_id)?;

    let mut sum = 0.0;
    let mut scored_count = 0usize;
    let mut no_mark_count = 0usize;
    for r in recipients {
        let r = r.as_ref();
        if store.learner(r).is_none() {
            return Err(ViewError::not_found(EntityKind::Learner, r));
        }
        match store.score(assessment_id, r) {
            Some(v) => {
                sum += v;
                scored_count += 1;
            }
            None => no_mark_count += 1,
        }
    }

    if scored_count == 0 {
        return Err(ViewError::NoData);
    }
    Ok(ScoreSummary {
        average: (sum / scored_count as f64).clamp(0.0, 100.0),
        scored_count,
        no_mark_count,
    })
}

pub fn compute_average_score<S: AsRef<str>>(
    store: &LookupStore,
    assessment_id: &str,
    recipients: &[S],
) -> Result<f64, ViewError> {
    score_summary(store, assessment_id, recipients).map(|s| s.average)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportParams {
    pub quiz_id: String,
    pub group_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHeader {
    pub quiz_id: String,
    pub title: String,
    pub active: bool,
    pub status_label: String,
    pub group_names: Vec<String>,
    pub recipients_label: String,
    pub recipient_count: usize,
    pub learner_count_label: String,
    pub average_score: Option<f64>,
    pub no_data: bool,
    pub average_score_label: String,
    pub options_label: String,
    pub options: Vec<MenuOption>,
}

/// Rebuilds the report header from scratch. Called whenever the navigation
/// parameters change; nothing is cached between calls.
pub fn recompute_report_header(
    params: &ReportParams,
    store: &LookupStore,
    strings: &dyn Localizer,
) -> Result<ReportHeader, ViewError> {
    let quiz = resolve_assessment(store, &params.quiz_id)?;

    let group_ids: Vec<&str> = match params.group_id.as_deref() {
        Some(gid) => vec![gid],
        None => quiz.assigned_group_ids.iter().map(|s| s.as_str()).collect(),
    };
    let mut group_names = Vec::with_capacity(group_ids.len());
    for gid in &group_ids {
        group_names.push(resolve_group(store, gid)?.name.clone());
    }
    // A quiz with no assigned groups goes to the entire class.
    let recipients = if group_ids.is_empty() {
        store.learners().map(|l| l.id.clone()).collect()
    } else {
        resolve_recipients(store, group_ids.as_slice())?
    };

    let average_score = match compute_average_score(store, &quiz.id, recipients.as_slice()) {
        Ok(v) => Some(v),
        Err(ViewError::NoData) => None,
        Err(e) => return Err(e),
    };
    let average_score_label = match average_score {
        Some(v) => strings.resolve("averageScore", &[("score", format_percent(v))]),
        None => strings.resolve("averageScoreNoData", &[]),
    };
    let groups_text = if group_names.is_empty() {
        strings.resolve("entireClass", &[])
    } else {
        group_names.join(", ")
    };

    Ok(ReportHeader {
        quiz_id: quiz.id.clone(),
        title: quiz.title.clone(),
        active: quiz.active,
        status_label: strings.resolve(
            if quiz.active { "statusActive" } else { "statusInactive" },
            &[],
        ),
        recipients_label: strings.resolve("recipients", &[("groups", groups_text)]),
        group_names,
        recipient_count: recipients.len(),
        learner_count_label: strings
            .resolve("learnerCount", &[("count", recipients.len().to_string())]),
        average_score,
        no_data: average_score.is_none(),
        average_score_label,
        options_label: strings.resolve("optionsLabel", &[]),
        options: options_for_context(MenuContext::Report, strings),
    })
}

fn format_percent(v: f64) -> String {
    let rounded = v.round();
    if (v - rounded).abs() < 1e-9 {
        format!("{}", rounded as i64)
    } else {
        format!("{:.1}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::StringTable;
    use crate::menu::MenuAction;
    use crate::store::Learner;

    fn scenario_store() -> LookupStore {
        let mut s = LookupStore::new();
        s.insert_group(Group {
            id: "g1".into(),
            name: "Red Team".into(),
        });
        s.insert_group(Group {
            id: "g2".into(),
            name: "Blue Team".into(),
        });
        s.insert_assessment(Assessment {
            id: "q1".into(),
            title: "Quiz 1".into(),
            active: true,
            assigned_group_ids: vec!["g1".into()],
        });
        for (id, name) in [("u1", "Ada"), ("u2", "Ben"), ("u3", "Cy")] {
            s.insert_learner(Learner {
                id: id.into(),
                full_name: name.into(),
            });
        }
        s.add_membership("g1", "u1");
        s.add_membership("g1", "u2");
        s.add_membership("g2", "u2");
        s.add_membership("g2", "u3");
        s.set_score("q1", "u1", 80.0);
        s.set_score("q1", "u2", 100.0);
        s
    }

    #[test]
    fn scenario_red_team_averages_ninety() {
        let s = scenario_store();
        assert_eq!(resolve_group(&s, "g1").expect("g1").name, "Red Team");
        assert_eq!(compute_average_score(&s, "q1", &["u1", "u2"]), Ok(90.0));
    }

    #[test]
    fn resolve_group_is_exact_and_idempotent() {
        let s = scenario_store();
        let a = resolve_group(&s, "g1").expect("g1").clone();
        let b = resolve_group(&s, "g1").expect("g1").clone();
        assert_eq!(a, b);
        assert_eq!(
            a,
            Group {
                id: "g1".into(),
                name: "Red Team".into()
            }
        );
        assert_eq!(
            resolve_group(&s, "nope"),
            Err(ViewError::not_found(EntityKind::Group, "nope"))
        );
    }

    #[test]
    fn resolve_assessment_misses_are_not_found() {
        let s = scenario_store();
        assert!(resolve_assessment(&s, "q1").expect("q1").active);
        assert_eq!(
            resolve_assessment(&s, "q2"),
            Err(ViewError::not_found(EntityKind::Quiz, "q2"))
        );
    }

    #[test]
    fn recipients_keep_group_then_member_order_once() {
        let s = scenario_store();
        assert_eq!(
            resolve_recipients(&s, &["g2", "g1"]),
            Ok(vec!["u2".to_string(), "u3".to_string(), "u1".to_string()])
        );
        let none: [&str; 0] = [];
        assert_eq!(resolve_recipients(&s, &none), Ok(vec![]));
        assert!(matches!(
            resolve_recipients(&s, &["g1", "gx"]),
            Err(ViewError::NotFound { .. })
        ));
    }

    #[test]
    fn empty_recipients_is_no_data_not_zero() {
        let s = scenario_store();
        let none: [&str; 0] = [];
        assert_eq!(compute_average_score(&s, "q1", &none), Err(ViewError::NoData));
    }

    #[test]
    fn unscored_recipients_are_excluded() {
        let s = scenario_store();
        assert_eq!(compute_average_score(&s, "q1", &["u3"]), Err(ViewError::NoData));
        let summary = score_summary(&s, "q1", &["u1", "u3"]).expect("summary");
        assert_eq!(summary.average, 80.0);
        assert_eq!(summary.scored_count, 1);
        assert_eq!(summary.no_mark_count, 1);
    }

    #[test]
    fn recorded_zero_is_a_real_score() {
        let mut s = scenario_store();
        s.set_score("q1", "u3", 0.0);
        assert_eq!(compute_average_score(&s, "q1", &["u3"]), Ok(0.0));
    }

    #[test]
    fn all_hundred_is_hundred() {
        let mut s = scenario_store();
        s.set_score("q1", "u1", 100.0);
        s.set_score("q1", "u3", 100.0);
        assert_eq!(
            compute_average_score(&s, "q1", &["u1", "u2", "u3"]),
            Ok(100.0)
        );
    }

    #[test]
    fn unknown_recipient_is_not_found_not_no_mark() {
        let s = scenario_store();
        let ghost = Err(ViewError::not_found(EntityKind::Learner, "ghost"));
        assert_eq!(compute_average_score(&s, "q1", &["u1", "ghost"]), ghost);
        assert_eq!(compute_average_score(&s, "q1", &["ghost"]), ghost);
    }

    #[test]
    fn average_for_unknown_quiz_is_not_found() {
        let s = scenario_store();
        assert_eq!(
            compute_average_score(&s, "qx", &["u1"]),
            Err(ViewError::not_found(EntityKind::Quiz, "qx"))
        );
    }

    #[test]
    fn report_header_uses_assigned_groups_by_default() {
        let s = scenario_store();
        let strings = StringTable::default();
        let header = recompute_report_header(
            &ReportParams {
                quiz_id: "q1".into(),
                group_id: None,
            },
            &s,
            &strings,
        )
        .expect("header");
        assert_eq!(header.title, "Quiz 1");
        assert_eq!(header.status_label, "Active");
        assert_eq!(header.group_names, vec!["Red Team".to_string()]);
        assert_eq!(header.recipient_count, 2);
        assert_eq!(header.average_score, Some(90.0));
        assert_eq!(header.average_score_label, "Average score: 90%");
        assert_eq!(
            header.options.iter().map(|o| o.value).collect::<Vec<_>>(),
            vec![MenuAction::Preview, MenuAction::EditDetails]
        );
    }

    #[test]
    fn report_header_for_group_with_no_scores_flags_no_data() {
        let mut s = scenario_store();
        s.insert_group(Group {
            id: "g3".into(),
            name: "Empty".into(),
        });
        let header = recompute_report_header(
            &ReportParams {
                quiz_id: "q1".into(),
                group_id: Some("g3".into()),
            },
            &s,
            &StringTable::default(),
        )
        .expect("header");
        assert!(header.no_data);
        assert_eq!(header.average_score, None);
        assert_eq!(header.average_score_label, "Average score: not available");
        assert_eq!(header.learner_count_label, "0 learners");
    }

    #[test]
    fn unassigned_quiz_reports_on_the_entire_class() {
        let mut s = scenario_store();
        s.insert_assessment(Assessment {
            id: "q2".into(),
            title: "Quiz 2".into(),
            active: false,
            assigned_group_ids: vec![],
        });
        s.set_score("q2", "u1", 80.0);
        let header = recompute_report_header(
            &ReportParams {
                quiz_id: "q2".into(),
                group_id: None,
            },
            &s,
            &StringTable::default(),
        )
        .expect("header");
        assert!(header.group_names.is_empty());
        assert_eq!(header.recipients_label, "Recipients: Entire class");
        assert_eq!(header.recipient_count, 3);
        assert_eq!(header.learner_count_label, "3 learners");
        assert!(!header.no_data);
        assert_eq!(header.average_score, Some(80.0));
        assert_eq!(header.average_score_label, "Average score: 80%");
        assert_eq!(header.options_label, "Options");
    }

    #[test]
    fn report_header_with_unknown_group_is_not_found() {
        let s = scenario_store();
        let res = recompute_report_header(
            &ReportParams {
                quiz_id: "q1".into(),
                group_id: Some("gx".into()),
            },
            &s,
            &StringTable::default(),
        );
        assert_eq!(res, Err(ViewError::not_found(EntityKind::Group, "gx")));
    }

    #[test]
    fn percent_formatting() {
        assert_eq!(format_percent(90.0), "90");
        assert_eq!(format_percent(66.6666), "66.7");
    }
}
