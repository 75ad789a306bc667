use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub title: String,
    pub active: bool,
    pub assigned_group_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Learner {
    pub id: String,
    pub full_name: String,
}

/// Immutable snapshot of everything the coach views read. The loader builds a
/// fresh one after every write and swaps it in; views never mutate it.
#[derive(Debug, Clone, Default)]
pub struct LookupStore {
    groups: HashMap<String, Group>,
    group_order: Vec<String>,
    assessments: HashMap<String, Assessment>,
    learners: HashMap<String, Learner>,
    learner_order: Vec<String>,
    learners_by_group: HashMap<String, Vec<String>>,
    // (assessment id, learner id) -> percent
    scores: HashMap<(String, String), f64>,
}

impl LookupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_group(&mut self, group: Group) {
        if !self.groups.contains_key(&group.id) {
            self.group_order.push(group.id.clone());
        }
        self.learners_by_group.entry(group.id.clone()).or_default();
        self.groups.insert(group.id.clone(), group);
    }

    pub fn insert_assessment(&mut self, assessment: Assessment) {
        self.assessments.insert(assessment.id.clone(), assessment);
    }

    pub fn insert_learner(&mut self, learner: Learner) {
        if !self.learners.contains_key(&learner.id) {
            self.learner_order.push(learner.id.clone());
        }
        self.learners.insert(learner.id.clone(), learner);
    }

    /// Appends `learner_id` to the group's member list; repeated adds are ignored.
    pub fn add_membership(&mut self, group_id: &str, learner_id: &str) {
        let members = self.learners_by_group.entry(group_id.to_string()).or_default();
        if !members.iter().any(|m| m == learner_id) {
            members.push(learner_id.to_string());
        }
    }

    pub fn set_score(&mut self, assessment_id: &str, learner_id: &str, percent: f64) {
        self.scores
            .insert((assessment_id.to_string(), learner_id.to_string()), percent);
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.get(id)
    }

    /// Groups in creation order.
    pub fn groups(&self) -> impl Iterator<Item = &Group> {
        self.group_order.iter().filter_map(|id| self.groups.get(id))
    }

    pub fn assessment(&self, id: &str) -> Option<&Assessment> {
        self.assessments.get(id)
    }

    pub fn learner(&self, id: &str) -> Option<&Learner> {
        self.learners.get(id)
    }

    /// Learners in creation order.
    pub fn learners(&self) -> impl Iterator<Item = &Learner> {
        self.learner_order.iter().filter_map(|id| self.learners.get(id))
    }

    pub fn learners_in_group(&self, group_id: &str) -> Option<&[String]> {
        self.learners_by_group.get(group_id).map(|v| v.as_slice())
    }

    pub fn score(&self, assessment_id: &str, learner_id: &str) -> Option<f64> {
        self.scores
            .get(&(assessment_id.to_string(), learner_id.to_string()))
            .copied()
    }
}
