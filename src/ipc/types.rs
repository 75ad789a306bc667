use std::collections::HashMap;
use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::i18n::StringTable;
use crate::store::LookupStore;
use crate::toggle::LocalToggle;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Banner,
}

impl ViewKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewKind::Banner => "banner",
        }
    }
}

/// Local state of one mounted view instance.
#[derive(Debug, Clone)]
pub struct MountedView {
    pub kind: ViewKind,
    pub toggle: LocalToggle,
}

#[derive(Default)]
pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub store: Option<LookupStore>,
    pub strings: StringTable,
    pub views: HashMap<String, MountedView>,
}
