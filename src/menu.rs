use crate::error::ViewError;
use crate::i18n::Localizer;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuContext {
    Plan,
    Report,
}

impl MenuContext {
    pub fn parse(tag: &str) -> Result<Self, ViewError> {
        match tag {
            "plan" => Ok(MenuContext::Plan),
            "report" => Ok(MenuContext::Report),
            other => Err(ViewError::UnrecognizedContext(other.to_string())),
        }
    }

    pub fn actions(self) -> &'static [MenuAction] {
        match self {
            MenuContext::Plan => &[MenuAction::EditDetails, MenuAction::Copy, MenuAction::Delete],
            MenuContext::Report => &[MenuAction::Preview, MenuAction::EditDetails],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuAction {
    EditDetails,
    Copy,
    Delete,
    Preview,
}

impl MenuAction {
    fn label_key(self) -> &'static str {
        match self {
            MenuAction::EditDetails => "editDetails",
            MenuAction::Copy => "copy",
            MenuAction::Delete => "delete",
            MenuAction::Preview => "preview",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuOption {
    pub label: String,
    pub value: MenuAction,
}

/// Ordered options for a context tag; the order is what the dropdown renders.
pub fn resolve_options(
    options_for: &str,
    strings: &dyn Localizer,
) -> Result<Vec<MenuOption>, ViewError> {
    let ctx = MenuContext::parse(options_for)?;
    Ok(options_for_context(ctx, strings))
}

pub fn options_for_context(ctx: MenuContext, strings: &dyn Localizer) -> Vec<MenuOption> {
    ctx.actions()
        .iter()
        .map(|&action| MenuOption {
            label: strings.resolve(action.label_key(), &[]),
            value: action,
        })
        .collect()
}
