//! Reply payloads: plain text or text plus one select-menu row.

use serde::Serialize;

const ACTION_ROW: u8 = 1;
const STRING_SELECT: u8 = 3;

/// Platform cap on options in one select menu.
pub const MAX_SELECT_VALUES: usize = 25;
/// Platform cap on select option labels and values, minus one.
pub const MAX_OPTION_TEXT: usize = 99;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub content: String,
    pub components: Vec<ActionRow>,
}

impl Reply {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            components: Vec::new(),
        }
    }

    pub fn with_select(mut self, menu: SelectMenu) -> Self {
        self.components.push(ActionRow {
            kind: ACTION_ROW,
            components: vec![menu],
        });
        self
    }

    /// The first select menu of the reply, if any.
    pub fn select_menu(&self) -> Option<&SelectMenu> {
        self.components.iter().flat_map(|row| &row.components).next()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionRow {
    #[serde(rename = "type")]
    kind: u8,
    pub components: Vec<SelectMenu>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectMenu {
    #[serde(rename = "type")]
    kind: u8,
    pub custom_id: String,
    pub options: Vec<SelectOption>,
    pub placeholder: String,
    pub min_values: usize,
    pub max_values: usize,
}

impl SelectMenu {
    pub fn new(custom_id: impl Into<String>, placeholder: impl Into<String>) -> Self {
        Self {
            kind: STRING_SELECT,
            custom_id: custom_id.into(),
            options: Vec::new(),
            placeholder: placeholder.into(),
            min_values: 1,
            max_values: 1,
        }
    }

    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    pub fn range(mut self, min_values: usize, max_values: usize) -> Self {
        self.min_values = min_values;
        self.max_values = max_values;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
    pub description: String,
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
