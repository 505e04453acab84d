//! Host-displayable item descriptors

use crate::commands::CommandId;

/// Whether and how an item can be expanded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Collapsible {
    /// Leaf item
    #[default]
    None,
    /// Has children, shown collapsed
    Collapsed,
    /// Has children, shown expanded
    Expanded,
}

/// Checkbox state of a checkbox-capable item
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CheckboxState {
    #[default]
    Unchecked,
    Checked,
}

impl CheckboxState {
    pub fn is_checked(&self) -> bool {
        matches!(self, CheckboxState::Checked)
    }
}

impl From<bool> for CheckboxState {
    fn from(checked: bool) -> Self {
        if checked {
            CheckboxState::Checked
        } else {
            CheckboxState::Unchecked
        }
    }
}

/// Command run when the item is activated
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemCommand {
    pub id: CommandId,
    pub title: String,
    pub argument: Option<String>,
}

impl ItemCommand {
    pub fn new(id: CommandId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            argument: None,
        }
    }

    pub fn with_argument(mut self, argument: impl Into<String>) -> Self {
        self.argument = Some(argument.into());
        self
    }
}

/// Everything the host needs to render one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeItem {
    /// Stable identity, equal to the node id
    pub id: String,
    pub label: String,
    pub description: Option<String>,
    /// Filled lazily by `resolve_tree_item` for kinds that support it
    pub tooltip: Option<String>,
    pub collapsible: Collapsible,
    /// Kind marker hosts use for menus
    pub context_value: Option<String>,
    pub checkbox: Option<CheckboxState>,
    pub command: Option<ItemCommand>,
}

impl TreeItem {
    pub fn new(id: impl Into<String>, label: impl Into<String>, collapsible: Collapsible) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            description: None,
            tooltip: None,
            collapsible,
            context_value: None,
            checkbox: None,
            command: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_context_value(mut self, context_value: impl Into<String>) -> Self {
        self.context_value = Some(context_value.into());
        self
    }

    pub fn with_checkbox(mut self, state: CheckboxState) -> Self {
        self.checkbox = Some(state);
        self
    }

    pub fn with_command(mut self, command: ItemCommand) -> Self {
        self.command = Some(command);
        self
    }
}
