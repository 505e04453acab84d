//! Command surface of the tree
//!
//! The host registers these ids and forwards invocations to
//! [`TreeCommands::execute`]. Sign-in ids only appear on action nodes; the
//! authentication UI owns them.

use crate::error::TreeError;
use crate::provider::PullRequestsTreeProvider;
use gh_pr_config::{QUERIES_SETTING, REMOTES_SETTING};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// Drop every cached category and rebuild the tree
    RefreshList,
    /// Fetch the next page of a category (argument: category id)
    LoadMore,
    /// Open the remote allowlist setting
    ConfigureRemotes,
    /// Open the query setting
    ConfigurePrViewlet,
    SignIn,
    SignInEnterprise,
}

impl CommandId {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandId::RefreshList => "pr.refreshList",
            CommandId::LoadMore => "pr.loadMore",
            CommandId::ConfigureRemotes => "pr.configureRemotes",
            CommandId::ConfigurePrViewlet => "pr.configurePRViewlet",
            CommandId::SignIn => "pr.signin",
            CommandId::SignInEnterprise => "pr.signinEnterprise",
        }
    }

    /// Ids the tree handles itself
    pub fn tree_commands() -> [CommandId; 4] {
        [
            CommandId::RefreshList,
            CommandId::LoadMore,
            CommandId::ConfigureRemotes,
            CommandId::ConfigurePrViewlet,
        ]
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CommandId {
    type Err = TreeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            CommandId::RefreshList,
            CommandId::LoadMore,
            CommandId::ConfigureRemotes,
            CommandId::ConfigurePrViewlet,
            CommandId::SignIn,
            CommandId::SignInEnterprise,
        ]
        .into_iter()
        .find(|id| id.as_str() == s)
        .ok_or_else(|| TreeError::UnknownCommand(s.to_string()))
    }
}

/// Runs tree commands against a provider
#[derive(Clone)]
pub struct TreeCommands {
    provider: PullRequestsTreeProvider,
}

impl TreeCommands {
    pub fn new(provider: PullRequestsTreeProvider) -> Self {
        Self { provider }
    }

    /// Execute a command by id
    ///
    /// Sign-in ids are rejected as unknown since the tree does not register
    /// them.
    pub async fn execute(&self, id: &str, argument: Option<&str>) -> anyhow::Result<()> {
        let command: CommandId = id.parse()?;
        log::debug!("TreeCommands: {} {:?}", command, argument);

        match command {
            CommandId::RefreshList => {
                self.provider.model().clear_all();
                self.provider.refresh(None);
            }
            CommandId::LoadMore => {
                let category_id = argument.ok_or_else(|| TreeError::InvalidCommandArgument {
                    command: CommandId::LoadMore.as_str(),
                    reason: "missing category id".to_string(),
                })?;
                let category = self.provider.find_category(category_id).ok_or_else(|| {
                    TreeError::InvalidCommandArgument {
                        command: CommandId::LoadMore.as_str(),
                        reason: format!("no category '{}' in the tree", category_id),
                    }
                })?;
                category.load_more().await?;
            }
            CommandId::ConfigureRemotes => self.provider.view().open_settings(REMOTES_SETTING)?,
            CommandId::ConfigurePrViewlet => {
                self.provider.view().open_settings(QUERIES_SETTING)?
            }
            CommandId::SignIn | CommandId::SignInEnterprise => {
                return Err(TreeError::UnknownCommand(id.to_string()).into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ActionKind, NodeKind};
    use crate::provider::TreeChange;
    use crate::testing::Harness;
    use std::sync::{Arc, Mutex};

    fn record_changes(harness: &Harness) -> (Arc<Mutex<Vec<String>>>, crate::event::Subscription) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let s = Arc::clone(&seen);
        let sub = harness
            .provider
            .on_did_change_tree_data()
            .event(move |change: &TreeChange| {
                let label = match change {
                    TreeChange::All => "all".to_string(),
                    TreeChange::Node(node) => node.id().to_string(),
                };
                s.lock().unwrap().push(label);
            });
        (seen, sub)
    }

    #[test]
    fn test_command_ids_round_trip_through_strings() {
        for id in CommandId::tree_commands() {
            assert_eq!(id.as_str().parse::<CommandId>().unwrap(), id);
        }
        assert_eq!(
            "pr.nope".parse::<CommandId>().unwrap_err(),
            TreeError::UnknownCommand("pr.nope".to_string())
        );
    }

    #[tokio::test]
    async fn test_refresh_list_clears_model_and_fires() {
        let harness = Harness::single_folder(1..=3, 20);
        let commands = TreeCommands::new(harness.provider.clone());
        let roots = harness.provider.get_children(None).await;
        let all = roots.last().unwrap().clone();
        all.children().await;
        let calls = harness.source.pull_request_calls();

        let (seen, _sub) = record_changes(&harness);
        commands.execute("pr.refreshList", None).await.unwrap();
        assert_eq!(*seen.lock().unwrap(), vec!["all".to_string()]);

        let roots = harness.provider.get_children(None).await;
        roots.last().unwrap().children().await;
        assert_eq!(harness.source.pull_request_calls(), calls + 1);
    }

    #[tokio::test]
    async fn test_load_more_fetches_next_page_and_refreshes_category() {
        let harness = Harness::single_folder(1..=5, 2);
        let commands = TreeCommands::new(harness.provider.clone());
        let roots = harness.provider.get_children(None).await;
        let all = roots.last().unwrap().clone();

        let children = all.children().await;
        assert_eq!(children.len(), 3);
        let more = children.last().unwrap();
        assert_eq!(more.kind(), NodeKind::Action(ActionKind::More));
        let item = more.tree_item().await.unwrap();
        let command = item.command.unwrap();
        assert_eq!(command.id, CommandId::LoadMore);
        assert_eq!(command.argument.as_deref(), Some("All Open"));

        let (seen, _sub) = record_changes(&harness);
        commands
            .execute(command.id.as_str(), command.argument.as_deref())
            .await
            .unwrap();

        assert_eq!(*seen.lock().unwrap(), vec!["All Open".to_string()]);
        assert!(all.cached_children().is_none());
        let children = all.children().await;
        let numbers: Vec<u64> = children
            .iter()
            .filter_map(|c| c.as_pull_request().map(|pr| pr.pull_request().number))
            .collect();
        assert_eq!(numbers, vec![5, 4, 3, 2]);
    }

    #[tokio::test]
    async fn test_load_more_rejects_unknown_category() {
        let harness = Harness::single_folder(1..=3, 20);
        let commands = TreeCommands::new(harness.provider.clone());
        harness.provider.get_children(None).await;

        let err = commands
            .execute("pr.loadMore", Some("Nope"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TreeError>(),
            Some(TreeError::InvalidCommandArgument { .. })
        ));
        assert!(commands.execute("pr.loadMore", None).await.is_err());
    }

    #[tokio::test]
    async fn test_configure_commands_open_settings() {
        let harness = Harness::single_folder(1..=1, 20);
        let commands = TreeCommands::new(harness.provider.clone());

        commands.execute("pr.configureRemotes", None).await.unwrap();
        commands.execute("pr.configurePRViewlet", None).await.unwrap();

        assert_eq!(
            *harness.view.opened_settings.lock().unwrap(),
            vec![REMOTES_SETTING.to_string(), QUERIES_SETTING.to_string()]
        );
    }

    #[tokio::test]
    async fn test_sign_in_is_not_a_tree_command() {
        let harness = Harness::single_folder(1..=1, 20);
        let commands = TreeCommands::new(harness.provider.clone());
        let err = commands.execute("pr.signin", None).await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<TreeError>(),
            Some(&TreeError::UnknownCommand("pr.signin".to_string()))
        );
    }
}
