// SPDX-FileCopyrightText: 2026 Belfry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scenario replay: feed a scripted event sequence through a real
//! engine and print what comes out.
//!
//! A scenario file holds one or more account sections, each with a list
//! of steps. A step is exactly one of:
//!
//! - `event` - any normalized event, in its serde form
//! - `wait_ms` - sleep, letting coalescing timers fire
//! - `remote_activity = true` - report another device as active now
//!
//! Accounts replay sequentially against default settings with no
//! focused conversation. Every delivery plan and badge change is
//! printed as it happens, then the final snapshot.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use belfry_config::BelfryConfig;
use belfry_core::error::BelfryError;
use belfry_core::event::NormalizedEvent;
use belfry_core::plan::{DeliveryPlan, NotificationDescriptor};
use belfry_core::traits::focus::Unfocused;
use belfry_core::traits::settings::{ConversationSettings, KindSettings, SettingsError};
use belfry_core::traits::{NotificationRenderer, SettingsStore};
use belfry_core::types::{AccountId, ConversationId, ConversationKind};
use belfry_engine::{AccountEngine, EngineSnapshot};

/// A scripted scenario: any number of independent accounts.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Scenario {
    #[serde(default)]
    accounts: Vec<AccountScript>,
}

/// The event script for one account.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct AccountScript {
    id: i32,
    #[serde(default)]
    steps: Vec<Step>,
}

/// One step of a script. Exactly one field must be set.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct Step {
    #[serde(default)]
    event: Option<NormalizedEvent>,
    #[serde(default)]
    wait_ms: Option<u64>,
    #[serde(default)]
    remote_activity: Option<bool>,
}

enum Directive {
    Event(NormalizedEvent),
    Wait(u64),
    RemoteActivity,
}

impl Step {
    fn into_directive(self) -> Option<Directive> {
        match (self.event, self.wait_ms, self.remote_activity) {
            (Some(event), None, None) => Some(Directive::Event(event)),
            (None, Some(ms), None) => Some(Directive::Wait(ms)),
            (None, None, Some(true)) => Some(Directive::RemoteActivity),
            _ => None,
        }
    }
}

/// Run the scenario at `path`, printing text or JSON lines.
pub async fn run_replay(
    config: &BelfryConfig,
    path: &Path,
    json: bool,
) -> Result<(), BelfryError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| BelfryError::Config(format!("cannot read {}: {e}", path.display())))?;
    let scenario: Scenario = toml::from_str(&content)
        .map_err(|e| BelfryError::Config(format!("invalid scenario {}: {e}", path.display())))?;

    info!(
        path = %path.display(),
        accounts = scenario.accounts.len(),
        "replaying scenario"
    );
    for script in scenario.accounts {
        run_account(config, script, json).await?;
    }
    Ok(())
}

async fn run_account(
    config: &BelfryConfig,
    script: AccountScript,
    json: bool,
) -> Result<(), BelfryError> {
    let account = AccountId(script.id);
    let engine = AccountEngine::spawn(
        account,
        config,
        Arc::new(DefaultSettings),
        Arc::new(Unfocused),
        Arc::new(PrintRenderer { account, json }),
    );
    let handle = engine.handle();

    let mut badge = handle.badge_watch();
    let badge_printer = tokio::spawn(async move {
        while badge.changed().await.is_ok() {
            let total = *badge.borrow_and_update();
            print_line(&ReplayLine::Badge { account, total }, json);
        }
    });

    for (index, step) in script.steps.into_iter().enumerate() {
        let directive = step.into_directive().ok_or_else(|| {
            BelfryError::Config(format!(
                "account {account} step {index}: exactly one of event, wait_ms, remote_activity = true"
            ))
        })?;
        match directive {
            Directive::Event(event) => handle.submit(event).await?,
            Directive::Wait(ms) => {
                tokio::time::sleep(std::time::Duration::from_millis(ms)).await;
            }
            Directive::RemoteActivity => {
                handle
                    .note_remote_activity(chrono::Utc::now().timestamp())
                    .await?;
            }
        }
    }

    engine.shutdown().await?;
    badge_printer
        .await
        .map_err(|e| BelfryError::Internal(format!("badge printer failed: {e}")))?;

    let snapshot = handle.snapshot();
    print_line(
        &ReplayLine::Snapshot {
            account,
            snapshot: snapshot.as_ref(),
        },
        json,
    );
    Ok(())
}

/// Settings used during replay: everything at built-in defaults.
struct DefaultSettings;

impl SettingsStore for DefaultSettings {
    fn conversation_settings(
        &self,
        _conversation: ConversationId,
    ) -> Result<ConversationSettings, SettingsError> {
        Ok(ConversationSettings::default())
    }

    fn kind_defaults(&self, _kind: ConversationKind) -> Result<KindSettings, SettingsError> {
        Ok(KindSettings::default())
    }
}

/// Renderer that prints every plan instead of talking to an OS.
struct PrintRenderer {
    account: AccountId,
    json: bool,
}

#[async_trait]
impl NotificationRenderer for PrintRenderer {
    async fn deliver(&self, plan: DeliveryPlan) -> Result<(), BelfryError> {
        print_line(
            &ReplayLine::Plan {
                account: self.account,
                plan: &plan,
            },
            self.json,
        );
        Ok(())
    }

    fn in_app_chime(&self, conversation: ConversationId) {
        print_line(
            &ReplayLine::Chime {
                account: self.account,
                conversation,
            },
            self.json,
        );
    }
}

/// One line of replay output.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ReplayLine<'a> {
    Plan {
        account: AccountId,
        plan: &'a DeliveryPlan,
    },
    Badge {
        account: AccountId,
        total: u32,
    },
    Chime {
        account: AccountId,
        conversation: ConversationId,
    },
    Snapshot {
        account: AccountId,
        snapshot: &'a EngineSnapshot,
    },
}

fn print_line(line: &ReplayLine<'_>, json: bool) {
    if json {
        match serde_json::to_string(line) {
            Ok(encoded) => println!("{encoded}"),
            Err(e) => eprintln!("belfry replay: cannot encode output: {e}"),
        }
        return;
    }
    match line {
        ReplayLine::Plan { account, plan } => {
            println!("account {account}: plan");
            if let Some(summary) = &plan.summary {
                print_descriptor("summary", summary);
            }
            for descriptor in &plan.per_conversation {
                print_descriptor("card", descriptor);
            }
            for conversation in &plan.to_cancel {
                println!("  cancel conversation={conversation}");
            }
        }
        ReplayLine::Badge { account, total } => {
            println!("account {account}: badge {total}");
        }
        ReplayLine::Chime {
            account,
            conversation,
        } => {
            println!("account {account}: chime conversation={conversation}");
        }
        ReplayLine::Snapshot { account, snapshot } => {
            println!(
                "account {account}: final total={} personal={}",
                snapshot.total_unread, snapshot.personal_count
            );
            for (conversation, count) in &snapshot.conversations {
                println!("  conversation {conversation}: {count} unread");
            }
        }
    }
}

fn print_descriptor(label: &str, descriptor: &NotificationDescriptor) {
    let place = match descriptor.conversation {
        Some(conversation) => format!(" conversation={conversation}"),
        None => String::new(),
    };
    let sound = if descriptor.profile.is_audible() {
        "audible"
    } else {
        "silent"
    };
    println!(
        "  {label}{place} {:?} ({} unread, {sound})",
        descriptor.title, descriptor.unread_count
    );
    for body_line in &descriptor.body_lines {
        println!("    | {body_line}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[accounts]]
id = 1

[[accounts.steps]]
[accounts.steps.event]
type = "new_messages"
is_final_of_batch = true

[[accounts.steps.event.messages]]
conversation_id = 10
message_id = 1
sender_id = 40
timestamp = 1700000000
kind = "private"
preview = "hello"

[[accounts.steps]]
wait_ms = 5

[[accounts.steps]]
[accounts.steps.event]
type = "read_up_to"
conversation_id = 10
max_message_id = 1

[[accounts.steps]]
[accounts.steps.event]
type = "full_resync"
pending_snapshot = []

[[accounts.steps.event.per_conversation_counts]]
conversation_id = 20
count = 5
"#;

    #[test]
    fn scenario_file_format_parses() {
        let scenario: Scenario = toml::from_str(SAMPLE).expect("sample scenario parses");
        assert_eq!(scenario.accounts.len(), 1);
        assert_eq!(scenario.accounts[0].id, 1);
        assert_eq!(scenario.accounts[0].steps.len(), 4);
    }

    #[test]
    fn steps_resolve_to_single_directives() {
        let scenario: Scenario = toml::from_str(SAMPLE).expect("sample scenario parses");
        let mut steps = scenario.accounts.into_iter().next().unwrap().steps;
        let read = steps.remove(2).into_directive();
        assert!(matches!(
            read,
            Some(Directive::Event(NormalizedEvent::ReadUpTo { .. }))
        ));
        let wait = steps.remove(1).into_directive();
        assert!(matches!(wait, Some(Directive::Wait(5))));
    }

    #[test]
    fn ambiguous_step_is_rejected() {
        let step = Step {
            event: None,
            wait_ms: Some(10),
            remote_activity: Some(true),
        };
        assert!(step.into_directive().is_none());
        assert!(Step::default().into_directive().is_none());
    }

    #[test]
    fn unknown_scenario_keys_are_rejected() {
        let result = toml::from_str::<Scenario>("[[acounts]]\nid = 1\n");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn replay_runs_a_scenario_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("scenario.toml");
        std::fs::write(&path, SAMPLE).expect("write scenario");

        let config = BelfryConfig::default();
        run_replay(&config, &path, true)
            .await
            .expect("scenario replays cleanly");
    }

    #[tokio::test]
    async fn missing_scenario_file_is_a_config_error() {
        let config = BelfryConfig::default();
        let err = run_replay(&config, Path::new("/nonexistent/scenario.toml"), false)
            .await
            .expect_err("missing file fails");
        assert!(matches!(err, BelfryError::Config(_)));
    }
}
