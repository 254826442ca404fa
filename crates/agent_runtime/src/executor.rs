//! Runs one plan step against the live game server (§4.6): wait out the
//! cooldown, dispatch to the registered descriptor, fold its result back
//! into state and into the learned world model, and classify failures for
//! the loop's retry/replan/fatal decision.

use crate::config::AgentConfig;
use crate::cooldown_gate::CooldownGate;
use agent_actions::{ActionContext, ActionRegistry, ActionResult};
use agent_client::GameClient;
use agent_planning::{merge, StateMap};
use tokio::time::sleep;

/// How the loop should respond to a failed step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureClass {
    /// Worth retrying after a backoff (§7: transient network errors).
    Retryable,
    /// The action's preconditions no longer hold in reality; discard the
    /// plan and replan rather than retry the same step (§7: rejected,
    /// not-found, cooldown-misprediction).
    Replan,
    /// Unrecoverable; the loop should stop (§7: repeated rejection or
    /// an auth-class failure).
    Fatal,
}

/// Classifies an [`ActionResult`] failure string by the `GameError`
/// `Display` prefix that produced it (`agent_client::GameError`'s
/// variants are not preserved across the `execute` boundary, which only
/// returns formatted text — the prefixes are stable enough to dispatch
/// on).
fn classify(error: &str) -> FailureClass {
    if error.starts_with("fatal error:") {
        FailureClass::Fatal
    } else if error.starts_with("transient network error:") {
        FailureClass::Retryable
    } else {
        FailureClass::Replan
    }
}

/// Parses the `{seconds:.1}s remaining` suffix of a `GameError::Cooldown`
/// `Display` string (`"character on cooldown, 12.3s remaining"`). `None`
/// means the error wasn't a cooldown rejection.
fn parse_cooldown_seconds(error: &str) -> Option<f64> {
    error.strip_prefix("character on cooldown, ")?.strip_suffix("s remaining")?.parse::<f64>().ok()
}

pub struct StepOutcome {
    pub result: ActionResult,
    pub failure_class: Option<FailureClass>,
}

/// Executes named actions against a shared [`ActionContext`], gated by a
/// per-character [`CooldownGate`] and learning from every successful
/// result (§4.6).
pub struct ActionExecutor {
    cooldown: CooldownGate,
    retry_base: f64,
    retry_factor: f64,
    retry_max_attempts: u32,
}

impl ActionExecutor {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            cooldown: CooldownGate::new(config.cooldown_buffer()),
            retry_base: config.retry_base_seconds,
            retry_factor: config.retry_factor,
            retry_max_attempts: config.retry_max_attempts,
        }
    }

    pub fn cooldown(&self) -> &CooldownGate {
        &self.cooldown
    }

    /// Executes `action_name` once the cooldown clears, retrying
    /// transient failures with exponential backoff up to
    /// `retry_max_attempts` (§5, §7). Does not itself decide
    /// replan-vs-abort on `FailureClass::Replan`/`Fatal` — that is the
    /// loop's job, since only the loop knows the rest of the plan.
    pub async fn execute(
        &self,
        registry: &ActionRegistry,
        client: &dyn GameClient,
        ctx: &mut ActionContext,
        action_name: &str,
        state: &mut StateMap,
        mut cancel: impl FnMut() -> bool,
    ) -> StepOutcome {
        let Some(descriptor) = registry.get(action_name) else {
            return StepOutcome {
                result: ActionResult::failure(format!("no registered action named {action_name}")),
                failure_class: Some(FailureClass::Fatal),
            };
        };

        let mut attempt = 0;
        let mut cooldown_retried = false;
        loop {
            self.cooldown.wait_until_ready(&mut cancel).await;
            if cancel() {
                return StepOutcome {
                    result: ActionResult::failure("cancelled while waiting for cooldown"),
                    failure_class: Some(FailureClass::Replan),
                };
            }

            let result = descriptor.execute(client, ctx).await;

            if result.success {
                if let Some(seconds) = result.cooldown_seconds {
                    self.cooldown.arm(seconds);
                }
                merge(state, &result.state_changes);
                return StepOutcome { result, failure_class: None };
            }

            let error_text = result.error.clone().unwrap_or_default();

            // A cooldown rejection means our local gate mispredicted the
            // server's clock. Re-arm from the real remaining seconds,
            // re-read the character so the blackboard isn't stale, and
            // retry once (§7) before surfacing it like any other failure.
            if let Some(seconds) = parse_cooldown_seconds(&error_text) {
                if !cooldown_retried {
                    cooldown_retried = true;
                    log::warn!("{action_name} hit cooldown with {seconds:.1}s remaining; re-arming and retrying once");
                    self.cooldown.arm(seconds);
                    if let Ok(character) = client.get_character(&ctx.character.name).await {
                        ctx.character = character;
                    }
                    continue;
                }
            }

            let class = classify(&error_text);
            if class == FailureClass::Retryable && attempt + 1 < self.retry_max_attempts {
                let backoff = self.retry_base * self.retry_factor.powi(attempt as i32);
                sleep(std::time::Duration::from_secs_f64(backoff)).await;
                attempt += 1;
                continue;
            }
            ctx.intermediate.last_error = Some(error_text);
            return StepOutcome { result, failure_class: Some(class) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_actions::descriptor::ActionDescriptor;
    use agent_client::mock::MockGameClient;
    use agent_client::{CharacterSnapshot, SkillLevels};
    use agent_planning::{PlanAction, StateMap as PlanStateMap};
    use agent_world::{KnowledgeBase, MapCache};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[test]
    fn classifies_known_prefixes() {
        assert_eq!(classify("fatal error: bad token"), FailureClass::Fatal);
        assert_eq!(classify("transient network error: timeout"), FailureClass::Retryable);
        assert_eq!(classify("rejected: insufficient materials"), FailureClass::Replan);
        assert_eq!(classify("not found: foo"), FailureClass::Replan);
    }

    #[test]
    fn parses_cooldown_remaining_seconds() {
        assert_eq!(parse_cooldown_seconds("character on cooldown, 12.3s remaining"), Some(12.3));
        assert_eq!(parse_cooldown_seconds("rejected: insufficient materials"), None);
    }

    /// Fails its first call with a cooldown rejection, then succeeds.
    struct CooldownOnceAction {
        calls: AtomicUsize,
    }

    impl PlanAction for CooldownOnceAction {
        fn name(&self) -> &str {
            "cooldown_once"
        }
        fn preconditions(&self) -> &PlanStateMap {
            static EMPTY: std::sync::OnceLock<PlanStateMap> = std::sync::OnceLock::new();
            EMPTY.get_or_init(PlanStateMap::new)
        }
        fn effects(&self) -> &PlanStateMap {
            static EMPTY: std::sync::OnceLock<PlanStateMap> = std::sync::OnceLock::new();
            EMPTY.get_or_init(PlanStateMap::new)
        }
        fn weight(&self) -> f64 {
            1.0
        }
    }

    #[async_trait]
    impl ActionDescriptor for CooldownOnceAction {
        async fn execute(&self, _client: &dyn agent_client::GameClient, _ctx: &mut ActionContext) -> ActionResult {
            let n = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            if n == 0 {
                ActionResult::failure("character on cooldown, 0.1s remaining")
            } else {
                ActionResult::success(serde_json::json!({}), StateMap::new(), Some(0.0))
            }
        }
    }

    #[tokio::test]
    async fn cooldown_rejection_re_arms_gate_and_retries_once() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(CooldownOnceAction { calls: AtomicUsize::new(0) }));
        let mut ctx =
            ActionContext::new(snapshot(), Arc::new(Mutex::new(KnowledgeBase::new())), Arc::new(Mutex::new(MapCache::new())));
        let mut state = StateMap::new();
        let executor = ActionExecutor::new(&AgentConfig::default());

        let outcome = executor.execute(&registry, &client, &mut ctx, "cooldown_once", &mut state, || false).await;

        assert!(outcome.result.success, "should succeed on the retried attempt");
        assert!(outcome.failure_class.is_none());
    }

    #[tokio::test]
    async fn second_consecutive_cooldown_rejection_is_surfaced_as_replan() {
        struct AlwaysCooldown;

        impl PlanAction for AlwaysCooldown {
            fn name(&self) -> &str {
                "always_cooldown"
            }
            fn preconditions(&self) -> &PlanStateMap {
                static EMPTY: std::sync::OnceLock<PlanStateMap> = std::sync::OnceLock::new();
                EMPTY.get_or_init(PlanStateMap::new)
            }
            fn effects(&self) -> &PlanStateMap {
                static EMPTY: std::sync::OnceLock<PlanStateMap> = std::sync::OnceLock::new();
                EMPTY.get_or_init(PlanStateMap::new)
            }
            fn weight(&self) -> f64 {
                1.0
            }
        }

        #[async_trait]
        impl ActionDescriptor for AlwaysCooldown {
            async fn execute(&self, _client: &dyn agent_client::GameClient, _ctx: &mut ActionContext) -> ActionResult {
                ActionResult::failure("character on cooldown, 0.1s remaining")
            }
        }

        let client = MockGameClient::new().with_character(snapshot());
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(AlwaysCooldown));
        let mut ctx =
            ActionContext::new(snapshot(), Arc::new(Mutex::new(KnowledgeBase::new())), Arc::new(Mutex::new(MapCache::new())));
        let mut state = StateMap::new();
        let executor = ActionExecutor::new(&AgentConfig::default());

        let outcome = executor.execute(&registry, &client, &mut ctx, "always_cooldown", &mut state, || false).await;

        assert!(!outcome.result.success);
        assert_eq!(outcome.failure_class, Some(FailureClass::Replan));
    }

    fn snapshot() -> CharacterSnapshot {
        CharacterSnapshot {
            name: "alice".into(),
            x: 0,
            y: 0,
            hp: 10,
            max_hp: 100,
            level: 1,
            skills: SkillLevels::default(),
            gold: 0,
            inventory: Vec::new(),
            equipment: Default::default(),
            cooldown_seconds: 0.0,
        }
    }

    #[tokio::test]
    async fn rest_action_arms_cooldown_and_merges_state() {
        let client = MockGameClient::new().with_character(snapshot());
        let mut registry = ActionRegistry::new();
        registry.register(Box::new(agent_actions::combat::RestAction::new()));
        let mut ctx =
            ActionContext::new(snapshot(), Arc::new(Mutex::new(KnowledgeBase::new())), Arc::new(Mutex::new(MapCache::new())));
        let mut state = StateMap::new();
        let executor = ActionExecutor::new(&AgentConfig::default());

        let outcome = executor.execute(&registry, &client, &mut ctx, "rest", &mut state, || false).await;

        assert!(outcome.result.success);
        assert!(outcome.failure_class.is_none());
        assert!(!executor.cooldown().is_ready());
        assert!(agent_planning::get_path(&state, "character_status.hp").is_some());
    }

    #[tokio::test]
    async fn unknown_action_name_is_fatal() {
        let client = MockGameClient::new().with_character(snapshot());
        let registry = ActionRegistry::new();
        let mut ctx =
            ActionContext::new(snapshot(), Arc::new(Mutex::new(KnowledgeBase::new())), Arc::new(Mutex::new(MapCache::new())));
        let mut state = StateMap::new();
        let executor = ActionExecutor::new(&AgentConfig::default());

        let outcome = executor.execute(&registry, &client, &mut ctx, "does_not_exist", &mut state, || false).await;

        assert!(!outcome.result.success);
        assert_eq!(outcome.failure_class, Some(FailureClass::Fatal));
    }
}
