//! The perceive/plan/execute/learn control loop (§4.8): one character,
//! one logical thread of control, strictly serialized against the server
//! (§5).

use crate::config::AgentConfig;
use crate::executor::{ActionExecutor, FailureClass};
use crate::goal_manager::{character_full_state, GoalManager};
use agent_actions::{ActionContext, ActionRegistry};
use agent_client::GameClient;
use agent_planning::{matches, GoapPlanner, Plan, PlannerConfig, StateMap};
use agent_world::{KnowledgeBase, MapCache};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

/// Drives one character's GOAP loop until `stop()` is called or a fatal
/// error occurs. Saves `KnowledgeBase`/`MapCache` on an interval and on
/// exit (§4.8).
pub struct AIPlayerLoop {
    client: Arc<dyn GameClient>,
    registry: ActionRegistry,
    planner: GoapPlanner,
    executor: ActionExecutor,
    goal_manager: GoalManager,
    knowledge: Arc<Mutex<KnowledgeBase>>,
    map: Arc<Mutex<MapCache>>,
    character_name: String,
    config: AgentConfig,
    stop: Arc<AtomicBool>,
    stop_file: Option<PathBuf>,
}

impl AIPlayerLoop {
    pub fn new(
        client: Arc<dyn GameClient>,
        registry: ActionRegistry,
        goal_manager: GoalManager,
        knowledge: Arc<Mutex<KnowledgeBase>>,
        map: Arc<Mutex<MapCache>>,
        character_name: impl Into<String>,
        config: AgentConfig,
    ) -> Self {
        let planner = GoapPlanner::new(PlannerConfig { max_nodes: config.max_nodes });
        let executor = ActionExecutor::new(&config);
        Self {
            client,
            registry,
            planner,
            executor,
            goal_manager,
            knowledge,
            map,
            character_name: character_name.into(),
            config,
            stop: Arc::new(AtomicBool::new(false)),
            stop_file: None,
        }
    }

    /// Also treats the existence of `path` as a stop request, checked
    /// alongside the in-process flag; the `stop-character` subcommand
    /// creates this file from a separate invocation of the binary.
    pub fn with_stop_file(mut self, path: PathBuf) -> Self {
        self.stop_file = Some(path);
        self
    }

    /// A clonable handle external signal handling can flip to request
    /// shutdown; checked at every loop iteration boundary and inside the
    /// cooldown wait (§5 cancellation).
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stop.clone()
    }

    pub fn stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    fn should_stop(&self) -> bool {
        self.stop.load(Ordering::SeqCst) || self.stop_file.as_ref().is_some_and(|p| p.exists())
    }

    async fn persist(&self) -> anyhow::Result<()> {
        self.knowledge.lock().await.save()?;
        self.map.lock().await.save()?;
        Ok(())
    }

    /// Runs the loop to completion: `stop()`, a fatal error, or the
    /// character becoming unreachable.
    pub async fn run(&mut self) -> anyhow::Result<()> {
        let mut character = self.client.get_character(&self.character_name).await?;
        let mut ctx = ActionContext::new(character.clone(), self.knowledge.clone(), self.map.clone());

        let mut plan: Option<Plan> = None;
        let mut plan_cursor = 0usize;
        let mut state = StateMap::new();

        let mut last_refresh = Instant::now()
            .checked_sub(self.config.refresh_ttl())
            .unwrap_or_else(Instant::now);
        let mut last_save = Instant::now();

        loop {
            if self.should_stop() {
                break;
            }

            if last_refresh.elapsed() >= self.config.refresh_ttl() {
                character = self.client.get_character(&self.character_name).await?;
                ctx.character = character.clone();
                last_refresh = Instant::now();
            }

            if plan.is_none() {
                ctx.reset_for_new_goal();
                let (goal_name, goal) = self.goal_manager.next_goal(&character);
                state = character_full_state(&character);
                let plan_actions = self.registry.plan_actions();
                match self.planner.plan(&state, &goal, &plan_actions) {
                    Some(p) if !p.is_empty() => {
                        log::info!("planned {} step(s) toward {goal_name}", p.len());
                        plan_cursor = 0;
                        plan = Some(p);
                    }
                    Some(_) => {
                        sleep(self.config.no_plan_backoff()).await;
                        continue;
                    }
                    None => {
                        log::warn!("no plan found toward {goal_name}");
                        sleep(self.config.no_plan_backoff()).await;
                        continue;
                    }
                }
            }

            let action_name = plan.as_ref().expect("just populated above").steps[plan_cursor].action_name.clone();
            let stop = self.stop.clone();
            let outcome = self
                .executor
                .execute(&self.registry, self.client.as_ref(), &mut ctx, &action_name, &mut state, || {
                    stop.load(Ordering::SeqCst)
                })
                .await;
            character = ctx.character.clone();

            match outcome.failure_class {
                Some(FailureClass::Fatal) => {
                    log::error!("fatal error executing {action_name}: {:?}", outcome.result.error);
                    self.persist().await?;
                    anyhow::bail!("fatal error executing {action_name}: {}", outcome.result.error.unwrap_or_default());
                }
                Some(_) => {
                    log::warn!("step {action_name} failed: {:?}; discarding plan", outcome.result.error);
                    plan = None;
                }
                None => {
                    plan_cursor += 1;
                    let remaining = plan.as_ref().map(|p| p.steps.len() - plan_cursor).unwrap_or(0);
                    if remaining == 0 {
                        plan = None;
                    } else if !self.next_step_still_applicable(plan.as_ref().unwrap(), plan_cursor, &state) {
                        log::info!("post-state diverged from plan before step {plan_cursor}; replanning");
                        plan = None;
                    }
                }
            }

            if last_save.elapsed() >= self.config.save_interval() {
                self.persist().await?;
                last_save = Instant::now();
            }
        }

        self.persist().await?;
        Ok(())
    }

    /// Divergence check (§4.8): the next queued step's preconditions are
    /// the concrete, checkable form of "predicted effects" for a plan
    /// built of Pending-valued effects — if reality no longer satisfies
    /// them, the rest of the plan is stale.
    fn next_step_still_applicable(&self, plan: &Plan, cursor: usize, state: &StateMap) -> bool {
        let Some(step) = plan.steps.get(cursor) else { return true };
        match self.registry.get(&step.action_name) {
            Some(descriptor) => matches(state, descriptor.preconditions()),
            None => false,
        }
    }
}

/// The knowledge-base and map-cache file paths under a data directory
/// (§6.2), shared by the binary's `run-character`/`status-character`/
/// `diagnose-state` subcommands.
pub fn default_paths(data_prefix: &std::path::Path) -> (PathBuf, PathBuf) {
    (data_prefix.join("knowledge.json"), data_prefix.join("map.json"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::goal_manager::GoalTargets;
    use agent_client::mock::MockGameClient;
    use agent_client::{CharacterSnapshot, SkillLevels};

    fn snapshot(level: u32) -> CharacterSnapshot {
        CharacterSnapshot {
            name: "alice".into(),
            x: 0,
            y: 0,
            hp: 100,
            max_hp: 100,
            level,
            skills: SkillLevels::default(),
            gold: 0,
            inventory: Vec::new(),
            equipment: Default::default(),
            cooldown_seconds: 0.0,
        }
    }

    fn registry() -> ActionRegistry {
        agent_actions::build_default_registry()
    }

    #[tokio::test]
    async fn stop_file_existing_before_run_stops_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let stop_file = dir.path().join("alice.stop");
        std::fs::write(&stop_file, "").unwrap();

        let client: Arc<dyn GameClient> = Arc::new(MockGameClient::new().with_character(snapshot(1)));
        let knowledge = Arc::new(Mutex::new(KnowledgeBase::new()));
        let map = Arc::new(Mutex::new(MapCache::new()));
        let mut ai_loop = AIPlayerLoop::new(
            client,
            registry(),
            GoalManager::new(GoalTargets::new()),
            knowledge,
            map,
            "alice",
            AgentConfig::default(),
        )
        .with_stop_file(stop_file);
        ai_loop.run().await.unwrap();
    }

    #[tokio::test]
    async fn stopped_loop_persists_and_returns_immediately() {
        let client: Arc<dyn GameClient> = Arc::new(MockGameClient::new().with_character(snapshot(1)));
        let knowledge = Arc::new(Mutex::new(KnowledgeBase::new()));
        let map = Arc::new(Mutex::new(MapCache::new()));
        let mut ai_loop = AIPlayerLoop::new(
            client,
            registry(),
            GoalManager::new(GoalTargets::new()),
            knowledge,
            map,
            "alice",
            AgentConfig::default(),
        );
        ai_loop.stop();
        ai_loop.run().await.unwrap();
    }

    #[tokio::test]
    async fn runs_one_iteration_of_the_level_up_goal_without_panicking() {
        let client: Arc<dyn GameClient> =
            Arc::new(MockGameClient::new().with_character(snapshot(1)));
        let knowledge = Arc::new(Mutex::new(KnowledgeBase::new()));
        let map = Arc::new(Mutex::new(MapCache::new()));
        let stop_after_one = Arc::new(AtomicBool::new(false));
        let mut config = AgentConfig::default();
        config.no_plan_backoff_seconds = 0;
        let mut ai_loop = AIPlayerLoop::new(
            client,
            registry(),
            GoalManager::new(GoalTargets::new()),
            knowledge,
            map,
            "alice",
            config,
        );
        let stop = ai_loop.stop_handle();
        let flag = stop_after_one.clone();
        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            flag.store(true, Ordering::SeqCst);
            stop.store(true, Ordering::SeqCst);
        });
        ai_loop.run().await.unwrap();
    }
}
