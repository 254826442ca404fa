//! Binary entry point: parses the CLI (§6.3), wires logging, loads the
//! API token and persisted world state, and dispatches to the character
//! lifecycle and diagnostic operations.

mod cli;

use agent_actions::build_default_registry;
use agent_client::http::HttpGameClient;
use agent_client::GameClient;
use agent_runtime::{AgentConfig, GoalManager, GoalTargets};
use agent_world::{KnowledgeBase, MapCache};
use clap::Parser;
use cli::{Cli, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

fn data_prefix(cli: &Cli) -> PathBuf {
    cli.data_prefix
        .clone()
        .or_else(|| std::env::var("DATA_PREFIX").ok().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn stop_file_path(prefix: &Path, character_name: &str) -> PathBuf {
    prefix.join(format!("{character_name}.stop"))
}

fn read_token(path: &Path) -> anyhow::Result<String> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read token file {}: {e}", path.display()))?;
    let token = raw.lines().next().unwrap_or("").trim().to_string();
    if token.is_empty() {
        anyhow::bail!("token file {} is empty", path.display());
    }
    Ok(token)
}

fn init_logging(level: &str) {
    let level = match level.to_ascii_uppercase().as_str() {
        "DEBUG" => "debug",
        "WARNING" => "warn",
        "ERROR" => "error",
        _ => "info",
    };
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", level);
    }
    env_logger::init();
}

fn open_world(prefix: &Path, config: &AgentConfig) -> anyhow::Result<(KnowledgeBase, MapCache)> {
    let (knowledge_path, map_path) = agent_runtime::loop_::default_paths(prefix);
    let knowledge = KnowledgeBase::load(&knowledge_path)?;
    let map = MapCache::load(&map_path)?.with_ttl(config.map_ttl());
    Ok((knowledge, map))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);
    let prefix = data_prefix(&cli);

    let exit_ok = match run(cli, &prefix).await {
        Ok(()) => true,
        Err(e) => {
            log::error!("{e:#}");
            false
        }
    };

    std::process::exit(if exit_ok { 0 } else { 1 });
}

async fn run(cli: Cli, prefix: &Path) -> anyhow::Result<()> {
    match cli.command {
        Command::RunCharacter { name } => {
            let token = read_token(&cli.token_file)?;
            let client: Arc<dyn GameClient> = Arc::new(HttpGameClient::new(token));
            let config = AgentConfig::load(prefix.join("agent.toml"))?;
            let (knowledge, map) = open_world(prefix, &config)?;
            let registry = build_default_registry();
            let goal_manager = GoalManager::new(GoalTargets::new());

            let stop_file = stop_file_path(prefix, &name);
            if stop_file.exists() {
                std::fs::remove_file(&stop_file)
                    .map_err(|e| anyhow::anyhow!("removing stale stop file {}: {e}", stop_file.display()))?;
            }

            let mut ai_loop = agent_runtime::AIPlayerLoop::new(
                client,
                registry,
                goal_manager,
                Arc::new(Mutex::new(knowledge)),
                Arc::new(Mutex::new(map)),
                name.clone(),
                config,
            )
            .with_stop_file(stop_file);

            let stop = ai_loop.stop_handle();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::info!("received interrupt, stopping {}", "character loop");
                    stop.store(true, std::sync::atomic::Ordering::SeqCst);
                }
            });

            log::info!("starting AIPlayerLoop for {name}");
            ai_loop.run().await
        }

        Command::StopCharacter { name } => {
            let stop_file = stop_file_path(prefix, &name);
            std::fs::write(&stop_file, "")
                .map_err(|e| anyhow::anyhow!("writing stop file {}: {e}", stop_file.display()))?;
            println!("requested stop for {name}");
            Ok(())
        }

        Command::StatusCharacter { name } => {
            let token = read_token(&cli.token_file)?;
            let client = HttpGameClient::new(token);
            let snapshot = client.get_character(&name).await?;
            println!(
                "{name}: level {} at ({}, {}), hp {}/{}, gold {}",
                snapshot.level, snapshot.x, snapshot.y, snapshot.hp, snapshot.max_hp, snapshot.gold
            );

            let goal_manager = GoalManager::new(GoalTargets::new());
            let (goal_name, goal) = goal_manager.next_goal(&snapshot);
            println!("active goal: {goal_name} {}", serde_json::to_string(&goal)?);
            Ok(())
        }

        Command::ListCharacters => {
            let token = read_token(&cli.token_file)?;
            let client = HttpGameClient::new(token);
            for character in client.get_characters().await? {
                println!("{}\tlevel {}\t({}, {})", character.name, character.level, character.x, character.y);
            }
            Ok(())
        }

        Command::CreateCharacter { name, skin } => {
            let token = read_token(&cli.token_file)?;
            admin_create_character(&token, &name, &skin).await
        }

        Command::DeleteCharacter { name } => {
            let token = read_token(&cli.token_file)?;
            admin_delete_character(&token, &name).await
        }

        Command::DiagnoseState { name } => {
            let token = read_token(&cli.token_file)?;
            let client = HttpGameClient::new(token);
            let snapshot = client.get_character(&name).await?;
            let state = agent_runtime::goal_manager::character_full_state(&snapshot);
            println!("{}", serde_json::to_string_pretty(&state)?);
            Ok(())
        }

        Command::DiagnoseActions => {
            let registry = build_default_registry();
            for descriptor in registry.all_actions() {
                println!("{}\tweight={}", descriptor.name(), descriptor.weight());
                println!("  preconditions: {}", serde_json::to_string(descriptor.preconditions())?);
                println!("  effects:       {}", serde_json::to_string(descriptor.effects())?);
            }
            Ok(())
        }

        Command::DiagnosePlan { name, goal } => {
            let token = read_token(&cli.token_file)?;
            let client = HttpGameClient::new(token);
            let snapshot = client.get_character(&name).await?;
            let state = agent_runtime::goal_manager::character_full_state(&snapshot);

            let goal_manager = GoalManager::new(GoalTargets::new());
            let (template_name, goal_state) = goal_manager.next_goal(&snapshot);
            if template_name != goal {
                log::warn!("template {goal} is not the currently-selected goal ({template_name}); planning against it anyway");
            }

            let registry = build_default_registry();
            let planner = agent_planning::GoapPlanner::new(agent_planning::PlannerConfig { max_nodes: AgentConfig::default().max_nodes });
            match planner.plan(&state, &goal_state, &registry.plan_actions()) {
                Some(plan) => {
                    for step in &plan.steps {
                        println!("{}", step.action_name);
                    }
                    println!("estimated_cost={}", plan.estimated_cost);
                }
                None => println!("no plan found"),
            }
            Ok(())
        }

        Command::TestPlanning => {
            let mut start = agent_planning::StateMap::new();
            agent_actions::support::set_path(&mut start, "character_status.level", 1.0.into());
            let mut goal = agent_planning::StateMap::new();
            agent_actions::support::set_path(&mut goal, "character_status.level", ">=2".into());

            let registry = build_default_registry();
            let planner = agent_planning::GoapPlanner::new(agent_planning::PlannerConfig::default());
            match planner.plan(&start, &goal, &registry.plan_actions()) {
                Some(plan) => println!("fixture plan: {} step(s), cost {}", plan.len(), plan.estimated_cost),
                None => println!("fixture plan: none found"),
            }
            Ok(())
        }
    }
}

async fn admin_create_character(token: &str, name: &str, skin: &str) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let response = http
        .post("https://api.artifactsmmo.com/characters/create")
        .bearer_auth(token)
        .json(&serde_json::json!({ "name": name, "skin": skin }))
        .send()
        .await?;
    if !response.status().is_success() {
        anyhow::bail!("create-character failed: {} {}", response.status(), response.text().await.unwrap_or_default());
    }
    println!("created character {name}");
    Ok(())
}

async fn admin_delete_character(token: &str, name: &str) -> anyhow::Result<()> {
    let http = reqwest::Client::new();
    let response = http
        .post("https://api.artifactsmmo.com/characters/delete")
        .bearer_auth(token)
        .json(&serde_json::json!({ "name": name }))
        .send()
        .await?;
    if !response.status().is_success() {
        anyhow::bail!("delete-character failed: {} {}", response.status(), response.text().await.unwrap_or_default());
    }
    println!("deleted character {name}");
    Ok(())
}
