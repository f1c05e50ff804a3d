//! Vaultline playbook runner.
//!
//! Reads one JSON event per stdin line and evaluates the organization's
//! playbooks against it.

#![forbid(unsafe_code)]

use std::env;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use vaultline_application::{PlaybookEngine, TemplateSeeder};
use vaultline_core::{AppError, AppResult, OrgId};
use vaultline_domain::{PlaybookEvent, TriggerKind};
use vaultline_infrastructure::{
    PostgresActivityLogWriter, PostgresPlaybookRepository, PostgresTaskQueue, run_migrations,
};

#[derive(Debug, Clone)]
struct RunnerConfig {
    database_url: String,
    max_connections: u32,
    seed_templates: bool,
    run_migrations: bool,
}

#[derive(Debug, Deserialize)]
struct EventLine {
    org_id: String,
    trigger: TriggerKind,
    #[serde(default)]
    payload: Value,
}

impl EventLine {
    fn into_event(self) -> AppResult<(OrgId, PlaybookEvent)> {
        let org_id = self.org_id.trim().parse::<OrgId>()?;
        Ok((org_id, PlaybookEvent::new(self.trigger, self.payload)))
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = RunnerConfig::load()?;
    let pool = connect_pool(&config).await?;

    if config.run_migrations {
        run_migrations(&pool).await?;
        info!("database migrations applied");
    }

    let engine = build_engine(pool, config.seed_templates);

    info!(
        max_connections = config.max_connections,
        seed_templates = config.seed_templates,
        "vaultline-runner started"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut line_number = 0_u64;
    let mut processed = 0_u64;
    let mut rejected = 0_u64;

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|error| AppError::Internal(format!("failed to read event from stdin: {error}")))?
    {
        line_number = line_number.saturating_add(1);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let parsed = serde_json::from_str::<EventLine>(line)
            .map_err(|error| AppError::Validation(format!("invalid event JSON: {error}")))
            .and_then(EventLine::into_event);

        match parsed {
            Ok((org_id, event)) => {
                engine.run_playbooks_for_event(org_id, event).await;
                processed = processed.saturating_add(1);
            }
            Err(error) => {
                rejected = rejected.saturating_add(1);
                warn!(line = line_number, error = %error, "skipping malformed event line");
            }
        }
    }

    info!(processed, rejected, "stdin closed, vaultline-runner stopping");
    Ok(())
}

async fn connect_pool(config: &RunnerConfig) -> AppResult<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(config.database_url.as_str())
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))
}

fn build_engine(pool: PgPool, seed_templates: bool) -> PlaybookEngine {
    let repository = Arc::new(PostgresPlaybookRepository::new(pool.clone()));
    let engine = PlaybookEngine::new(
        repository.clone(),
        Arc::new(PostgresActivityLogWriter::new(pool.clone())),
        Arc::new(PostgresTaskQueue::new(pool)),
    );

    if seed_templates {
        engine.with_template_seeder(TemplateSeeder::new(repository))
    } else {
        engine
    }
}

impl RunnerConfig {
    fn load() -> AppResult<Self> {
        let database_url = required_env("DATABASE_URL")?;
        let max_connections = parse_env_u32("DATABASE_MAX_CONNECTIONS", 5)?;
        let seed_templates = parse_env_bool("PLAYBOOK_SEED_TEMPLATES", true)?;
        let run_migrations = parse_env_bool("PLAYBOOK_RUN_MIGRATIONS", false)?;

        if max_connections == 0 {
            return Err(AppError::Validation(
                "DATABASE_MAX_CONNECTIONS must be greater than zero".to_owned(),
            ));
        }

        Ok(Self {
            database_url,
            max_connections,
            seed_templates,
            run_migrations,
        })
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> AppResult<String> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("{name} is required")))
}

fn parse_env_u32(name: &str, default: u32) -> AppResult<u32> {
    match env::var(name) {
        Ok(value) => value.trim().parse::<u32>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_env_bool(name: &str, default: bool) -> AppResult<bool> {
    match env::var(name) {
        Ok(value) => parse_bool(value.as_str()).ok_or_else(|| {
            AppError::Validation(format!(
                "invalid {name} value '{value}': expected true or false"
            ))
        }),
        Err(_) => Ok(default),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
