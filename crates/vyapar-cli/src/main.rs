use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use vyapar::daemon::{DaemonCore, InMemoryTaskStore, TaskState, TaskStore};
use vyapar::{
    default_registry, ArtifactWriter, AutomationRequest, Orchestrator, PlatformConfig,
    PlatformMetrics,
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = load_config()?;

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("run") => {
            let description: String = args.collect::<Vec<_>>().join(" ");
            if description.is_empty() {
                bail!("Usage: vyapar run <description>");
            }
            run_once(&config, &description).await
        }
        Some("serve") => serve(&config).await,
        _ => bail!("Usage: vyapar run <description> | vyapar serve"),
    }
}

fn load_config() -> Result<PlatformConfig> {
    match std::env::var("VYAPAR_CONFIG") {
        Ok(path) => PlatformConfig::from_file(std::path::Path::new(&path))
            .with_context(|| format!("failed to load config from {path}")),
        Err(_) => Ok(PlatformConfig::default()),
    }
}

fn build_orchestrator(config: &PlatformConfig) -> Result<(Arc<Orchestrator>, Arc<PlatformMetrics>)> {
    let writer = Arc::new(
        ArtifactWriter::new(&config.output.directory)
            .context("failed to create output directory")?,
    );
    let registry = default_registry(Some(writer)).context("failed to build agent registry")?;
    let metrics = Arc::new(PlatformMetrics::new().context("failed to create metrics")?);
    let orchestrator = Arc::new(
        Orchestrator::new(registry, config.orchestrator.clone()).with_metrics(metrics.clone()),
    );
    Ok((orchestrator, metrics))
}

/// One-shot mode: process a single request and print the envelope.
async fn run_once(config: &PlatformConfig, description: &str) -> Result<()> {
    let (orchestrator, _metrics) = build_orchestrator(config)?;

    let request = AutomationRequest::from_description(description);
    let envelope = orchestrator.process(&request).await;

    println!("{}", serde_json::to_string_pretty(&envelope)?);

    let status = orchestrator.status();
    eprintln!(
        "\n---\nRequests: {} total / {} ok / {} failed | Agents: {}",
        status.requests_total,
        status.requests_succeeded,
        status.requests_failed,
        status.agents.len(),
    );
    Ok(())
}

/// Daemon mode: queue one task per stdin line, drain on EOF or Ctrl-C.
async fn serve(config: &PlatformConfig) -> Result<()> {
    use tokio::io::AsyncBufReadExt;

    let (orchestrator, _metrics) = build_orchestrator(config)?;
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
    let cancel = CancellationToken::new();

    let (core, handle) = DaemonCore::new(&config.daemon, orchestrator, store.clone(), cancel.clone());
    let worker = tokio::spawn(core.run());

    tracing::info!(
        max_concurrent_tasks = config.daemon.max_concurrent_tasks,
        "daemon started; one request per line on stdin"
    );

    let mut submitted = Vec::new();
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupt received, shutting down");
                break;
            }
            line = lines.next_line() => {
                match line? {
                    Some(line) if !line.trim().is_empty() => {
                        let request = AutomationRequest::from_description(line.trim());
                        let id = handle.submit(request, "stdin")?;
                        submitted.push(id);
                        tracing::info!(task_id = %id, "task queued");
                    }
                    Some(_) => {}
                    None => break, // stdin closed
                }
            }
        }
    }

    // Wait for queued tasks to reach a terminal state, then stop the worker.
    for id in &submitted {
        loop {
            match store.get(*id)? {
                Some(task)
                    if !matches!(task.state, TaskState::Pending | TaskState::Running) =>
                {
                    if let Some(envelope) = task.result {
                        println!("{}", serde_json::to_string_pretty(&envelope)?);
                    }
                    break;
                }
                _ => tokio::time::sleep(std::time::Duration::from_millis(50)).await,
            }
        }
    }

    cancel.cancel();
    worker.await?.context("daemon worker failed")?;

    let (tasks, total) = handle.list_tasks(100, 0)?;
    let completed = tasks
        .iter()
        .filter(|t| t.state == TaskState::Completed)
        .count();
    eprintln!("\n---\nTasks: {total} total / {completed} completed");
    Ok(())
}
