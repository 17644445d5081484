//! Container lifecycle management: start, stop, health checks.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use tokio::net::TcpStream;
use tokio::time::{sleep, timeout};
use tracing::{debug, info};

use crate::config::{DbVersion, TestDbConfig};

const CONTAINER_STARTUP_TIMEOUT: Duration = Duration::from_secs(90);

const HEALTH_CHECK_INTERVAL: Duration = Duration::from_millis(500);

/// Get the path to the docker-compose.yml file.
pub fn docker_compose_path() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest_dir)
        .join("docker")
        .join("docker-compose.yml")
}

/// Check if Docker is available on the system.
pub fn is_docker_available() -> bool {
    Command::new("docker")
        .arg("info")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn docker_compose_cmd(args: &[&str]) -> Result<std::process::Output> {
    Command::new("docker")
        .args(["compose", "-f"])
        .arg(docker_compose_path())
        .args(args)
        .output()
        .context("Failed to run docker compose")
}

/// Check if the container for `version` is running.
pub fn is_container_running(version: DbVersion) -> bool {
    match docker_compose_cmd(&["ps", "-q", version.service_name()]) {
        Ok(out) => !out.stdout.is_empty(),
        Err(_) => false,
    }
}

pub fn start_container(version: DbVersion) -> Result<()> {
    let service = version.service_name();
    info!("Starting container: {}", service);

    let output = docker_compose_cmd(&["up", "-d", service])?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Failed to start container {}: {}", service, stderr);
    }
    Ok(())
}

/// Stop all test containers and drop their volumes.
pub fn stop_all_containers() -> Result<()> {
    info!("Stopping all test containers");

    let output = docker_compose_cmd(&["down", "-v"])?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Failed to stop containers: {}", stderr);
    }
    Ok(())
}

async fn check_port(host: &str, port: u16) -> bool {
    TcpStream::connect((host, port)).await.is_ok()
}

/// Wait until the server for `version` answers queries.
pub async fn wait_for_healthy(version: DbVersion) -> Result<()> {
    let port = version.port();
    let service = version.service_name();
    info!("Waiting for {} to be healthy on port {}", service, port);

    let start = std::time::Instant::now();
    loop {
        if check_port("127.0.0.1", port).await && check_server_ready(version).await {
            debug!("{} is healthy after {:?}", service, start.elapsed());
            return Ok(());
        }

        if start.elapsed() > CONTAINER_STARTUP_TIMEOUT {
            bail!(
                "Timeout waiting for {} to be healthy after {:?}",
                service,
                CONTAINER_STARTUP_TIMEOUT
            );
        }
        sleep(HEALTH_CHECK_INTERVAL).await;
    }
}

/// A non-strict connect succeeds only once the server accepts logins.
async fn check_server_ready(version: DbVersion) -> bool {
    let location = std::env::temp_dir();
    let settings = TestDbConfig::new(version).settings(&location);
    match timeout(
        Duration::from_secs(5),
        lookout_db::connect(&settings, false),
    )
    .await
    {
        Ok(Ok(db)) => {
            db.close().await;
            true
        }
        _ => false,
    }
}

/// Start the container if needed and wait until it is healthy.
pub async fn ensure_container_running(version: DbVersion) -> Result<()> {
    if !is_docker_available() {
        bail!("Docker is not available. Please install Docker to run these tests.");
    }
    if !is_container_running(version) {
        start_container(version)?;
    }
    wait_for_healthy(version).await
}
