use tracing::{info, warn};

use crate::config::{ContainerConfig, DatabaseConfig};
use crate::error::AppError;
use crate::provision::CommandRunner;

const DOCKER: &str = "docker";
const POSTGRES_PORT: u16 = 5432;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    Missing,
    Stopped,
    Running,
}

/// The single PostgreSQL container backing a development setup.
pub struct DatabaseContainer<'a, R: CommandRunner> {
    runner: &'a R,
    container: &'a ContainerConfig,
    database: &'a DatabaseConfig,
}

impl<'a, R: CommandRunner> DatabaseContainer<'a, R> {
    pub fn new(
        runner: &'a R,
        container: &'a ContainerConfig,
        database: &'a DatabaseConfig,
    ) -> Self {
        Self {
            runner,
            container,
            database,
        }
    }

    pub async fn state(&self) -> Result<ContainerState, AppError> {
        let args = strings(&[
            "ps",
            "-a",
            "--filter",
            &format!("name=^{}$", self.container.name),
            "--format",
            "{{.State}}",
        ]);
        let output = self.runner.run(DOCKER, &args).await?.check("docker ps")?;

        Ok(match output.stdout.lines().next().map(str::trim) {
            None | Some("") => ContainerState::Missing,
            Some("running") => ContainerState::Running,
            Some(_) => ContainerState::Stopped,
        })
    }

    /// Ensures exactly one container with the configured name is running.
    pub async fn start(&self) -> Result<ContainerState, AppError> {
        let name = &self.container.name;
        let state = self.state().await?;
        match state {
            ContainerState::Running => {
                info!("Container {} is already running", name);
            }
            ContainerState::Stopped => {
                info!("Starting existing container {}", name);
                self.runner
                    .run(DOCKER, &strings(&["start", name]))
                    .await?
                    .check("docker start")?;
            }
            ContainerState::Missing => {
                let port = self.container.published_port(self.database);
                if port != self.database.port {
                    warn!(
                        "Publishing port {} but database.port is {}",
                        port, self.database.port
                    );
                }
                info!(
                    "Creating container {} from {} on port {}",
                    name, self.container.image, port
                );
                self.runner
                    .run(DOCKER, &self.run_args(port))
                    .await?
                    .check("docker run")?;
            }
        }
        Ok(state)
    }

    /// Stops and removes the container; a missing container is not an error.
    pub async fn clean(&self) -> Result<(), AppError> {
        let name = &self.container.name;
        if self.state().await? == ContainerState::Missing {
            info!("Container {} does not exist, nothing to clean", name);
            return Ok(());
        }

        self.runner
            .run(DOCKER, &strings(&["stop", name]))
            .await?
            .check("docker stop")?;
        self.runner
            .run(DOCKER, &strings(&["rm", name]))
            .await?
            .check("docker rm")?;
        info!("Container {} removed", name);
        Ok(())
    }

    fn run_args(&self, port: u16) -> Vec<String> {
        strings(&[
            "run",
            "-d",
            "--name",
            &self.container.name,
            "-e",
            &format!("POSTGRES_USER={}", self.database.user),
            "-e",
            &format!("POSTGRES_PASSWORD={}", self.database.password),
            "-e",
            &format!("POSTGRES_DB={}", self.database.name),
            "-p",
            &format!("{port}:{POSTGRES_PORT}"),
            &self.container.image,
        ])
    }
}

fn strings(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}
