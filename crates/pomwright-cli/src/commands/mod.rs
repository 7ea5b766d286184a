//! Command dispatch and handler modules.

mod effective;
mod run;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use miette::Result;

use pomwright_core::config::EngineConfig;
use pomwright_core::document::Document;
use pomwright_maven::cache::{LocalRepository, SessionCache};
use pomwright_maven::download;
use pomwright_maven::settings::{self, Settings};
use pomwright_maven::source::{CachedSource, RemoteSource};
use pomwright_resolver::context::ResolutionContext;
use pomwright_util::errors::PomwrightError;

use crate::cli::{Cli, Command};

/// Route a parsed CLI invocation to the appropriate command handler.
pub fn dispatch(cli: Cli) -> Result<()> {
    let options = SessionOptions {
        config: cli.config,
        offline: cli.offline,
    };
    match cli.command {
        Command::Run {
            recipes,
            max_cycles,
            dry_run,
            json,
            poms,
        } => run::exec(
            &options,
            &run::RunOptions {
                recipes,
                max_cycles,
                dry_run,
                json,
                poms,
            },
        ),
        Command::Effective { pom, json } => effective::exec(&options, &pom, json),
    }
}

/// Global flags shared by every command.
pub(crate) struct SessionOptions {
    pub config: Option<PathBuf>,
    pub offline: bool,
}

/// Configuration plus the run-scoped resolution context.
pub(crate) struct Session {
    pub config: EngineConfig,
    pub resolution: ResolutionContext,
}

impl SessionOptions {
    fn config_path(&self) -> Result<PathBuf> {
        match self.config {
            Some(ref path) => Ok(path.clone()),
            None => {
                let cwd = std::env::current_dir().map_err(PomwrightError::Io)?;
                Ok(EngineConfig::default_path(&cwd))
            }
        }
    }

    /// Load configuration and settings and build an artifact source over
    /// the repositories the documents and settings declare.
    pub fn open(&self, documents: &[Document]) -> Result<Session> {
        let mut config = EngineConfig::load(&self.config_path()?)?;
        let settings_path = config
            .settings
            .as_deref()
            .map(PathBuf::from)
            .unwrap_or_else(settings::default_settings_path);
        let settings = Settings::load(&settings_path)?;

        for (name, value) in settings.active_properties() {
            config.user_properties.entry(name).or_insert(value);
        }

        let repositories = if self.offline {
            Vec::new()
        } else {
            let mut declared = Vec::new();
            for doc in documents {
                for repo in &doc.repositories {
                    if !declared.iter().any(|r: &pomwright_core::document::Repository| r.id == repo.id) {
                        declared.push(repo.clone());
                    }
                }
            }
            settings.effective_repositories(&declared)
        };
        tracing::debug!(
            "Repositories: {}",
            repositories
                .iter()
                .map(|r| r.id.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let remote = RemoteSource::new(download::build_client()?, repositories)
            .with_local(LocalRepository::new(settings.local_repository()));
        let source = CachedSource::new(remote, Arc::new(SessionCache::new()));
        let resolution = ResolutionContext::from_config(&config, Arc::new(source))
            .with_activation(config.activation_context(&settings.active_profile_ids()));

        Ok(Session { config, resolution })
    }
}

/// Read a POM, keeping the path as given as its identity.
pub(crate) fn read_document(path: &Path) -> Result<Document> {
    if !path.is_file() {
        return Err(PomwrightError::Generic {
            message: format!("Could not find {}", path.display()),
        }
        .into());
    }
    pomwright_maven::pom::read_pom(path)
}
