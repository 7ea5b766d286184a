//! Maven `settings.xml`: local repository, mirrors, servers, profiles.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;

use pomwright_core::document::Repository;
use pomwright_util::errors::PomwrightError;

use crate::repository::MavenRepository;

/// A `<mirror>`: requests for repositories matched by `mirror_of` go to `url`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Mirror {
    pub id: String,
    pub url: String,
    /// Comma-separated repository ids; `*` and `external:*` match any,
    /// `!id` excludes.
    pub mirror_of: String,
}

impl Mirror {
    pub fn matches(&self, repository_id: &str) -> bool {
        let patterns: Vec<&str> = self.mirror_of.split(',').map(str::trim).collect();
        if patterns
            .iter()
            .any(|p| p.strip_prefix('!') == Some(repository_id))
        {
            return false;
        }
        patterns
            .iter()
            .any(|p| *p == repository_id || *p == "*" || *p == "external:*")
    }
}

/// A `<server>` entry holding credentials for a repository id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Server {
    pub id: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// A settings-level `<profile>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsProfile {
    pub id: String,
    pub active_by_default: bool,
    pub properties: BTreeMap<String, String>,
    pub repositories: Vec<Repository>,
}

/// Parsed `settings.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub local_repository: Option<String>,
    pub mirrors: Vec<Mirror>,
    pub servers: Vec<Server>,
    pub profiles: Vec<SettingsProfile>,
    pub active_profiles: Vec<String>,
}

/// The user's home directory, `.` when unknown.
pub fn home_dir() -> PathBuf {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home)
}

/// `~/.m2/settings.xml`.
pub fn default_settings_path() -> PathBuf {
    home_dir().join(".m2").join("settings.xml")
}

impl Settings {
    /// Load settings from `path`, or return defaults if the file doesn't exist.
    pub fn load(path: &Path) -> miette::Result<Self> {
        if !path.is_file() {
            tracing::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let xml = std::fs::read_to_string(path).map_err(PomwrightError::Io)?;
        parse_settings(&xml)
    }

    /// The local repository root, `~/.m2/repository` unless configured.
    pub fn local_repository(&self) -> PathBuf {
        match self.local_repository.as_deref() {
            Some(p) if p.starts_with("~/") => home_dir().join(&p[2..]),
            Some(p) if !p.trim().is_empty() => PathBuf::from(p),
            _ => home_dir().join(".m2").join("repository"),
        }
    }

    /// Ids of the active settings profiles.
    ///
    /// A non-empty `<activeProfiles>` activates exactly the listed ids;
    /// otherwise profiles marked `activeByDefault` apply.
    pub fn active_profile_ids(&self) -> Vec<String> {
        if !self.active_profiles.is_empty() {
            return self.active_profiles.clone();
        }
        self.profiles
            .iter()
            .filter(|p| p.active_by_default)
            .map(|p| p.id.clone())
            .collect()
    }

    fn active(&self) -> impl Iterator<Item = &SettingsProfile> {
        let ids = self.active_profile_ids();
        self.profiles
            .iter()
            .filter(move |p| ids.iter().any(|id| id == &p.id))
    }

    /// Properties contributed by active profiles; later profiles override earlier.
    pub fn active_properties(&self) -> BTreeMap<String, String> {
        let mut props = BTreeMap::new();
        for profile in self.active() {
            for (k, v) in &profile.properties {
                props.insert(k.clone(), v.clone());
            }
        }
        props
    }

    /// The mirror serving `repository_id`, preferring an exact id match over
    /// wildcard patterns.
    pub fn mirror_for(&self, repository_id: &str) -> Option<&Mirror> {
        self.mirrors
            .iter()
            .find(|m| m.mirror_of.trim() == repository_id)
            .or_else(|| self.mirrors.iter().find(|m| m.matches(repository_id)))
    }

    pub fn server(&self, id: &str) -> Option<&Server> {
        self.servers.iter().find(|s| s.id == id)
    }

    /// The repositories to query, in order: the document's own, then active
    /// settings profiles', then central. Mirrors are applied, duplicates
    /// (by final id) dropped, and server credentials attached.
    pub fn effective_repositories(&self, declared: &[Repository]) -> Vec<MavenRepository> {
        let mut candidates: Vec<MavenRepository> = declared
            .iter()
            .map(MavenRepository::from_repository)
            .collect();
        for profile in self.active() {
            candidates.extend(profile.repositories.iter().map(MavenRepository::from_repository));
        }
        candidates.push(MavenRepository::maven_central());

        let mut result: Vec<MavenRepository> = Vec::new();
        for repo in candidates {
            let repo = match self.mirror_for(&repo.id) {
                Some(mirror) => {
                    tracing::debug!("Repository {} mirrored by {}", repo.id, mirror.id);
                    MavenRepository::new(&mirror.id, &mirror.url)
                }
                None => repo,
            };
            if result.iter().any(|r| r.id == repo.id) {
                continue;
            }
            let repo = match self.server(&repo.id) {
                Some(server) => {
                    repo.with_credentials(server.username.clone(), server.password.clone())
                }
                None => repo,
            };
            result.push(repo);
        }
        result
    }
}

/// Parse a `settings.xml` document.
pub fn parse_settings(xml: &str) -> miette::Result<Settings> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut settings = Settings::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    let mut mirror: Option<Mirror> = None;
    let mut server: Option<Server> = None;
    let mut profile: Option<SettingsProfile> = None;
    let mut repository: Option<Repository> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                text_buf.clear();
                match path.join(">").as_str() {
                    "settings>mirrors>mirror" => mirror = Some(Mirror::default()),
                    "settings>servers>server" => server = Some(Server::default()),
                    "settings>profiles>profile" => profile = Some(SettingsProfile::default()),
                    "settings>profiles>profile>repositories>repository" => {
                        repository = Some(Repository::new("", ""));
                    }
                    _ => {}
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e.unescape().map_err(|err| PomwrightError::Xml {
                    message: format!("Invalid text in settings.xml: {err}"),
                })?;
                text_buf.push_str(&text);
            }
            Ok(Event::End(_)) => {
                let ctx = path.join(">");
                let text = text_buf.trim().to_string();
                match ctx.as_str() {
                    "settings>localRepository" => settings.local_repository = Some(text),
                    "settings>activeProfiles>activeProfile" => settings.active_profiles.push(text),

                    "settings>mirrors>mirror>id" => set(&mut mirror, |m| m.id = text),
                    "settings>mirrors>mirror>url" => set(&mut mirror, |m| m.url = text),
                    "settings>mirrors>mirror>mirrorOf" => set(&mut mirror, |m| m.mirror_of = text),
                    "settings>mirrors>mirror" => settings.mirrors.extend(mirror.take()),

                    "settings>servers>server>id" => set(&mut server, |s| s.id = text),
                    "settings>servers>server>username" => {
                        set(&mut server, |s| s.username = Some(text));
                    }
                    "settings>servers>server>password" => {
                        set(&mut server, |s| s.password = Some(text));
                    }
                    "settings>servers>server" => settings.servers.extend(server.take()),

                    "settings>profiles>profile>id" => set(&mut profile, |p| p.id = text),
                    "settings>profiles>profile>activation>activeByDefault" => {
                        set(&mut profile, |p| p.active_by_default = text == "true");
                    }
                    "settings>profiles>profile>repositories>repository>id" => {
                        set(&mut repository, |r| r.id = text);
                    }
                    "settings>profiles>profile>repositories>repository>url" => {
                        set(&mut repository, |r| r.url = text);
                    }
                    "settings>profiles>profile>repositories>repository" => {
                        if let (Some(p), Some(r)) = (profile.as_mut(), repository.take()) {
                            p.repositories.push(r);
                        }
                    }
                    "settings>profiles>profile" => settings.profiles.extend(profile.take()),
                    _ => {
                        if path.len() == 5
                            && ctx.starts_with("settings>profiles>profile>properties>")
                        {
                            if let (Some(p), Some(name)) = (profile.as_mut(), path.last()) {
                                p.properties.insert(name.clone(), text);
                            }
                        }
                    }
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PomwrightError::Xml {
                    message: format!("Failed to parse settings.xml: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(settings)
}

fn set<T>(slot: &mut Option<T>, f: impl FnOnce(&mut T)) {
    if let Some(value) = slot.as_mut() {
        f(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<settings>
  <localRepository>/opt/m2</localRepository>
  <mirrors>
    <mirror>
      <id>corp</id>
      <url>https://nexus.corp/maven</url>
      <mirrorOf>*,!snapshots</mirrorOf>
    </mirror>
  </mirrors>
  <servers>
    <server>
      <id>corp</id>
      <username>ci</username>
      <password>s3cret</password>
    </server>
  </servers>
  <profiles>
    <profile>
      <id>snapshots</id>
      <activation><activeByDefault>true</activeByDefault></activation>
      <properties><env>ci</env></properties>
      <repositories>
        <repository>
          <id>snapshots</id>
          <url>https://snapshots.corp/maven</url>
        </repository>
      </repositories>
    </profile>
  </profiles>
</settings>"#;

    #[test]
    fn parse_full_settings() {
        let s = parse_settings(SETTINGS).unwrap();
        assert_eq!(s.local_repository(), PathBuf::from("/opt/m2"));
        assert_eq!(s.mirrors.len(), 1);
        assert_eq!(s.servers[0].username.as_deref(), Some("ci"));
        assert_eq!(s.profiles[0].repositories.len(), 1);
        assert_eq!(s.profiles[0].properties.get("env").unwrap(), "ci");
        assert_eq!(s.active_profile_ids(), vec!["snapshots"]);
    }

    #[test]
    fn mirror_patterns() {
        let m = Mirror {
            id: "m".into(),
            url: "u".into(),
            mirror_of: "*,!snapshots".into(),
        };
        assert!(m.matches("central"));
        assert!(!m.matches("snapshots"));
        let ext = Mirror {
            mirror_of: "external:*".into(),
            ..m.clone()
        };
        assert!(ext.matches("anything"));
        let list = Mirror {
            mirror_of: "central, spring".into(),
            ..m
        };
        assert!(list.matches("spring"));
        assert!(!list.matches("jboss"));
    }

    #[test]
    fn effective_repositories_apply_mirrors_and_credentials() {
        let s = parse_settings(SETTINGS).unwrap();
        let repos = s.effective_repositories(&[Repository::new("spring", "https://repo.spring.io")]);
        let ids: Vec<&str> = repos.iter().map(|r| r.id.as_str()).collect();
        // spring and central collapse into the corp mirror; snapshots is excluded from it
        assert_eq!(ids, vec!["corp", "snapshots"]);
        assert_eq!(repos[0].url, "https://nexus.corp/maven");
        assert_eq!(repos[0].password.as_deref(), Some("s3cret"));
        assert!(!repos[1].has_auth());
    }

    #[test]
    fn explicit_active_profiles_win() {
        let mut s = parse_settings(SETTINGS).unwrap();
        s.active_profiles = vec!["other".into()];
        assert_eq!(s.active_profile_ids(), vec!["other"]);
        assert!(s.active_properties().is_empty());
    }

    #[test]
    fn default_local_repository() {
        let s = Settings::default();
        assert!(s.local_repository().ends_with(".m2/repository"));
    }
}
