//! maven-metadata.xml parsing for version discovery.

use quick_xml::events::Event;
use quick_xml::Reader;

use pomwright_util::errors::PomwrightError;

/// Artifact-level Maven metadata listing available versions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MavenMetadata {
    pub group_id: Option<String>,
    pub artifact_id: Option<String>,
    pub latest: Option<String>,
    pub release: Option<String>,
    /// Versions in the order the repository lists them.
    pub versions: Vec<String>,
    pub last_updated: Option<String>,
}

impl MavenMetadata {
    /// Merge another repository's listing into this one, keeping first-seen order.
    pub fn merge(&mut self, other: MavenMetadata) {
        for v in other.versions {
            if !self.versions.contains(&v) {
                self.versions.push(v);
            }
        }
        if self.release.is_none() {
            self.release = other.release;
        }
        if self.latest.is_none() {
            self.latest = other.latest;
        }
    }
}

/// Parse an artifact-level `maven-metadata.xml` that lists available versions.
pub fn parse_metadata(xml: &str) -> miette::Result<MavenMetadata> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut meta = MavenMetadata::default();
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.name().as_ref()).to_string());
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                text_buf = e
                    .unescape()
                    .map_err(|err| PomwrightError::Xml {
                        message: format!("Invalid text in maven-metadata.xml: {err}"),
                    })?
                    .to_string();
            }
            Ok(Event::End(_)) => {
                match path.join(">").as_str() {
                    "metadata>groupId" => meta.group_id = Some(text_buf.clone()),
                    "metadata>artifactId" => meta.artifact_id = Some(text_buf.clone()),
                    "metadata>versioning>latest" => meta.latest = Some(text_buf.clone()),
                    "metadata>versioning>release" => meta.release = Some(text_buf.clone()),
                    "metadata>versioning>lastUpdated" => {
                        meta.last_updated = Some(text_buf.clone());
                    }
                    "metadata>versioning>versions>version" => {
                        meta.versions.push(text_buf.trim().to_string());
                    }
                    _ => {}
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PomwrightError::Xml {
                    message: format!("Failed to parse maven-metadata.xml: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    Ok(meta)
}
