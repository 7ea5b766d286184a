//! POM reading and writing.
//!
//! The reader walks the XML with a path context (`project>dependencies>dependency`)
//! and fills a [`Document`]; `<profiles>` content is routed into the current
//! [`Profile`] by re-rooting its path at `project`. The writer emits a
//! canonical POM: fixed section order, dependency children in
//! `groupId, artifactId, version, classifier, type, scope, optional, exclusions`
//! order, and indentation computed from element depth. Elements the model
//! does not cover are carried as XML text and written back in their
//! section; comments between modeled elements and original formatting are
//! not preserved.

use std::path::Path;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use pomwright_core::dependency::{
    Dependency, Exclusion, ManagedDependency, Plugin, Scope, DEFAULT_PLUGIN_GROUP,
};
use pomwright_core::document::{Document, ParentRef, Repository};
use pomwright_core::profile::{Profile, PropertyActivation};
use pomwright_util::errors::PomwrightError;

const DEPENDENCY: &str = "project>dependencies>dependency";
const MANAGED_DEPENDENCY: &str = "project>dependencyManagement>dependencies>dependency";
const PLUGIN: &str = "project>build>plugins>plugin";
const MANAGED_PLUGIN: &str = "project>build>pluginManagement>plugins>plugin";
const REPOSITORY: &str = "project>repositories>repository";

/// Read and parse a POM file. The document id is the path as given.
pub fn read_pom(path: &Path) -> miette::Result<Document> {
    let xml = std::fs::read_to_string(path).map_err(PomwrightError::Io)?;
    let mut doc = parse_pom(&xml, &path.display().to_string())?;
    doc.source_path = Some(path.to_path_buf());
    Ok(doc)
}

/// Parse POM XML into a [`Document`] with the given id.
///
/// Elements the model has no field for are kept verbatim in the nearest
/// enclosing `extra_xml` list.
pub fn parse_pom(xml: &str, id: &str) -> miette::Result<Document> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut state = PomReader::new(id);
    let mut path: Vec<String> = Vec::new();
    let mut text_buf = String::new();
    let mut capture: Option<Capture> = None;

    loop {
        let before = reader.buffer_position() as usize;
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                text_buf.clear();
                if capture.is_some() {
                    continue;
                }
                match unmodeled_slot(&path) {
                    Some(slot) => {
                        capture = Some(Capture {
                            slot,
                            start: before,
                            depth: path.len(),
                        })
                    }
                    None => state.open(&path)?,
                }
            }
            Ok(Event::Empty(ref e)) => {
                path.push(String::from_utf8_lossy(e.local_name().as_ref()).to_string());
                if capture.is_none() {
                    match unmodeled_slot(&path) {
                        Some(slot) => {
                            let end = reader.buffer_position() as usize;
                            state.keep(slot, fragment(xml, before, end));
                        }
                        None => {
                            state.open(&path)?;
                            state.close(&path, "");
                        }
                    }
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Text(ref e)) => {
                if capture.is_some() {
                    continue;
                }
                let text = e.unescape().map_err(|err| PomwrightError::Xml {
                    message: format!("Invalid text in {id}: {err}"),
                })?;
                text_buf.push_str(&text);
            }
            Ok(Event::CData(ref e)) => {
                if capture.is_none() {
                    text_buf.push_str(&String::from_utf8_lossy(e));
                }
            }
            Ok(Event::End(_)) => {
                match capture.take() {
                    Some(open) if open.depth == path.len() => {
                        let end = reader.buffer_position() as usize;
                        state.keep(open.slot, fragment(xml, open.start, end));
                    }
                    Some(open) => capture = Some(open),
                    None => state.close(&path, text_buf.trim()),
                }
                path.pop();
                text_buf.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(PomwrightError::Xml {
                    message: format!("Failed to parse POM XML in {id}: {e}"),
                }
                .into());
            }
            _ => {}
        }
    }

    state.finish()
}

/// Where an unmodeled element is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Project,
    Build,
    Plugin,
    Dependency,
    Profile,
    Activation,
}

/// An unmodeled element being skipped; `start` is the byte offset before
/// its start tag.
struct Capture {
    slot: Slot,
    start: usize,
    depth: usize,
}

const PROJECT_CHILDREN: &[&str] = &[
    "modelVersion",
    "parent",
    "groupId",
    "artifactId",
    "version",
    "packaging",
    "modules",
    "properties",
    "dependencyManagement",
    "dependencies",
    "repositories",
    "build",
    "profiles",
];
const PROFILE_CHILDREN: &[&str] = &[
    "id",
    "activation",
    "properties",
    "dependencyManagement",
    "dependencies",
    "repositories",
];
const DEPENDENCY_CHILDREN: &[&str] = &[
    "groupId",
    "artifactId",
    "version",
    "type",
    "classifier",
    "scope",
    "optional",
    "exclusions",
];

/// The slot for the element at `path` when the model has no field for it.
fn unmodeled_slot(path: &[String]) -> Option<Slot> {
    let tag = path.last()?.as_str();
    let (in_profile, rel) = relative_context(path);
    let parent = rel.rsplit_once('>').map(|(parent, _)| parent)?;

    if parent == DEPENDENCY || parent == MANAGED_DEPENDENCY {
        return (!DEPENDENCY_CHILDREN.contains(&tag)).then_some(Slot::Dependency);
    }
    match (in_profile, parent) {
        (false, "project") => (!PROJECT_CHILDREN.contains(&tag)).then_some(Slot::Project),
        (true, "project") => (!PROFILE_CHILDREN.contains(&tag)).then_some(Slot::Profile),
        (true, "project>activation") => {
            (!matches!(tag, "activeByDefault" | "property")).then_some(Slot::Activation)
        }
        (false, "project>build") => {
            (!matches!(tag, "plugins" | "pluginManagement")).then_some(Slot::Build)
        }
        (false, PLUGIN | MANAGED_PLUGIN) => {
            (!matches!(tag, "groupId" | "artifactId" | "version")).then_some(Slot::Plugin)
        }
        _ => None,
    }
}

/// The source text of one element, re-indented relative to its first line.
fn fragment(xml: &str, start: usize, end: usize) -> String {
    let raw = xml.get(start..end).unwrap_or_default().trim();
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or_default().to_string();
    let rest: Vec<&str> = lines.collect();
    let common = rest
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    std::iter::once(first)
        .chain(rest.iter().map(|l| l.get(common..).unwrap_or(l.trim_start()).trim_end().to_string()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Accumulators for the element currently being read.
struct PomReader {
    doc: Document,
    saw_project: bool,
    profile: Option<Profile>,
    dependency: Option<Dependency>,
    exclusion: Option<Exclusion>,
    parent: Option<ParentRef>,
    plugin: Option<Plugin>,
    repository: Option<Repository>,
    property_activation: Option<PropertyActivation>,
}

impl PomReader {
    fn new(id: &str) -> Self {
        Self {
            doc: Document::new(id, ""),
            saw_project: false,
            profile: None,
            dependency: None,
            exclusion: None,
            parent: None,
            plugin: None,
            repository: None,
            property_activation: None,
        }
    }

    fn open(&mut self, path: &[String]) -> miette::Result<()> {
        if path.len() == 1 {
            if path[0] != "project" {
                return Err(PomwrightError::Xml {
                    message: format!(
                        "{}: expected <project> root element, found <{}>",
                        self.doc.id, path[0]
                    ),
                }
                .into());
            }
            self.saw_project = true;
            return Ok(());
        }

        let (in_profile, rel) = relative_context(path);
        if in_profile && rel == "project" {
            self.profile = Some(Profile::new(""));
            return Ok(());
        }
        match rel.as_str() {
            DEPENDENCY | MANAGED_DEPENDENCY => {
                self.dependency = Some(Dependency::new("", ""));
            }
            "project>parent" if !in_profile => {
                self.parent = Some(ParentRef::new("", "", ""));
            }
            PLUGIN | MANAGED_PLUGIN if !in_profile => {
                self.plugin = Some(Plugin::new(DEFAULT_PLUGIN_GROUP, ""));
            }
            REPOSITORY => {
                self.repository = Some(Repository::new("", ""));
            }
            "project>activation>property" if in_profile => {
                self.property_activation = Some(PropertyActivation {
                    name: String::new(),
                    value: None,
                });
            }
            _ if rel.ends_with(">exclusions>exclusion") && self.dependency.is_some() => {
                self.exclusion = Some(Exclusion::new("", ""));
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, path: &[String], text: &str) {
        let (in_profile, rel) = relative_context(path);
        let parts: Vec<&str> = rel.split('>').collect();

        if let Some(field) = rel
            .strip_prefix("project>dependencies>dependency>")
            .or_else(|| rel.strip_prefix("project>dependencyManagement>dependencies>dependency>"))
        {
            self.dependency_field(field, text);
            return;
        }

        match rel.as_str() {
            DEPENDENCY => {
                if let Some(dep) = self.dependency.take() {
                    self.sections(in_profile).dependencies.push(dep);
                }
                return;
            }
            MANAGED_DEPENDENCY => {
                if let Some(dep) = self.dependency.take() {
                    self.sections(in_profile)
                        .dependency_management
                        .push(into_managed(dep));
                }
                return;
            }
            _ => {}
        }

        if !in_profile {
            if rel == "project>parent" {
                self.doc.parent = self.parent.take();
                return;
            }
            if let Some(ref mut parent) = self.parent {
                match rel.as_str() {
                    "project>parent>groupId" => parent.group_id = text.to_string(),
                    "project>parent>artifactId" => parent.artifact_id = text.to_string(),
                    "project>parent>version" => parent.version = text.to_string(),
                    "project>parent>relativePath" => {
                        parent.relative_path = Some(text.to_string());
                    }
                    _ => {}
                }
                return;
            }

            if let Some(field) = rel
                .strip_prefix("project>build>plugins>plugin>")
                .or_else(|| rel.strip_prefix("project>build>pluginManagement>plugins>plugin>"))
            {
                if let Some(ref mut plugin) = self.plugin {
                    match field {
                        "groupId" => plugin.group_id = text.to_string(),
                        "artifactId" => plugin.artifact_id = text.to_string(),
                        "version" => plugin.version = Some(text.to_string()),
                        _ => {}
                    }
                }
                return;
            }
            match rel.as_str() {
                PLUGIN => {
                    if let Some(plugin) = self.plugin.take() {
                        self.doc.plugins.push(plugin);
                    }
                    return;
                }
                MANAGED_PLUGIN => {
                    if let Some(plugin) = self.plugin.take() {
                        self.doc.plugin_management.push(plugin);
                    }
                    return;
                }
                "project>modules>module" => {
                    self.doc.modules.push(text.to_string());
                    return;
                }
                _ => {}
            }
        }

        if let Some(field) = rel.strip_prefix("project>repositories>repository>") {
            if let Some(ref mut repo) = self.repository {
                match field {
                    "id" => repo.id = text.to_string(),
                    "url" => repo.url = text.to_string(),
                    "name" => repo.name = Some(text.to_string()),
                    _ => {}
                }
            }
            return;
        }
        if rel == REPOSITORY {
            if let Some(repo) = self.repository.take() {
                self.sections(in_profile).repositories.push(repo);
            }
            return;
        }

        // <properties><key>value</key></properties>
        if parts.len() == 3 && parts[1] == "properties" {
            self.sections(in_profile)
                .properties
                .insert(parts[2].to_string(), text.to_string());
            return;
        }

        if in_profile {
            self.profile_field(&rel, text);
            return;
        }

        if parts.len() == 2 {
            match parts[1] {
                "groupId" => self.doc.group_id = Some(text.to_string()),
                "artifactId" => self.doc.artifact_id = text.to_string(),
                "version" => self.doc.version = Some(text.to_string()),
                "packaging" => self.doc.packaging = Some(text.to_string()),
                _ => {}
            }
        }
    }

    fn dependency_field(&mut self, field: &str, text: &str) {
        let Some(ref mut dep) = self.dependency else {
            return;
        };
        match field {
            "groupId" => dep.group_id = text.to_string(),
            "artifactId" => dep.artifact_id = text.to_string(),
            "version" => dep.version = Some(text.to_string()),
            "type" => dep.type_ = Some(text.to_string()),
            "classifier" => dep.classifier = Some(text.to_string()),
            "optional" => dep.optional = text == "true",
            "scope" => match text.parse::<Scope>() {
                Ok(scope) => dep.scope = Some(scope),
                Err(e) => tracing::warn!("{}: {e}; scope ignored for {dep}", self.doc.id),
            },
            "exclusions>exclusion>groupId" => {
                if let Some(ref mut excl) = self.exclusion {
                    excl.group_id = text.to_string();
                }
            }
            "exclusions>exclusion>artifactId" => {
                if let Some(ref mut excl) = self.exclusion {
                    excl.artifact_id = text.to_string();
                }
            }
            "exclusions>exclusion" => {
                if let Some(mut excl) = self.exclusion.take() {
                    if excl.artifact_id.is_empty() {
                        excl.artifact_id = "*".to_string();
                    }
                    dep.exclusions.push(excl);
                }
            }
            _ => {}
        }
    }

    fn profile_field(&mut self, rel: &str, text: &str) {
        match rel {
            "project>activation>property>name" => {
                if let Some(ref mut prop) = self.property_activation {
                    prop.name = text.to_string();
                }
            }
            "project>activation>property>value" => {
                if let Some(ref mut prop) = self.property_activation {
                    prop.value = Some(text.to_string());
                }
            }
            "project>activation>property" => {
                if let Some(ref mut profile) = self.profile {
                    profile.activation.property = self.property_activation.take();
                }
            }
            "project>activation>activeByDefault" => {
                if let Some(ref mut profile) = self.profile {
                    profile.activation.active_by_default = text == "true";
                }
            }
            "project>id" => {
                if let Some(ref mut profile) = self.profile {
                    profile.id = text.to_string();
                }
            }
            "project" => {
                if let Some(profile) = self.profile.take() {
                    self.doc.profiles.push(profile);
                }
            }
            _ => {}
        }
    }

    fn keep(&mut self, slot: Slot, xml: String) {
        let target = match slot {
            Slot::Project => Some(&mut self.doc.extra_xml),
            Slot::Build => Some(&mut self.doc.build_extra_xml),
            Slot::Plugin => self.plugin.as_mut().map(|p| &mut p.extra_xml),
            Slot::Dependency => self.dependency.as_mut().map(|d| &mut d.extra_xml),
            Slot::Profile => self.profile.as_mut().map(|p| &mut p.extra_xml),
            Slot::Activation => self.profile.as_mut().map(|p| &mut p.activation.extra_xml),
        };
        match target {
            Some(list) => list.push(xml),
            None => tracing::debug!("{}: dropping unplaced element {xml}", self.doc.id),
        }
    }

    fn sections(&mut self, in_profile: bool) -> Sections<'_> {
        match (in_profile, self.profile.as_mut()) {
            (true, Some(p)) => Sections {
                properties: &mut p.properties,
                dependencies: &mut p.dependencies,
                dependency_management: &mut p.dependency_management,
                repositories: &mut p.repositories,
            },
            _ => Sections {
                properties: &mut self.doc.properties,
                dependencies: &mut self.doc.dependencies,
                dependency_management: &mut self.doc.dependency_management,
                repositories: &mut self.doc.repositories,
            },
        }
    }

    fn finish(self) -> miette::Result<Document> {
        if !self.saw_project {
            return Err(PomwrightError::Xml {
                message: format!("{}: no <project> element", self.doc.id),
            }
            .into());
        }
        if self.doc.artifact_id.trim().is_empty() {
            return Err(PomwrightError::MalformedCoordinates {
                document: self.doc.id.to_string(),
                message: "artifactId is missing".to_string(),
            }
            .into());
        }
        Ok(self.doc)
    }
}

/// The parts of a document that a profile can overlay.
struct Sections<'a> {
    properties: &'a mut std::collections::BTreeMap<String, String>,
    dependencies: &'a mut Vec<Dependency>,
    dependency_management: &'a mut Vec<ManagedDependency>,
    repositories: &'a mut Vec<Repository>,
}

/// Path context with `project>profiles>profile` re-rooted at `project`.
fn relative_context(path: &[String]) -> (bool, String) {
    if path.len() >= 3 && path[1] == "profiles" && path[2] == "profile" {
        let mut rel = vec!["project"];
        rel.extend(path[3..].iter().map(String::as_str));
        (true, rel.join(">"))
    } else {
        (false, path.join(">"))
    }
}

fn into_managed(dep: Dependency) -> ManagedDependency {
    ManagedDependency {
        group_id: dep.group_id,
        artifact_id: dep.artifact_id,
        version: dep.version,
        scope: dep.scope,
        type_: dep.type_,
        classifier: dep.classifier,
        exclusions: dep.exclusions,
        extra_xml: dep.extra_xml,
    }
}

const INDENT: &str = "    ";

/// Leading whitespace for an element at `depth` (the `<project>` children are depth 1).
pub fn indent(depth: usize) -> String {
    INDENT.repeat(depth)
}

/// Serialize a document as a canonical POM.
pub fn write_pom(doc: &Document) -> String {
    let mut w = PomWriter::default();
    w.raw("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    w.raw(
        "<project xmlns=\"http://maven.apache.org/POM/4.0.0\" \
         xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
         xsi:schemaLocation=\"http://maven.apache.org/POM/4.0.0 \
         https://maven.apache.org/xsd/maven-4.0.0.xsd\">\n",
    );
    w.leaf(1, "modelVersion", "4.0.0");

    if let Some(ref parent) = doc.parent {
        w.open(1, "parent");
        w.leaf(2, "groupId", &parent.group_id);
        w.leaf(2, "artifactId", &parent.artifact_id);
        w.leaf(2, "version", &parent.version);
        match parent.relative_path.as_deref() {
            Some("") => w.empty(2, "relativePath"),
            Some(rel) => w.leaf(2, "relativePath", rel),
            None => {}
        }
        w.close(1, "parent");
    }

    w.opt_leaf(1, "groupId", doc.group_id.as_deref());
    w.leaf(1, "artifactId", &doc.artifact_id);
    w.opt_leaf(1, "version", doc.version.as_deref());
    w.opt_leaf(1, "packaging", doc.packaging.as_deref());
    w.fragments(1, &doc.extra_xml);

    if !doc.modules.is_empty() {
        w.open(1, "modules");
        for module in &doc.modules {
            w.leaf(2, "module", module);
        }
        w.close(1, "modules");
    }

    w.properties(1, &doc.properties);
    w.dependency_management(1, &doc.dependency_management);
    w.dependencies(1, &doc.dependencies);
    w.repositories(1, &doc.repositories);

    if !doc.plugins.is_empty() || !doc.plugin_management.is_empty() || !doc.build_extra_xml.is_empty() {
        w.open(1, "build");
        w.fragments(2, &doc.build_extra_xml);
        if !doc.plugin_management.is_empty() {
            w.open(2, "pluginManagement");
            w.plugins(3, &doc.plugin_management);
            w.close(2, "pluginManagement");
        }
        w.plugins(2, &doc.plugins);
        w.close(1, "build");
    }

    if !doc.profiles.is_empty() {
        w.open(1, "profiles");
        for profile in &doc.profiles {
            w.profile(2, profile);
        }
        w.close(1, "profiles");
    }

    w.raw("</project>\n");
    w.buf
}

#[derive(Default)]
struct PomWriter {
    buf: String,
}

impl PomWriter {
    fn raw(&mut self, s: &str) {
        self.buf.push_str(s);
    }

    fn open(&mut self, depth: usize, tag: &str) {
        self.buf.push_str(&format!("{}<{tag}>\n", indent(depth)));
    }

    fn close(&mut self, depth: usize, tag: &str) {
        self.buf.push_str(&format!("{}</{tag}>\n", indent(depth)));
    }

    fn empty(&mut self, depth: usize, tag: &str) {
        self.buf.push_str(&format!("{}<{tag}/>\n", indent(depth)));
    }

    fn leaf(&mut self, depth: usize, tag: &str, value: &str) {
        self.buf
            .push_str(&format!("{}<{tag}>{}</{tag}>\n", indent(depth), escape(value)));
    }

    fn opt_leaf(&mut self, depth: usize, tag: &str, value: Option<&str>) {
        if let Some(v) = value {
            self.leaf(depth, tag, v);
        }
    }

    /// Kept XML text, each line shifted to `depth`.
    fn fragments(&mut self, depth: usize, fragments: &[String]) {
        for fragment in fragments {
            for line in fragment.lines() {
                if line.trim().is_empty() {
                    self.buf.push('\n');
                } else {
                    self.buf.push_str(&format!("{}{line}\n", indent(depth)));
                }
            }
        }
    }

    fn properties(&mut self, depth: usize, props: &std::collections::BTreeMap<String, String>) {
        if props.is_empty() {
            return;
        }
        self.open(depth, "properties");
        for (k, v) in props {
            self.leaf(depth + 1, k, v);
        }
        self.close(depth, "properties");
    }

    fn dependencies(&mut self, depth: usize, deps: &[Dependency]) {
        if deps.is_empty() {
            return;
        }
        self.open(depth, "dependencies");
        for dep in deps {
            let d = depth + 1;
            self.open(d, "dependency");
            self.leaf(d + 1, "groupId", &dep.group_id);
            self.leaf(d + 1, "artifactId", &dep.artifact_id);
            self.opt_leaf(d + 1, "version", dep.version.as_deref());
            self.opt_leaf(d + 1, "classifier", dep.classifier.as_deref());
            self.opt_leaf(d + 1, "type", dep.type_.as_deref());
            self.opt_leaf(d + 1, "scope", dep.scope.map(|s| s.as_str()));
            if dep.optional {
                self.leaf(d + 1, "optional", "true");
            }
            self.exclusions(d + 1, &dep.exclusions);
            self.fragments(d + 1, &dep.extra_xml);
            self.close(d, "dependency");
        }
        self.close(depth, "dependencies");
    }

    fn dependency_management(&mut self, depth: usize, managed: &[ManagedDependency]) {
        if managed.is_empty() {
            return;
        }
        self.open(depth, "dependencyManagement");
        self.open(depth + 1, "dependencies");
        for m in managed {
            let d = depth + 2;
            self.open(d, "dependency");
            self.leaf(d + 1, "groupId", &m.group_id);
            self.leaf(d + 1, "artifactId", &m.artifact_id);
            self.opt_leaf(d + 1, "version", m.version.as_deref());
            self.opt_leaf(d + 1, "classifier", m.classifier.as_deref());
            self.opt_leaf(d + 1, "type", m.type_.as_deref());
            self.opt_leaf(d + 1, "scope", m.scope.map(|s| s.as_str()));
            self.exclusions(d + 1, &m.exclusions);
            self.fragments(d + 1, &m.extra_xml);
            self.close(d, "dependency");
        }
        self.close(depth + 1, "dependencies");
        self.close(depth, "dependencyManagement");
    }

    fn exclusions(&mut self, depth: usize, exclusions: &[Exclusion]) {
        if exclusions.is_empty() {
            return;
        }
        self.open(depth, "exclusions");
        for e in exclusions {
            self.open(depth + 1, "exclusion");
            self.leaf(depth + 2, "groupId", &e.group_id);
            self.leaf(depth + 2, "artifactId", &e.artifact_id);
            self.close(depth + 1, "exclusion");
        }
        self.close(depth, "exclusions");
    }

    fn repositories(&mut self, depth: usize, repos: &[Repository]) {
        if repos.is_empty() {
            return;
        }
        self.open(depth, "repositories");
        for r in repos {
            self.open(depth + 1, "repository");
            self.leaf(depth + 2, "id", &r.id);
            self.opt_leaf(depth + 2, "name", r.name.as_deref());
            self.leaf(depth + 2, "url", &r.url);
            self.close(depth + 1, "repository");
        }
        self.close(depth, "repositories");
    }

    fn plugins(&mut self, depth: usize, plugins: &[Plugin]) {
        if plugins.is_empty() {
            return;
        }
        self.open(depth, "plugins");
        for p in plugins {
            self.open(depth + 1, "plugin");
            if p.group_id != DEFAULT_PLUGIN_GROUP {
                self.leaf(depth + 2, "groupId", &p.group_id);
            }
            self.leaf(depth + 2, "artifactId", &p.artifact_id);
            self.opt_leaf(depth + 2, "version", p.version.as_deref());
            self.fragments(depth + 2, &p.extra_xml);
            self.close(depth + 1, "plugin");
        }
        self.close(depth, "plugins");
    }

    fn profile(&mut self, depth: usize, profile: &Profile) {
        self.open(depth, "profile");
        self.leaf(depth + 1, "id", &profile.id);
        let activation = &profile.activation;
        if activation.active_by_default || activation.property.is_some() || !activation.extra_xml.is_empty() {
            self.open(depth + 1, "activation");
            if activation.active_by_default {
                self.leaf(depth + 2, "activeByDefault", "true");
            }
            if let Some(ref prop) = activation.property {
                self.open(depth + 2, "property");
                self.leaf(depth + 3, "name", &prop.name);
                self.opt_leaf(depth + 3, "value", prop.value.as_deref());
                self.close(depth + 2, "property");
            }
            self.fragments(depth + 2, &activation.extra_xml);
            self.close(depth + 1, "activation");
        }
        self.properties(depth + 1, &profile.properties);
        self.dependency_management(depth + 1, &profile.dependency_management);
        self.dependencies(depth + 1, &profile.dependencies);
        self.repositories(depth + 1, &profile.repositories);
        self.fragments(depth + 1, &profile.extra_xml);
        self.close(depth, "profile");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pomwright_core::dependency::DependencyKey;

    const SIMPLE_POM: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <groupId>org.example</groupId>
    <artifactId>my-lib</artifactId>
    <version>1.0.0</version>
    <packaging>jar</packaging>

    <properties>
        <jackson.version>2.15.2</jackson.version>
    </properties>

    <dependencies>
        <dependency>
            <groupId>com.fasterxml.jackson.core</groupId>
            <artifactId>jackson-databind</artifactId>
            <version>${jackson.version}</version>
        </dependency>
        <dependency>
            <groupId>junit</groupId>
            <artifactId>junit</artifactId>
            <version>4.13.2</version>
            <scope>test</scope>
        </dependency>
    </dependencies>
</project>"#;

    #[test]
    fn parse_simple_pom() {
        let doc = parse_pom(SIMPLE_POM, "pom.xml").unwrap();
        assert_eq!(doc.group_id.as_deref(), Some("org.example"));
        assert_eq!(doc.artifact_id, "my-lib");
        assert_eq!(doc.version.as_deref(), Some("1.0.0"));
        assert_eq!(doc.packaging.as_deref(), Some("jar"));
        assert_eq!(doc.dependencies.len(), 2);
        assert_eq!(doc.properties.get("jackson.version").unwrap(), "2.15.2");
        assert_eq!(
            doc.dependencies[0].version.as_deref(),
            Some("${jackson.version}")
        );
    }

    #[test]
    fn scope_parsing() {
        let doc = parse_pom(SIMPLE_POM, "pom.xml").unwrap();
        assert_eq!(doc.dependencies[0].scope, None);
        assert_eq!(doc.dependencies[1].scope, Some(Scope::Test));
    }

    #[test]
    fn dependency_management_and_bom() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <groupId>org.example</groupId>
    <artifactId>parent</artifactId>
    <version>1.0.0</version>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.junit</groupId>
                <artifactId>junit-bom</artifactId>
                <version>5.10.0</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
            <dependency>
                <groupId>com.google.guava</groupId>
                <artifactId>guava</artifactId>
                <version>32.0.0-jre</version>
            </dependency>
        </dependencies>
    </dependencyManagement>
</project>"#;
        let doc = parse_pom(xml, "pom.xml").unwrap();
        assert_eq!(doc.dependency_management.len(), 2);
        assert!(doc.dependency_management[0].is_import());
        let guava = doc
            .find_managed(&DependencyKey::new("com.google.guava", "guava", None, None))
            .unwrap();
        assert_eq!(guava.version.as_deref(), Some("32.0.0-jre"));
    }

    #[test]
    fn parent_ref_parsing() {
        let xml = r#"<?xml version="1.0"?>
<project>
    <parent>
        <groupId>org.example</groupId>
        <artifactId>parent-pom</artifactId>
        <version>2.0.0</version>
        <relativePath/>
    </parent>
    <artifactId>child</artifactId>
</project>"#;
        let doc = parse_pom(xml, "child/pom.xml").unwrap();
        let parent = doc.parent.as_ref().unwrap();
        assert_eq!(parent.group_id, "org.example");
        assert_eq!(parent.version, "2.0.0");
        assert_eq!(parent.relative_path.as_deref(), Some(""));
        assert_eq!(doc.effective_group_id(), Some("org.example"));
    }

    #[test]
    fn exclusion_parsing() {
        let xml = r#"<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <dependencies>
        <dependency>
            <groupId>com.example</groupId>
            <artifactId>lib</artifactId>
            <exclusions>
                <exclusion>
                    <groupId>commons-logging</groupId>
                    <artifactId>commons-logging</artifactId>
                </exclusion>
            </exclusions>
        </dependency>
    </dependencies>
</project>"#;
        let doc = parse_pom(xml, "pom.xml").unwrap();
        assert_eq!(doc.dependencies[0].exclusions.len(), 1);
        assert_eq!(doc.dependencies[0].exclusions[0].group_id, "commons-logging");
        assert_eq!(doc.dependencies[0].version, None);
    }

    #[test]
    fn profiles_are_kept_apart() {
        let xml = r#"<project>
    <groupId>org.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <profiles>
        <profile>
            <id>ci</id>
            <activation>
                <property><name>env</name><value>ci</value></property>
            </activation>
            <properties><junit.version>5.10.0</junit.version></properties>
            <dependencies>
                <dependency>
                    <groupId>org.junit.jupiter</groupId>
                    <artifactId>junit-jupiter</artifactId>
                </dependency>
            </dependencies>
        </profile>
    </profiles>
</project>"#;
        let doc = parse_pom(xml, "pom.xml").unwrap();
        assert!(doc.dependencies.is_empty());
        assert!(doc.properties.is_empty());
        assert_eq!(doc.profiles.len(), 1);
        let profile = &doc.profiles[0];
        assert_eq!(profile.id, "ci");
        assert_eq!(profile.dependencies.len(), 1);
        assert_eq!(profile.properties.get("junit.version").unwrap(), "5.10.0");
        let prop = profile.activation.property.as_ref().unwrap();
        assert_eq!(prop.name, "env");
        assert_eq!(prop.value.as_deref(), Some("ci"));
    }

    #[test]
    fn plugins_and_modules() {
        let xml = r#"<project>
    <groupId>org.example</groupId>
    <artifactId>root</artifactId>
    <version>1.0</version>
    <packaging>pom</packaging>
    <modules><module>api</module><module>service</module></modules>
    <build>
        <pluginManagement>
            <plugins>
                <plugin>
                    <artifactId>maven-compiler-plugin</artifactId>
                    <version>3.11.0</version>
                </plugin>
            </plugins>
        </pluginManagement>
        <plugins>
            <plugin>
                <groupId>org.codehaus.mojo</groupId>
                <artifactId>exec-maven-plugin</artifactId>
            </plugin>
        </plugins>
    </build>
</project>"#;
        let doc = parse_pom(xml, "pom.xml").unwrap();
        assert_eq!(doc.modules, vec!["api", "service"]);
        assert_eq!(doc.plugin_management[0].group_id, DEFAULT_PLUGIN_GROUP);
        assert_eq!(doc.plugin_management[0].version.as_deref(), Some("3.11.0"));
        assert_eq!(doc.plugins[0].group_id, "org.codehaus.mojo");
    }

    #[test]
    fn missing_artifact_id_is_malformed() {
        let err = parse_pom("<project><groupId>g</groupId></project>", "bad.xml").unwrap_err();
        assert!(err.to_string().contains("artifactId is missing"));
    }

    #[test]
    fn wrong_root_is_rejected() {
        assert!(parse_pom("<settings/>", "settings.xml").is_err());
    }

    #[test]
    fn indentation_is_depth_based() {
        assert_eq!(indent(0), "");
        assert_eq!(indent(3), " ".repeat(12));
    }

    #[test]
    fn written_pom_reads_back() {
        let doc = parse_pom(SIMPLE_POM, "pom.xml").unwrap();
        let written = write_pom(&doc);
        let reread = parse_pom(&written, "pom.xml").unwrap();
        assert_eq!(reread, doc);
    }

    #[test]
    fn dependency_children_in_canonical_order() {
        let mut doc = Document::new("pom.xml", "app");
        doc.dependencies.push(
            Dependency::new("g", "a")
                .with_scope(Scope::Test)
                .with_type("test-jar")
                .with_classifier("tests")
                .with_version("1.0"),
        );
        let xml = write_pom(&doc);
        let pos = |tag: &str| xml.find(tag).unwrap();
        assert!(pos("<groupId>g<") < pos("<artifactId>a<"));
        assert!(pos("<artifactId>a<") < pos("<version>1.0<"));
        assert!(pos("<version>1.0<") < pos("<classifier>"));
        assert!(pos("<classifier>") < pos("<type>"));
        assert!(pos("<type>") < pos("<scope>"));
        assert!(xml.contains("            <groupId>g</groupId>\n"));
    }
}
