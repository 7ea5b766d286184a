use pomwright_core::dependency::{ManagedDependency, Scope};
use pomwright_core::document::Document;
use pomwright_core::profile::Profile;
use pomwright_maven::pom::{parse_pom, read_pom, write_pom};

const MULTI_SECTION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<project xmlns="http://maven.apache.org/POM/4.0.0">
    <modelVersion>4.0.0</modelVersion>
    <parent>
        <groupId>com.acme</groupId>
        <artifactId>acme-parent</artifactId>
        <version>7</version>
        <relativePath>../parent/pom.xml</relativePath>
    </parent>
    <artifactId>service</artifactId>
    <properties>
        <netty.version>4.1.100.Final</netty.version>
    </properties>
    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>io.netty</groupId>
                <artifactId>netty-bom</artifactId>
                <version>${netty.version}</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
        </dependencies>
    </dependencyManagement>
    <dependencies>
        <dependency>
            <groupId>io.netty</groupId>
            <artifactId>netty-handler</artifactId>
            <optional>true</optional>
        </dependency>
    </dependencies>
    <repositories>
        <repository>
            <id>acme</id>
            <url>https://maven.acme.com/releases</url>
        </repository>
    </repositories>
    <profiles>
        <profile>
            <id>release</id>
            <activation>
                <activeByDefault>true</activeByDefault>
            </activation>
            <dependencyManagement>
                <dependencies>
                    <dependency>
                        <groupId>org.slf4j</groupId>
                        <artifactId>slf4j-api</artifactId>
                        <version>2.0.9</version>
                    </dependency>
                </dependencies>
            </dependencyManagement>
        </profile>
    </profiles>
</project>
"#;

#[test]
fn read_pom_sets_source_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pom.xml");
    std::fs::write(&path, MULTI_SECTION).unwrap();
    let doc = read_pom(&path).unwrap();
    assert_eq!(doc.source_path.as_deref(), Some(path.as_path()));
    assert_eq!(doc.id.as_str(), path.display().to_string());
}

#[test]
fn all_sections_survive_a_write() {
    let doc = parse_pom(MULTI_SECTION, "service/pom.xml").unwrap();
    assert_eq!(doc.repositories[0].id, "acme");
    assert!(doc.dependencies[0].optional);
    assert!(doc.profiles[0].activation.active_by_default);
    assert_eq!(doc.profiles[0].dependency_management.len(), 1);

    let reread = parse_pom(&write_pom(&doc), "service/pom.xml").unwrap();
    assert_eq!(reread, doc);
}

#[test]
fn bom_import_written_in_canonical_order() {
    let doc = Document::new("pom.xml", "app").with_managed_dependency(
        ManagedDependency::new("org.apache.logging.log4j", "log4j-bom")
            .with_version("2.17.2")
            .with_type("pom")
            .with_scope(Scope::Import),
    );
    let xml = write_pom(&doc);
    let expected = "    <dependencyManagement>
        <dependencies>
            <dependency>
                <groupId>org.apache.logging.log4j</groupId>
                <artifactId>log4j-bom</artifactId>
                <version>2.17.2</version>
                <type>pom</type>
                <scope>import</scope>
            </dependency>
        </dependencies>
    </dependencyManagement>
";
    assert!(xml.contains(expected), "{xml}");
}

#[test]
fn special_characters_are_escaped() {
    let doc = Document::new("pom.xml", "app").with_property("url", "https://x?a=1&b=2");
    let xml = write_pom(&doc);
    assert!(xml.contains("<url>https://x?a=1&amp;b=2</url>"));
    let reread = parse_pom(&xml, "pom.xml").unwrap();
    assert_eq!(reread.properties.get("url").unwrap(), "https://x?a=1&b=2");
}

#[test]
fn profile_property_activation_round_trips() {
    let mut doc = Document::new("pom.xml", "app");
    let mut profile = Profile::new("jdk21");
    profile.activation.property = Some(pomwright_core::profile::PropertyActivation {
        name: "!legacy".to_string(),
        value: None,
    });
    doc.profiles.push(profile);
    let reread = parse_pom(&write_pom(&doc), "pom.xml").unwrap();
    assert_eq!(reread.profiles, doc.profiles);
}

const UNMODELED: &str = r#"<project>
    <modelVersion>4.0.0</modelVersion>
    <groupId>com.example</groupId>
    <artifactId>app</artifactId>
    <version>1.0</version>
    <name>My App</name>
    <scm>
        <url>https://github.com/example/app</url>
    </scm>
    <dependencies>
        <dependency>
            <groupId>com.sun</groupId>
            <artifactId>tools</artifactId>
            <version>1.8</version>
            <scope>system</scope>
            <systemPath>${java.home}/../lib/tools.jar</systemPath>
        </dependency>
    </dependencies>
    <build>
        <finalName>app</finalName>
        <plugins>
            <plugin>
                <artifactId>maven-compiler-plugin</artifactId>
                <version>3.13.0</version>
                <configuration>
                    <release>17</release>
                </configuration>
            </plugin>
        </plugins>
    </build>
    <profiles>
        <profile>
            <id>jdk21</id>
            <activation>
                <jdk>[21,)</jdk>
            </activation>
            <build>
                <finalName>app-21</finalName>
            </build>
        </profile>
    </profiles>
</project>
"#;

#[test]
fn unmodeled_elements_survive_a_write() {
    let doc = parse_pom(UNMODELED, "pom.xml").unwrap();
    assert_eq!(
        doc.extra_xml,
        vec![
            "<name>My App</name>".to_string(),
            "<scm>\n    <url>https://github.com/example/app</url>\n</scm>".to_string(),
        ]
    );
    assert_eq!(doc.build_extra_xml, vec!["<finalName>app</finalName>".to_string()]);
    assert_eq!(
        doc.dependencies[0].extra_xml,
        vec!["<systemPath>${java.home}/../lib/tools.jar</systemPath>".to_string()]
    );
    assert_eq!(doc.plugins[0].version.as_deref(), Some("3.13.0"));
    assert_eq!(doc.profiles[0].activation.extra_xml, vec!["<jdk>[21,)</jdk>".to_string()]);

    let xml = write_pom(&doc);
    assert!(
        xml.contains("    <name>My App</name>\n    <scm>\n        <url>https://github.com/example/app</url>\n    </scm>\n"),
        "{xml}"
    );
    assert!(
        xml.contains(
            "                <version>3.13.0</version>\n                <configuration>\n                    <release>17</release>\n                </configuration>\n"
        ),
        "{xml}"
    );
    assert!(xml.contains("            <build>\n                <finalName>app-21</finalName>\n            </build>\n"), "{xml}");

    let reread = parse_pom(&xml, "pom.xml").unwrap();
    assert_eq!(reread, doc);
}
