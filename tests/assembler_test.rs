//! Integration tests for environment assembly from files on disk.

use std::fs;
use std::sync::Arc;

use autowire::config::{
    assemble_environment, default_loaders, Environment, EnvironmentAssembler,
    FileSystemResourceLoader, PropertySource, ResourceLoader,
};
use autowire::AutowireError;
use tempfile::TempDir;

const APP_YML: &str = r#"
server:
  port: 8080
greeting: hello
---
autowire:
  config:
    activate:
      on-profile: dev
server:
  port: 9090
"#;

fn project(files: &[(&str, &str)]) -> TempDir {
    let temp = TempDir::new().unwrap();
    for (path, content) in files {
        let path = temp.path().join(path);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    temp
}

fn loader(temp: &TempDir) -> Arc<dyn ResourceLoader> {
    Arc::new(FileSystemResourceLoader::new(temp.path()).with_classpath_root(temp.path().join("resources")))
}

fn assemble(temp: &TempDir, active: &[&str]) -> Environment {
    let active: Vec<String> = active.iter().map(|s| s.to_string()).collect();
    assemble_environment(
        loader(temp),
        "classpath:/,classpath:/config/,file:./,file:./config/",
        "app",
        default_loaders(),
        &active,
        &[],
    )
    .unwrap()
}

#[test]
fn dev_document_overrides_base_when_active() {
    let temp = project(&[("app.yml", APP_YML)]);
    let env = assemble(&temp, &["dev"]);

    assert_eq!(env.get_property("server.port"), Some("9090"));
    assert_eq!(env.get_property("greeting"), Some("hello"));
    assert_eq!(env.active_profiles(), &["dev".to_string()]);
}

#[test]
fn profile_document_absent_when_inactive() {
    let temp = project(&[("app.yml", APP_YML)]);
    let env = assemble(&temp, &[]);

    assert_eq!(env.get_property("server.port"), Some("8080"));
    assert!(env.active_profiles().is_empty());
    assert!(env
        .property_sources()
        .names()
        .iter()
        .all(|name| !name.contains("document #1")));
}

#[test]
fn profile_specific_file_absent_when_inactive() {
    let temp = project(&[("app.yml", "a: base\n"), ("app-prod.yml", "a: prod\n")]);

    let env = assemble(&temp, &[]);
    assert_eq!(env.get_property("a"), Some("base"));
    assert!(env
        .property_sources()
        .names()
        .iter()
        .all(|name| !name.contains("app-prod.yml")));

    let env = assemble(&temp, &["prod"]);
    assert_eq!(env.get_property("a"), Some("prod"));
}

#[test]
fn repeated_assembly_yields_same_order() {
    let temp = project(&[
        ("resources/app.properties", "a=classpath\n"),
        ("app.yml", APP_YML),
        ("config/app.yml", "a: config\n"),
    ]);

    let first = assemble(&temp, &["dev"]);
    let second = assemble(&temp, &["dev"]);
    assert_eq!(first.property_sources().names(), second.property_sources().names());
}

#[test]
fn more_specific_location_wins() {
    let temp = project(&[
        ("resources/app.properties", "a=classpath\nonly.classpath=yes\n"),
        ("app.properties", "a=root\n"),
        ("config/app.properties", "a=config\n"),
    ]);

    let env = assemble(&temp, &[]);
    assert_eq!(env.get_property("a"), Some("config"));
    assert_eq!(env.get_property("only.classpath"), Some("yes"));
}

#[test]
fn included_profiles_load_from_files() {
    let temp = project(&[
        ("app.yml", "autowire.profiles.include: metrics\n"),
        ("app-metrics.yml", "metrics.enabled: true\n"),
    ]);
    let env = assemble(&temp, &[]);
    assert_eq!(env.get_property("metrics.enabled"), Some("true"));
}

#[test]
fn default_properties_stay_last() {
    let temp = project(&[("application.yml", "a: file\n")]);
    let mut env = Environment::new();
    let mut defaults = PropertySource::new("defaultProperties");
    defaults.set("a", "default");
    defaults.set("b", "default");
    env.add_first(defaults);

    EnvironmentAssembler::from_shared(loader(&temp))
        .assemble(&mut env)
        .unwrap();

    assert_eq!(env.get_property("a"), Some("file"));
    assert_eq!(env.get_property("b"), Some("default"));
    assert_eq!(
        env.property_sources().names().last().copied(),
        Some("defaultProperties")
    );
}

#[test]
fn malformed_yaml_fails() {
    let temp = project(&[("application.yml", "a: [unclosed\n")]);
    let mut env = Environment::new();
    let err = EnvironmentAssembler::from_shared(loader(&temp))
        .assemble(&mut env)
        .unwrap_err();
    assert!(matches!(err, AutowireError::ConfigLoad { .. }));
}

#[test]
fn unknown_extension_in_file_location_fails() {
    let temp = project(&[]);
    let mut env = Environment::new();
    let err = EnvironmentAssembler::from_shared(loader(&temp))
        .with_search_locations("file:./settings.toml")
        .assemble(&mut env)
        .unwrap_err();
    assert!(matches!(err, AutowireError::UnknownExtension { .. }));
}
