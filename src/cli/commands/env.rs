//! Env command implementation.
//!
//! The `autowire env` command assembles the environment and shows its
//! property sources in precedence order, or a single resolved property.

use std::io::Write;

use serde_json::{json, Map, Value};

use crate::bootstrap::{Bootstrap, BootstrapSettings};
use crate::cli::args::EnvArgs;
use crate::config::Environment;
use crate::error::{AutowireError, Result};

use super::dispatcher::{Command, CommandResult};

/// The env command implementation.
pub struct EnvCommand {
    settings: BootstrapSettings,
    args: EnvArgs,
}

impl EnvCommand {
    /// Create a new env command.
    pub fn new(settings: BootstrapSettings, args: EnvArgs) -> Self {
        Self { settings, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &EnvArgs {
        &self.args
    }

    fn print_key(&self, env: &Environment, key: &str, out: &mut dyn Write) -> Result<CommandResult> {
        let value = env.get_resolved(key)?;
        let source = env.property_sources().source_of(key);

        if self.args.json {
            let doc = json!({ "key": key, "value": value, "source": source });
            writeln!(out, "{}", to_json(&doc)?)?;
        } else {
            match (&value, source) {
                (Some(value), Some(source)) => writeln!(out, "{}={}  ({})", key, value, source)?,
                _ => writeln!(out, "{} is not set", key)?,
            }
        }

        Ok(if value.is_some() {
            CommandResult::success()
        } else {
            CommandResult::failure(1)
        })
    }

    fn print_all(&self, env: &Environment, out: &mut dyn Write) -> Result<()> {
        if self.args.json {
            let sources: Vec<Value> = env
                .property_sources()
                .iter()
                .map(|source| {
                    let properties: Map<String, Value> = source
                        .iter()
                        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
                        .collect();
                    json!({ "name": source.name(), "properties": properties })
                })
                .collect();
            let doc = json!({
                "active_profiles": env.active_profiles(),
                "default_profiles": env.default_profiles(),
                "property_sources": sources,
            });
            writeln!(out, "{}", to_json(&doc)?)?;
            return Ok(());
        }

        writeln!(out, "Active profiles: [{}]", env.active_profiles().join(", "))?;
        writeln!(out, "Property sources:")?;
        for source in env.property_sources().iter() {
            writeln!(out, "  {}", source.name())?;
            for (key, value) in source.iter() {
                writeln!(out, "    {}={}", key, value)?;
            }
        }
        Ok(())
    }
}

fn to_json(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| AutowireError::Other(e.into()))
}

impl Command for EnvCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let env = Bootstrap::new(self.settings.clone()).assemble_environment()?;

        if let Some(key) = &self.args.key {
            return self.print_key(&env, key, out);
        }
        self.print_all(&env, out)?;
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn setup_project() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(
            temp.path().join("application.properties"),
            "server.port=8080\nurl=http://localhost:${server.port}\n",
        )
        .unwrap();
        fs::write(temp.path().join("application-dev.properties"), "server.port=9090\n").unwrap();
        temp
    }

    fn run(settings: BootstrapSettings, args: EnvArgs) -> (CommandResult, String) {
        let mut out = Vec::new();
        let result = EnvCommand::new(settings, args).execute(&mut out).unwrap();
        (result, String::from_utf8(out).unwrap())
    }

    #[test]
    fn lists_sources_in_precedence_order() {
        let temp = setup_project();
        let mut settings = BootstrapSettings::for_project(temp.path());
        settings.active_profiles = vec!["dev".to_string()];

        let (result, output) = run(settings, EnvArgs::default());
        assert!(result.success);
        assert!(output.contains("Active profiles: [dev]"));
        let dev = output.find("application-dev.properties").unwrap();
        let base = output.find("[file:./application.properties]").unwrap();
        assert!(dev < base);
    }

    #[test]
    fn prints_resolved_key() {
        let temp = setup_project();
        let args = EnvArgs {
            key: Some("url".to_string()),
            ..EnvArgs::default()
        };
        let (result, output) = run(BootstrapSettings::for_project(temp.path()), args);
        assert!(result.success);
        assert!(output.contains("url=http://localhost:8080"));
    }

    #[test]
    fn missing_key_fails() {
        let temp = setup_project();
        let args = EnvArgs {
            key: Some("nope".to_string()),
            ..EnvArgs::default()
        };
        let (result, output) = run(BootstrapSettings::for_project(temp.path()), args);
        assert_eq!(result.exit_code, 1);
        assert!(output.contains("nope is not set"));
    }

    #[test]
    fn json_output_parses() {
        let temp = setup_project();
        let args = EnvArgs {
            json: true,
            ..EnvArgs::default()
        };
        let (_, output) = run(BootstrapSettings::for_project(temp.path()), args);
        let doc: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(doc["default_profiles"][0], "default");
        assert_eq!(doc["property_sources"][0]["properties"]["server.port"], "8080");
    }
}
