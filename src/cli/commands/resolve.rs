//! Resolve command implementation.
//!
//! The `autowire resolve` command runs the full bootstrap and prints the
//! modules to activate, in order.

use std::io::Write;

use serde_json::json;

use crate::autoconfigure::ConditionEvaluationReport;
use crate::bootstrap::{Bootstrap, BootstrapResult, BootstrapSettings};
use crate::cli::args::ResolveArgs;
use crate::error::{AutowireError, Result};

use super::dispatcher::{Command, CommandResult};

/// The resolve command implementation.
pub struct ResolveCommand {
    settings: BootstrapSettings,
    args: ResolveArgs,
}

impl ResolveCommand {
    /// Create a new resolve command.
    pub fn new(settings: BootstrapSettings, args: ResolveArgs) -> Self {
        Self { settings, args }
    }

    /// Get the command arguments.
    pub fn args(&self) -> &ResolveArgs {
        &self.args
    }

    fn print_json(&self, result: &BootstrapResult, out: &mut dyn Write) -> Result<()> {
        let mut doc = json!({
            "active_profiles": result.environment.active_profiles(),
            "modules": result.selection.modules,
            "exclusions": result.selection.exclusions,
        });
        if self.args.report {
            doc["report"] = serde_json::to_value(&result.report).map_err(|e| AutowireError::Other(e.into()))?;
        }
        let text = serde_json::to_string_pretty(&doc).map_err(|e| AutowireError::Other(e.into()))?;
        writeln!(out, "{}", text)?;
        Ok(())
    }

    fn print_text(&self, result: &BootstrapResult, out: &mut dyn Write) -> Result<()> {
        writeln!(
            out,
            "Active profiles: [{}]",
            result.environment.active_profiles().join(", ")
        )?;

        if result.selection.modules.is_empty() {
            writeln!(out, "No modules selected.")?;
        } else {
            writeln!(out, "Modules:")?;
            for (i, module) in result.selection.modules.iter().enumerate() {
                writeln!(out, "  {}. {}", i + 1, module)?;
            }
        }

        if !result.selection.exclusions.is_empty() {
            writeln!(out, "Exclusions:")?;
            for module in &result.selection.exclusions {
                writeln!(out, "  - {}", module)?;
            }
        }

        if self.args.report {
            print_report(&result.report, out)?;
        }
        Ok(())
    }
}

fn print_report(report: &ConditionEvaluationReport, out: &mut dyn Write) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "Negative matches:")?;
    let mut any = false;
    for (module, recorded) in report.non_matching() {
        any = true;
        writeln!(out, "  {}", module)?;
        writeln!(out, "    - {}: {}", recorded.condition, recorded.outcome.message())?;
    }
    if !any {
        writeln!(out, "  None")?;
    }

    writeln!(out)?;
    writeln!(out, "Positive matches:")?;
    let positive: Vec<&str> = report
        .evaluated()
        .filter(|(module, _)| report.is_full_match(module))
        .map(|(module, _)| module)
        .collect();
    if positive.is_empty() {
        writeln!(out, "  None")?;
    }
    for module in positive {
        writeln!(out, "  {}", module)?;
        for recorded in report.outcomes_for(module) {
            writeln!(out, "    - {}: {}", recorded.condition, recorded.outcome.message())?;
        }
    }

    let unconditional = report.unconditional();
    if !unconditional.is_empty() {
        writeln!(out)?;
        writeln!(out, "Unconditional modules:")?;
        for module in unconditional {
            writeln!(out, "  {}", module)?;
        }
    }
    Ok(())
}

impl Command for ResolveCommand {
    fn execute(&self, out: &mut dyn Write) -> Result<CommandResult> {
        let result = Bootstrap::new(self.settings.clone()).run()?;
        if self.args.json {
            self.print_json(&result, out)?;
        } else {
            self.print_text(&result, out)?;
        }
        Ok(CommandResult::success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::fs;
    use tempfile::TempDir;

    fn setup_project() -> TempDir {
        let temp = TempDir::new().unwrap();
        let meta_inf = temp.path().join("resources").join("META-INF");
        fs::create_dir_all(&meta_inf).unwrap();
        fs::write(
            meta_inf.join("autowire.factories"),
            "autowire.modules=web.Server,data.Pool,core.Config\n",
        )
        .unwrap();
        fs::write(
            meta_inf.join("autowire-metadata.properties"),
            "web.Server=\n\
             web.Server.AutoConfigureAfter=core.Config\n\
             data.Pool=\n\
             data.Pool.ConditionalOnCapability=jdbc\n\
             core.Config=\n",
        )
        .unwrap();
        temp
    }

    fn run(args: ResolveArgs, dir: &TempDir) -> String {
        let mut out = Vec::new();
        let result = ResolveCommand::new(BootstrapSettings::for_project(dir.path()), args)
            .execute(&mut out)
            .unwrap();
        assert!(result.success);
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn prints_ordered_modules() {
        let temp = setup_project();
        let output = run(ResolveArgs::default(), &temp);
        assert!(output.contains("  1. core.Config\n  2. web.Server\n"));
        assert!(!output.contains("data.Pool"));
    }

    #[test]
    fn report_lists_negative_matches() {
        let temp = setup_project();
        let args = ResolveArgs {
            report: true,
            ..ResolveArgs::default()
        };
        let output = run(args, &temp);
        assert!(output.contains("Negative matches:"));
        assert!(output.contains("data.Pool"));
        assert!(output.contains("did not find required capability 'jdbc'"));
        assert!(output.contains("Unconditional modules:"));
    }

    #[test]
    fn json_output() {
        let temp = setup_project();
        let args = ResolveArgs {
            json: true,
            report: true,
            ..ResolveArgs::default()
        };
        let doc: Value = serde_json::from_str(&run(args, &temp)).unwrap();
        assert_eq!(doc["modules"][0], "core.Config");
        assert_eq!(doc["modules"][1], "web.Server");
        assert!(doc["report"]["outcomes"]["data.Pool"].is_array());
    }
}
