//! Library integration tests.

use autowire::AutowireError;

#[test]
fn error_types_are_public() {
    let err = AutowireError::CycleDetected {
        first: "a".into(),
        second: "b".into(),
    };
    assert!(err.to_string().contains("a and b"));
}

#[test]
fn result_type_alias_is_public() {
    fn test_fn() -> autowire::Result<()> {
        Ok(())
    }
    assert!(test_fn().is_ok());
}

#[test]
fn cli_types_are_public() {
    use autowire::cli::{Cli, Commands};
    use clap::Parser;

    let cli = Cli::parse_from(["autowire", "resolve", "--json"]);

    if let Commands::Resolve(args) = cli.command {
        assert!(args.json);
    } else {
        panic!("Expected Resolve command");
    }
}

#[test]
fn bootstrap_types_are_public() {
    let settings = autowire::BootstrapSettings::for_project("/tmp/project");
    let bootstrap = autowire::Bootstrap::new(settings);
    assert_eq!(
        bootstrap.settings().project_dir,
        std::path::PathBuf::from("/tmp/project")
    );
}
