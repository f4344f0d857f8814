//! CLI subcommand handlers.

use std::io::Write;
use std::path::Path;

use cmdbar_core::{CommandBackend, ConsoleConfig, HttpBackend};

use crate::Commands;
use crate::ConfigAction;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config: &ConsoleConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();
    match command {
        Commands::Config { action } => handle_config(action, config, workspace, &mut stdout),
        Commands::List => {
            let backend = HttpBackend::new(&config.backend)?;
            list_commands(&backend, &mut stdout).await?;
            Ok(())
        }
        Commands::Exec { line } => {
            let backend = HttpBackend::new(&config.backend)?;
            exec_line(&backend, &line, &mut stdout)
                .await
                .map_err(|e| anyhow::anyhow!("Command '{}' failed: {}", line, e))
        }
    }
}

fn handle_config(
    action: ConfigAction,
    config: &ConsoleConfig,
    workspace: &Path,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_dir = workspace.join(".cmdbar");
            std::fs::create_dir_all(&config_dir)?;

            let config_path = config_dir.join("config.toml");
            if config_path.exists() {
                writeln!(
                    out,
                    "Configuration file already exists at: {}",
                    config_path.display()
                )?;
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&ConsoleConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            writeln!(
                out,
                "Created default configuration at: {}",
                config_path.display()
            )?;
            Ok(())
        }
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(config)?;
            writeln!(out, "{}", toml_str)?;
            Ok(())
        }
    }
}

/// Print the registry the backend advertises.
pub async fn list_commands(
    backend: &dyn CommandBackend,
    out: &mut impl Write,
) -> cmdbar_core::Result<()> {
    let registry = backend.list_commands().await?;
    write!(out, "{}", registry.help_text())?;
    Ok(())
}

/// Execute one line and print its serialized result.
pub async fn exec_line(
    backend: &dyn CommandBackend,
    line: &str,
    out: &mut impl Write,
) -> cmdbar_core::Result<()> {
    let response = backend.execute(line).await?;
    writeln!(out, "{}", response.serialized_result())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cmdbar_core::{BackendError, CmdbarError, CommandRegistry, CommandSpec, MockBackend};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn mock() -> MockBackend {
        MockBackend::new(CommandRegistry::from_specs([
            CommandSpec::new("set")
                .with_args(["option", "value"])
                .with_description("Set an option"),
            CommandSpec::new("help"),
        ]))
    }

    #[test]
    fn test_config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        let mut out = Vec::new();
        handle_config(
            ConfigAction::Init,
            &ConsoleConfig::default(),
            dir.path(),
            &mut out,
        )
        .unwrap();

        let config_path = dir.path().join(".cmdbar").join("config.toml");
        let content = std::fs::read_to_string(&config_path).unwrap();
        let parsed: ConsoleConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed, ConsoleConfig::default());
    }

    #[test]
    fn test_config_init_idempotent() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join(".cmdbar").join("config.toml");
        std::fs::create_dir_all(config_path.parent().unwrap()).unwrap();
        std::fs::write(&config_path, "[backend]\ntimeout_secs = 5\n").unwrap();

        let mut out = Vec::new();
        handle_config(
            ConfigAction::Init,
            &ConsoleConfig::default(),
            dir.path(),
            &mut out,
        )
        .unwrap();

        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("already exists"));
        let content = std::fs::read_to_string(&config_path).unwrap();
        assert_eq!(content, "[backend]\ntimeout_secs = 5\n");
    }

    #[test]
    fn test_config_show_prints_toml() {
        let dir = TempDir::new().unwrap();
        let mut config = ConsoleConfig::default();
        config.backend.base_url = "http://proxy.local:9000".into();

        let mut out = Vec::new();
        handle_config(ConfigAction::Show, &config, dir.path(), &mut out).unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("base_url = \"http://proxy.local:9000\""));
    }

    #[tokio::test]
    async fn test_list_commands_prints_help_text() {
        let mut out = Vec::new();
        list_commands(&mock(), &mut out).await.unwrap();
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains("Available commands:"));
        assert!(output.contains("set option value"));
        assert!(output.contains("Set an option"));
    }

    #[tokio::test]
    async fn test_list_commands_reports_failure() {
        let backend = mock();
        backend.fail_listing();
        let mut out = Vec::new();
        let err = list_commands(&backend, &mut out).await.unwrap_err();
        assert!(matches!(
            err,
            CmdbarError::Backend(BackendError::Connection { .. })
        ));
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn test_exec_line_prints_serialized_result() {
        let backend = mock();
        let mut out = Vec::new();
        exec_line(&backend, "set a b", &mut out).await.unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\"executed: set a b\"\n");
        assert_eq!(backend.calls(), vec!["set a b"]);
    }

    #[tokio::test]
    async fn test_exec_line_surfaces_backend_error() {
        let backend = mock();
        backend.fail_on("set broken");
        let mut out = Vec::new();
        let err = exec_line(&backend, "set broken", &mut out)
            .await
            .unwrap_err();
        assert!(err.to_string().starts_with("Backend error:"));
    }
}
