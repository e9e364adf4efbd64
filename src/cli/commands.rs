//! Command dispatch: each subcommand maps onto one service call.

use std::io;
use std::path::PathBuf;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::TreePathService;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{expand_env_vars, global_config_path, local_config_path, Settings};
use crate::domain::{HierarchyRow, RowIdentity};
use crate::infrastructure::di::ServiceContainer;
use crate::tree_traits::TreeNodeConvert;

/// Resolve settings from config files, env vars and `--db`.
pub fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load(cli.config_dir.as_deref())?;
    if let Some(db) = &cli.db {
        settings.database = PathBuf::from(expand_env_vars(&db.to_string_lossy()));
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Err(CliError::Usage(
            "no command given, see `treepath --help`".to_string(),
        ));
    };

    // Commands that do not touch the database
    match command {
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(*shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        Commands::Config { command } => return config_command(cli, command),
        _ => {}
    }

    let container = ServiceContainer::new(&load_settings(cli)?)?;
    let service = container.tree_service();
    execute_with_service(command, &service)
}

/// Run a database command against an already wired service.
pub fn execute_with_service(command: &Commands, service: &TreePathService) -> CliResult<()> {
    match command {
        Commands::Tree { paths, dropped } => cmd_tree(service, *paths, *dropped),
        Commands::List { depth, parent } => cmd_list(service, *depth, parent.as_deref()),
        Commands::Get {
            ident,
            depth,
            parent,
        } => cmd_get(service, &RowIdentity::new(ident, *depth, parent.as_deref())),
        Commands::Add {
            ident,
            depth,
            sort_order,
            parent,
            label,
        } => {
            let row = HierarchyRow::new(
                ident.as_str(),
                parent.as_deref(),
                *depth,
                *sort_order,
                label.as_deref(),
            );
            check_applied(service.insert(&row)?, || {
                format!("{} already exists", row.identity())
            })?;
            output::success(&format!("added {}", row.identity()));
            Ok(())
        }
        Commands::Remove {
            ident,
            depth,
            parent,
        } => {
            let identity = RowIdentity::new(ident, *depth, parent.as_deref());
            check_applied(service.delete(&identity)?, || format!("no row {identity}"))?;
            output::success(&format!("removed {identity}"));
            Ok(())
        }
        Commands::SetOrder {
            ident,
            depth,
            sort_order,
            parent,
        } => {
            let target = target_row(ident, *depth, parent.as_deref());
            check_applied(service.update_sort_order(&target, *sort_order)?, || {
                format!("no row {}", target.identity())
            })?;
            output::success(&format!("{}: sort order {}", target.identity(), sort_order));
            Ok(())
        }
        Commands::SetLabel {
            ident,
            depth,
            parent,
            label,
        } => {
            let target = target_row(ident, *depth, parent.as_deref());
            check_applied(service.update_label(&target, label.as_deref())?, || {
                format!("no row {}", target.identity())
            })?;
            output::success(&format!(
                "{}: label {}",
                target.identity(),
                label.as_deref().unwrap_or("cleared")
            ));
            Ok(())
        }
        Commands::Clear { yes } => {
            if !yes {
                return Err(CliError::Usage(
                    "refusing to delete all rows without --yes".to_string(),
                ));
            }
            let removed = service.clear()?;
            output::success(&format!("removed {removed} rows"));
            Ok(())
        }
        Commands::Config { .. } | Commands::Completion { .. } => Err(CliError::Usage(
            "command does not use the database".to_string(),
        )),
    }
}

// Only the identity triple of the target matters to keyed writes.
fn target_row(ident: &str, depth: u16, parent: Option<&str>) -> HierarchyRow {
    HierarchyRow::new(ident, parent, depth, 0, None)
}

fn check_applied(applied: bool, describe: impl FnOnce() -> String) -> CliResult<()> {
    if applied {
        Ok(())
    } else {
        Err(CliError::NotApplied(describe()))
    }
}

#[instrument(level = "debug", skip(service))]
fn cmd_tree(service: &TreePathService, paths: bool, show_dropped: bool) -> CliResult<()> {
    let (forest, dropped) = service.load_with_dropped()?;
    let rendered = if paths {
        forest.to_path_tree()
    } else {
        forest.to_tree_string()
    };
    output::info(&rendered);

    if show_dropped && !dropped.is_empty() {
        output::header(&format!("{} rows not reachable from a root:", dropped.len()));
        for row in &dropped {
            output::detail(&output::row_line(row));
        }
    }
    Ok(())
}

fn cmd_list(service: &TreePathService, depth: Option<u16>, parent: Option<&str>) -> CliResult<()> {
    let rows = match depth {
        Some(depth) => service.children_of(depth, parent)?,
        None => service.rows()?,
    };
    for row in &rows {
        output::info(&output::row_line(row));
    }
    Ok(())
}

fn cmd_get(service: &TreePathService, identity: &RowIdentity) -> CliResult<()> {
    match service.find(identity)? {
        Some(row) => {
            output::info(&output::row_line(&row));
            Ok(())
        }
        None => Err(CliError::NotApplied(format!("no row {identity}"))),
    }
}

fn config_command(cli: &Cli, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            let settings = load_settings(cli)?;
            output::info(&settings.to_toml()?);
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::info(&format!("global: {}", path.display())),
                None => output::warning("no global config directory on this platform"),
            }
            let dir = match &cli.config_dir {
                Some(dir) => dir.clone(),
                None => std::env::current_dir().map_err(|e| {
                    CliError::InvalidArgs(format!("cannot determine working directory: {e}"))
                })?,
            };
            output::info(&format!("local: {}", local_config_path(&dir).display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::InMemoryRowStore;
    use clap::Parser;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn service() -> TreePathService {
        TreePathService::new(Arc::new(InMemoryRowStore::with_rows(vec![
            HierarchyRow::root("iso", 1, Some("ISO")),
        ])))
    }

    #[test]
    fn given_missing_row_when_setting_order_then_not_applied() {
        let command = Commands::SetOrder {
            ident: "nope".into(),
            depth: 0,
            sort_order: 3,
            parent: None,
        };
        let err = execute_with_service(&command, &service()).unwrap_err();
        assert!(matches!(err, CliError::NotApplied(_)));
    }

    #[test]
    fn given_clear_without_yes_then_usage_error() {
        let err = execute_with_service(&Commands::Clear { yes: false }, &service()).unwrap_err();
        assert_eq!(err.exit_code(), crate::exitcode::USAGE);
    }

    #[test]
    fn given_new_row_when_adding_then_visible_in_store() {
        let service = service();
        let command = Commands::Add {
            ident: "org".into(),
            depth: 1,
            sort_order: -2,
            parent: Some("iso".into()),
            label: Some("ORG".into()),
        };
        execute_with_service(&command, &service).unwrap();

        let found = service
            .find(&RowIdentity::new("org", 1, Some("iso")))
            .unwrap()
            .unwrap();
        assert_eq!(found.sort_order, -2);
    }

    #[test]
    fn given_db_flag_with_home_variable_when_loading_settings_then_expanded() {
        let Ok(home) = std::env::var("HOME") else {
            return;
        };
        let dir = TempDir::new().unwrap();
        let cli = Cli::parse_from([
            "treepath",
            "--db",
            "$HOME/trees.db",
            "-C",
            dir.path().to_str().unwrap(),
            "tree",
        ]);

        let settings = load_settings(&cli).unwrap();

        assert_eq!(settings.database, PathBuf::from(home).join("trees.db"));
    }
}
