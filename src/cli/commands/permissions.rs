use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_list, output_success};
use crate::cli::OutputFormat;
use crate::config::{self, PermissionSource};
use crate::database::DatabaseClient;
use crate::permissions::{permitted_columns, source, AccessLevel, PermissionTable, RelationRole};

#[derive(Subcommand)]
pub enum PermissionsCommands {
    #[command(about = "List the columns a role may access on a relation")]
    Columns {
        #[arg(long, help = "Relation name, e.g. data_sources")]
        relation: String,
        #[arg(long, help = "STANDARD, OWNER or ADMIN")]
        role: String,
        #[arg(long, default_value = "READ", help = "READ or WRITE")]
        access: String,
    },

    #[command(about = "Export the permission table as YAML")]
    Export {
        #[arg(long, help = "Write to this file instead of stdout")]
        output: Option<String>,
    },

    #[command(about = "Load and validate the configured permission table")]
    Check,
}

/// The configured table; the static table needs no database.
async fn load_table() -> anyhow::Result<PermissionTable> {
    let config = config::config();
    match &config.permissions.source {
        PermissionSource::Static => Ok(PermissionTable::builtin()),
        PermissionSource::File(path) => Ok(source::load_file(path)?),
        PermissionSource::Database => {
            let db = DatabaseClient::connect(&config.database).await?;
            let table = source::load(&config.permissions.source, db.pool()).await;
            db.close().await;
            Ok(table?)
        }
    }
}

pub async fn handle(cmd: PermissionsCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        PermissionsCommands::Columns { relation, role, access } => {
            let role: RelationRole = role.parse()?;
            let access: AccessLevel = access.parse()?;
            let table = load_table().await?;
            let columns = permitted_columns(&table, &relation, role, access)?;
            output_list(
                &output_format,
                &format!("{} columns of {} for {}", access, relation, role),
                "columns",
                &columns,
            )
        }
        PermissionsCommands::Export { output } => {
            let table = load_table().await?;
            let yaml = source::to_yaml(&table)?;
            match output {
                Some(path) => {
                    std::fs::write(&path, yaml)?;
                    output_success(&output_format, &format!("Wrote permission table to {}", path), Some(json!({ "path": path })))
                }
                None => {
                    print!("{}", yaml);
                    Ok(())
                }
            }
        }
        PermissionsCommands::Check => {
            let table = load_table().await?;
            let report = table.validate()?;
            let relations: Vec<String> = table.relation_names().map(str::to_string).collect();
            if !report.missing.is_empty() {
                output_list(&output_format, "Columns without permission entries (treated as NONE)", "missing", &report.missing)?;
            }
            output_list(&output_format, "Permission table is valid", "relations", &relations)
        }
    }
}
