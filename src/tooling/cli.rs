//! CLI command definitions and execution

use crate::codec::{validate_repo_path, PathIdentifierCodec};
use crate::config::{BridgeConfig, ConfigLoader};
use crate::error::ApiError;
use crate::logging::LoggingConfig;
use crate::object::{ObjectData, ObjectInFolderContainer};
use crate::pagination::Page;
use crate::properties::{PropertyBag, PropertyValue};
use crate::repository::{ObjectRequest, Repository};
use crate::schema::{ids, BaseType, TypeSchema};
use crate::types::{CallContext, CmisVersion, ObjectId};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

/// aip-bridge CLI - browse and query an archival package store
#[derive(Parser)]
#[command(name = "aip-bridge")]
#[command(about = "Browse and query an archival package store as a content repository")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Repository root directory (overrides configuration)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// User to act as (default: $USER)
    #[arg(long, short)]
    pub user: Option<String>,

    /// Protocol version the objects are compiled for (1.0 or 1.1)
    #[arg(long, default_value = "1.1")]
    pub cmis_version: String,

    /// Enable debug logging
    #[arg(long, default_value = "false")]
    pub verbose: bool,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Configured logging with command-line overrides applied.
    pub fn logging_config(&self, config: &BridgeConfig) -> LoggingConfig {
        let mut logging = config.logging.clone();
        if self.verbose {
            logging.level = "debug".to_string();
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show repository information
    Info {
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List object types
    Types {
        /// Parent type id; omit for the base types
        parent: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List the children of a folder
    Ls {
        /// Repository path (starting with '/') or object id
        #[arg(default_value = "/")]
        target: String,
        #[arg(long, default_value = "0")]
        skip: i64,
        /// Page size; negative for everything
        #[arg(long, default_value = "-1", allow_negative_numbers = true)]
        max: i64,
        #[arg(long)]
        filter: Option<String>,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the descendants of a folder
    Tree {
        #[arg(default_value = "/")]
        target: String,
        /// Levels to descend; -1 for unlimited
        #[arg(long, default_value = "2", allow_negative_numbers = true)]
        depth: i64,
        /// Only folders
        #[arg(long)]
        folders_only: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show one object
    Get {
        target: String,
        #[arg(long)]
        filter: Option<String>,
        /// Include allowable actions
        #[arg(long)]
        actions: bool,
        /// Include the access control list
        #[arg(long)]
        acl: bool,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the access control list of an object
    Acl {
        target: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Show the parents of an object
    Parents {
        target: String,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print document content
    Cat {
        target: String,
        #[arg(long)]
        offset: Option<u64>,
        #[arg(long)]
        length: Option<u64>,
        /// Write the content to a file instead of printing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run a query statement
    Query {
        statement: String,
        /// indexed or tree-walk (default: configured strategy)
        #[arg(long)]
        strategy: Option<String>,
        #[arg(long, default_value = "0")]
        skip: i64,
        #[arg(long, default_value = "-1", allow_negative_numbers = true)]
        max: i64,
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Create a folder
    Mkdir { parent: String, name: String },
    /// Create a document from a local file
    Put {
        parent: String,
        /// Local file to upload
        file: PathBuf,
        /// Document name (default: the local file name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Move an object into another folder
    Mv { target: String, destination: String },
    /// Rename an object
    Rename { target: String, name: String },
    /// Delete an object
    Rm {
        target: String,
        /// Delete a folder with everything below it
        #[arg(long, short)]
        recursive: bool,
        /// Keep deleting after a failure (with --recursive)
        #[arg(long)]
        continue_on_failure: bool,
    },
    /// Rebuild the metadata index from the file system
    Reindex,
    /// Show the effective configuration as TOML
    Config,
}

/// Command name for logging.
fn command_name(command: &Commands) -> &'static str {
    match command {
        Commands::Info { .. } => "info",
        Commands::Types { .. } => "types",
        Commands::Ls { .. } => "ls",
        Commands::Tree { .. } => "tree",
        Commands::Get { .. } => "get",
        Commands::Acl { .. } => "acl",
        Commands::Parents { .. } => "parents",
        Commands::Cat { .. } => "cat",
        Commands::Query { .. } => "query",
        Commands::Mkdir { .. } => "mkdir",
        Commands::Put { .. } => "put",
        Commands::Mv { .. } => "mv",
        Commands::Rename { .. } => "rename",
        Commands::Rm { .. } => "rm",
        Commands::Reindex => "reindex",
        Commands::Config => "config",
    }
}

/// Resolve a command-line target: a repository path when it starts with
/// '/', an object id otherwise.
pub fn resolve_target(target: &str) -> Result<ObjectId, ApiError> {
    if target.starts_with('/') {
        validate_repo_path(target)?;
        Ok(PathIdentifierCodec::encode_repo_path(target))
    } else {
        Ok(ObjectId::from(target))
    }
}

/// Load configuration for the CLI: an explicit file, or the standard
/// sources for `root` (the current directory when none is given).
pub fn load_config(root: Option<&Path>, config_path: Option<&Path>) -> Result<BridgeConfig, ApiError> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => {
            let cwd = std::env::current_dir().map_err(ApiError::io)?;
            ConfigLoader::load(root.unwrap_or(&cwd))?
        }
    };
    Ok(config)
}

/// CLI context holding the opened repository and the caller
pub struct CliContext {
    repository: Repository,
    call: CallContext,
    config: BridgeConfig,
}

impl CliContext {
    /// Open the repository described by `config` and act as `user`.
    pub fn new(
        config: &BridgeConfig,
        root: Option<&Path>,
        user: Option<String>,
        cmis_version: &str,
    ) -> Result<Self, ApiError> {
        let version = CmisVersion::parse(cmis_version).ok_or_else(|| {
            ApiError::InvalidArgument(format!("Unknown protocol version: {}", cmis_version))
        })?;
        let root = match root {
            Some(root) => root.to_path_buf(),
            None => config.root_or(&std::env::current_dir().map_err(ApiError::io)?),
        };
        let repository = Repository::open(config, Some(&root))?;
        let call = match user.or_else(|| std::env::var("USER").ok()) {
            Some(user) => CallContext::new(user),
            None => CallContext::anonymous(),
        }
        .with_version(version);
        Ok(Self::from_repository(repository, call).with_config(config.clone()))
    }

    pub fn from_repository(repository: Repository, call: CallContext) -> Self {
        Self {
            repository,
            call,
            config: BridgeConfig::default(),
        }
    }

    pub fn with_config(mut self, config: BridgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn repository(&self) -> &Repository {
        &self.repository
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        info!(command = command_name(command), user = ?self.call.username, "Running command");
        let ctx = &self.call;
        let repo = &self.repository;
        match command {
            Commands::Info { format } => {
                let info = repo.repository_info(ctx)?;
                if format == "json" {
                    return to_json(&info);
                }
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.add_row(vec!["Id".to_string(), info.id]);
                table.add_row(vec!["Name".to_string(), info.name]);
                table.add_row(vec!["Description".to_string(), info.description]);
                table.add_row(vec!["Root".to_string(), info.root_path.display().to_string()]);
                table.add_row(vec![
                    "Protocol version".to_string(),
                    info.cmis_version.as_str().to_string(),
                ]);
                table.add_row(vec!["Query strategy".to_string(), info.query_strategy.to_string()]);
                table.add_row(vec![
                    "Indexed objects".to_string(),
                    info.indexed_objects.to_string(),
                ]);
                table.add_row(vec![
                    "Product".to_string(),
                    format!("{} {}", info.product_name, info.product_version),
                ]);
                Ok(format!("{}\n\n{}", section_heading("Repository"), table))
            }
            Commands::Types { parent, format } => {
                let types = repo.type_children(ctx, parent.as_deref())?;
                if format == "json" {
                    return to_json(&types);
                }
                Ok(format_types_text(&types))
            }
            Commands::Ls {
                target,
                skip,
                max,
                filter,
                format,
            } => {
                let request = ObjectRequest {
                    filter: filter.clone(),
                    include_path_segment: true,
                    ..Default::default()
                };
                let page = repo.get_children(ctx, &resolve_target(target)?, &request, *skip, *max)?;
                let page = page.map(|child| child.object);
                if format == "json" {
                    return to_json(&page);
                }
                Ok(format_page_text(&page, "No children."))
            }
            Commands::Tree {
                target,
                depth,
                folders_only,
                format,
            } => {
                let id = resolve_target(target)?;
                let request = ObjectRequest::default().with_path_segment();
                let tree = if *folders_only {
                    repo.get_folder_tree(ctx, &id, Some(*depth), &request)?
                } else {
                    repo.get_descendants(ctx, &id, Some(*depth), &request)?
                };
                if format == "json" {
                    return to_json(&tree);
                }
                let mut out = format!("{}\n", target);
                format_tree_text(&tree, 1, &mut out);
                Ok(out)
            }
            Commands::Get {
                target,
                filter,
                actions,
                acl,
                format,
            } => {
                let request = ObjectRequest {
                    filter: filter.clone(),
                    include_allowable_actions: *actions,
                    include_acl: *acl,
                    include_path_segment: false,
                };
                let object = repo.get_object(ctx, &resolve_target(target)?, &request)?;
                if format == "json" {
                    return to_json(&object);
                }
                Ok(format_object_text(&object))
            }
            Commands::Acl { target, format } => {
                let id = resolve_target(target)?;
                let acl = repo.get_acl(ctx, &id)?;
                let actions = repo.get_allowable_actions(ctx, &id)?;
                if format == "json" {
                    let actions: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
                    return to_json(&serde_json::json!({ "acl": acl, "allowable_actions": actions }));
                }
                let mut table = Table::new();
                table.load_preset(UTF8_BORDERS_ONLY);
                table.set_header(vec!["Principal", "Permissions", "Direct"]);
                for entry in &acl {
                    table.add_row(vec![
                        entry.principal.clone(),
                        entry.permissions.join(", "),
                        entry.direct.to_string(),
                    ]);
                }
                let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
                Ok(format!(
                    "{}\n\n{}\n\n{}\n  {}",
                    section_heading("Access control"),
                    table,
                    section_heading("Allowable actions"),
                    names.join(", ")
                ))
            }
            Commands::Parents { target, format } => {
                let request = ObjectRequest::default().with_path_segment();
                let parents = repo.get_object_parents(ctx, &resolve_target(target)?, &request)?;
                if format == "json" {
                    return to_json(&parents);
                }
                if parents.is_empty() {
                    return Ok("No parents.".to_string());
                }
                let objects: Vec<ObjectData> = parents.into_iter().map(|p| p.object).collect();
                Ok(format_objects_table(&objects).to_string())
            }
            Commands::Cat {
                target,
                offset,
                length,
                out,
            } => {
                let stream = repo.get_content_stream(ctx, &resolve_target(target)?, *offset, *length)?;
                let file_name = stream.file_name.clone();
                let bytes = stream.read_to_vec().map_err(ApiError::io)?;
                match out {
                    Some(path) => {
                        fs::write(path, &bytes).map_err(ApiError::io)?;
                        Ok(format!(
                            "Wrote {} bytes of {} to {}",
                            bytes.len(),
                            file_name,
                            path.display()
                        ))
                    }
                    None => Ok(String::from_utf8_lossy(&bytes).into_owned()),
                }
            }
            Commands::Query {
                statement,
                strategy,
                skip,
                max,
                format,
            } => {
                let request = ObjectRequest::default();
                let page = match strategy {
                    Some(strategy) => {
                        repo.query_with(ctx, statement, &request, *skip, *max, strategy.parse()?)?
                    }
                    None => repo.query(ctx, statement, &request, *skip, *max)?,
                };
                if format == "json" {
                    return to_json(&page);
                }
                Ok(format_page_text(&page, "No matches."))
            }
            Commands::Mkdir { parent, name } => {
                let id = repo.create_folder(ctx, &resolve_target(parent)?, name, None)?;
                Ok(format!("Created folder {} ({})", name, id))
            }
            Commands::Put { parent, file, name } => {
                let name = match name {
                    Some(name) => name.clone(),
                    None => file
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .ok_or_else(|| {
                            ApiError::InvalidArgument(format!(
                                "Cannot take a name from {}",
                                file.display()
                            ))
                        })?,
                };
                let mut source = fs::File::open(file).map_err(ApiError::io)?;
                let id = repo.create_document(
                    ctx,
                    &resolve_target(parent)?,
                    &name,
                    None,
                    Some(&mut source),
                )?;
                Ok(format!("Created document {} ({})", name, id))
            }
            Commands::Mv {
                target,
                destination,
            } => {
                let moved =
                    repo.move_object(ctx, &resolve_target(target)?, &resolve_target(destination)?)?;
                Ok(format!("Moved {} to {}", target, object_path(&moved)))
            }
            Commands::Rename { target, name } => {
                let mut properties = PropertyBag::new();
                properties.insert(ids::NAME, PropertyValue::String(name.clone()));
                let id = repo.update_properties(ctx, &resolve_target(target)?, &properties)?;
                Ok(format!("Renamed {} to {} ({})", target, name, id))
            }
            Commands::Rm {
                target,
                recursive,
                continue_on_failure,
            } => {
                let id = resolve_target(target)?;
                if !*recursive {
                    repo.delete_object(ctx, &id)?;
                    return Ok(format!("Deleted {}", target));
                }
                let failed = repo.delete_tree(ctx, &id, *continue_on_failure)?;
                if failed.is_empty() {
                    return Ok(format!("Deleted {}", target));
                }
                let mut out = format!("Deleted {} with {} failure(s):\n", target, failed.len());
                for id in failed {
                    let path = PathIdentifierCodec::decode_repo_path(&id)
                        .unwrap_or_else(|_| id.to_string());
                    out.push_str(&format!("  {}\n", path));
                }
                Ok(out)
            }
            Commands::Reindex => {
                repo.index().reset()?;
                let indexed = repo.warm_index();
                Ok(format!("Indexed {} object(s)", indexed))
            }
            Commands::Config => self.config.to_toml_string(),
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, ApiError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ApiError::runtime("Failed to render JSON", e.into()))
}

/// Section heading in bold and underline.
fn section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn property_text(properties: &PropertyBag, id: &str) -> String {
    properties
        .get(id)
        .and_then(PropertyValue::as_text)
        .unwrap_or_else(|| "-".to_string())
}

fn object_path(object: &ObjectData) -> String {
    PathIdentifierCodec::decode_repo_path(&object.id).unwrap_or_else(|_| object.id.to_string())
}

fn format_objects_table(objects: &[ObjectData]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Name", "Type", "Size", "Modified", "Path"]);
    for object in objects {
        let name = property_text(&object.properties, ids::NAME);
        let (name, size) = match object.base_type {
            BaseType::Folder => (format!("{}/", name), "-".to_string()),
            BaseType::Document => (
                name,
                property_text(&object.properties, ids::CONTENT_STREAM_LENGTH),
            ),
        };
        table.add_row(vec![
            name,
            object.type_id.clone(),
            size,
            property_text(&object.properties, ids::LAST_MODIFICATION_DATE),
            object_path(object),
        ]);
    }
    table
}

fn format_page_text(page: &Page<ObjectData>, empty: &str) -> String {
    if page.items.is_empty() {
        return empty.to_string();
    }
    let mut out = format!("{}\n", format_objects_table(&page.items));
    out.push_str(&format!(
        "\n{} of {} shown{}",
        page.items.len(),
        page.total_count,
        if page.has_more { ", more available" } else { "" }
    ));
    out
}

fn format_tree_text(nodes: &[ObjectInFolderContainer], level: usize, out: &mut String) {
    for node in nodes {
        let object = &node.object.object;
        let name = node
            .object
            .path_segment
            .clone()
            .unwrap_or_else(|| property_text(&object.properties, ids::NAME));
        let marker = if object.base_type == BaseType::Folder { "/" } else { "" };
        out.push_str(&format!("{}{}{}\n", "  ".repeat(level), name, marker));
        format_tree_text(&node.children, level + 1, out);
    }
}

fn format_object_text(object: &ObjectData) -> String {
    let mut out = format!("{}\n\n", section_heading(&object_path(object)));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Property", "Value"]);
    for (id, value) in object.properties.iter() {
        table.add_row(vec![
            id.to_string(),
            value.as_text().unwrap_or_else(|| "-".to_string()),
        ]);
    }
    out.push_str(&format!("{}\n", table));

    if let Some(actions) = &object.allowable_actions {
        out.push_str(&format!("\n{}\n", section_heading("Allowable actions")));
        let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
        out.push_str(&format!("  {}\n", names.join(", ")));
    }
    if let Some(acl) = &object.acl {
        out.push_str(&format!("\n{}\n", section_heading("Access control")));
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Principal", "Permissions"]);
        for entry in acl {
            table.add_row(vec![entry.principal.clone(), entry.permissions.join(", ")]);
        }
        out.push_str(&format!("{}\n", table));
    }
    out
}

fn format_types_text(types: &[TypeSchema]) -> String {
    if types.is_empty() {
        return "No types found.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Id", "Query name", "Base", "Parent", "Properties"]);
    for schema in types {
        table.add_row(vec![
            schema.id.clone(),
            schema.query_name.clone(),
            schema.base.id().to_string(),
            schema.parent.clone().unwrap_or_else(|| "-".to_string()),
            schema.properties.len().to_string(),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_target() {
        assert_eq!(resolve_target("/").unwrap(), ObjectId::root());
        assert_eq!(
            resolve_target("/U1/representations/rep1/data/a.txt").unwrap(),
            PathIdentifierCodec::encode_repo_path("/U1/representations/rep1/data/a.txt")
        );
        assert_eq!(resolve_target("@root@").unwrap(), ObjectId::root());
        assert!(resolve_target("/U1/../etc").is_err());
    }

    #[test]
    fn test_cli_parses_global_flags() {
        let cli = Cli::try_parse_from([
            "aip-bridge",
            "--root",
            "/srv/aips",
            "--user",
            "alice",
            "ls",
            "/",
            "--max",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.root, Some(PathBuf::from("/srv/aips")));
        assert_eq!(cli.user.as_deref(), Some("alice"));
        assert!(matches!(cli.command, Commands::Ls { max: 10, .. }));
    }

    #[test]
    fn test_logging_overrides() {
        let cli = Cli::try_parse_from(["aip-bridge", "--verbose", "--log-format", "json", "reindex"])
            .unwrap();
        let logging = cli.logging_config(&BridgeConfig::default());
        assert_eq!(logging.level, "debug");
        assert_eq!(logging.format, "json");
        assert_eq!(logging.output, "stderr");
    }
}
