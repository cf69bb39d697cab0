// Copyright (C) 2024-2026 Fred Clausen and the ratatui project contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! # xtask - Project Automation
//!
//! - `cargo xtask ci` runs lint, build, test and migration verification
//! - `cargo xtask verify-migrations` applies the persistence migrations to
//!   an in-memory `SQLite` database and checks the result against the Diesel
//!   schema the persistence crate is compiled with

#![deny(
    clippy::pedantic,
    //clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

use std::{io, process::Output};

use cargo_metadata::MetadataCommand;
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use color_eyre::{Result, eyre::Context};
use diesel::sql_types::{Integer, Text};
use diesel::{QueryableByName, RunQueryDsl, SqliteConnection};
use duct::cmd;
use std::collections::BTreeMap;
use tracing::level_filters::LevelFilter;
use tracing_log::AsTrace;

const DIESEL_SCHEMA: &str = include_str!("../../crates/persistence/src/diesel_schema.rs");

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(args.log_level())
        .without_time()
        .init();

    match args.run() {
        Ok(()) => (),
        Err(err) => {
            tracing::error!("{err}");
            std::process::exit(1);
        }
    }
    Ok(())
}

#[derive(Debug, Parser)]
#[command(bin_name = "cargo xtask", styles = clap_cargo::style::CLAP_STYLING)]
struct Args {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    verbosity: Verbosity<InfoLevel>,
}

impl Args {
    fn run(self) -> Result<()> {
        self.command.run()
    }

    fn log_level(&self) -> LevelFilter {
        self.verbosity.log_level_filter().as_trace()
    }
}

#[derive(Clone, Debug, Subcommand)]
enum Command {
    /// Run CI checks (lint, build, test, migrations)
    CI,

    /// Build the project
    #[command(visible_alias = "b")]
    Build,

    /// Run cargo check
    #[command(visible_alias = "c")]
    Check,

    /// Check for unused dependencies
    #[command(visible_alias = "m")]
    Machete,

    /// Lint clippy, docs and formatting
    #[command(visible_alias = "l")]
    Lint,

    /// Run clippy on the project
    #[command(visible_alias = "cl")]
    LintClippy,

    /// Check documentation for errors and warnings
    #[command(visible_alias = "d")]
    LintDocs,

    /// Check for formatting issues in the project
    #[command(visible_alias = "lf")]
    LintFormatting,

    /// Fix clippy warnings in the project
    #[command(visible_alias = "fc")]
    FixClippy,

    /// Fix formatting issues in the project
    #[command(visible_alias = "fmt")]
    FixFormatting,

    /// Run tests
    #[command(visible_alias = "t")]
    Test,

    /// Run doc tests
    #[command(visible_alias = "td")]
    TestDocs,

    /// Run lib tests
    #[command(visible_alias = "tl")]
    TestLibs,

    /// Check the migrations against the Diesel schema
    #[command(visible_alias = "vm")]
    VerifyMigrations,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Self::CI => ci(),
            Self::Build => build(),
            Self::Check => check(),
            Self::Machete => machete(),
            Self::Lint => lint(),
            Self::LintClippy => lint_clippy(),
            Self::LintDocs => lint_docs(),
            Self::LintFormatting => lint_format(),
            Self::FixClippy => fix_clippy(),
            Self::FixFormatting => fix_format(),
            Self::Test => test(),
            Self::TestDocs => test_docs(),
            Self::TestLibs => test_libs(),
            Self::VerifyMigrations => verify_migrations(),
        }
    }
}

/// Run CI checks (lint, build, test, migrations)
fn ci() -> Result<()> {
    lint()?;
    machete()?;
    build()?;
    test()?;
    verify_migrations()?;
    Ok(())
}

fn machete() -> Result<()> {
    cmd!("cargo-machete").run_with_trace()?;
    Ok(())
}

/// Build the project
fn build() -> Result<()> {
    run_cargo(vec!["build", "--all-targets", "--all-features"])
}

/// Run cargo check
fn check() -> Result<()> {
    run_cargo(vec!["check", "--all-targets", "--all-features"])
}

/// Lint clippy, docs and formatting
fn lint() -> Result<()> {
    lint_clippy()?;
    lint_docs()?;
    lint_format()
}

/// Run clippy on the project
fn lint_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--",
        "-D",
        "warnings",
    ])
}

/// Fix clippy warnings in the project
fn fix_clippy() -> Result<()> {
    run_cargo(vec![
        "clippy",
        "--all-targets",
        "--all-features",
        "--fix",
        "--allow-dirty",
        "--allow-staged",
        "--",
        "-D",
        "warnings",
    ])
}

/// Check that docs build without errors using docs.rs-equivalent flags
fn lint_docs() -> Result<()> {
    let meta = MetadataCommand::new()
        .exec()
        .wrap_err("failed to get cargo metadata")?;

    for package in meta.workspace_default_packages() {
        cmd(
            "cargo",
            [
                "doc",
                "--no-deps",
                "--all-features",
                "--package",
                &package.name,
            ],
        )
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .env("RUSTDOCFLAGS", "--cfg docsrs -D warnings")
        .run_with_trace()?;
    }

    Ok(())
}

/// Lint formatting issues in the project
fn lint_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all", "--check"])
}

/// Fix formatting issues in the project
fn fix_format() -> Result<()> {
    run_cargo_nightly(vec!["fmt", "--all"])
}

/// Run lib and doc tests
fn test() -> Result<()> {
    test_libs()?;
    test_docs()?; // run last because it's slow
    Ok(())
}

/// Run doc tests for the workspace's default packages
fn test_docs() -> Result<()> {
    run_cargo(vec!["test", "--doc", "--all-features"])
}

/// Run lib tests for the workspace's default packages
fn test_libs() -> Result<()> {
    run_cargo(vec!["test", "--all-targets", "--all-features"])
}

/// Run a cargo subcommand with the default toolchain
fn run_cargo(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args).run_with_trace()?;
    Ok(())
}

/// Run a cargo subcommand with the nightly toolchain
fn run_cargo_nightly(args: Vec<&str>) -> Result<()> {
    cmd("cargo", args)
        // CARGO env var is set because we're running in a cargo subcommand
        .env_remove("CARGO")
        .env("RUSTUP_TOOLCHAIN", "nightly")
        .run_with_trace()?;
    Ok(())
}

// ============================================================================
// Migration verification
// ============================================================================

/// Verify the persistence migrations.
///
/// 1. Applies every migration to an in-memory `SQLite` database
/// 2. Introspects the resulting tables and columns
/// 3. Compares them with the `diesel::table!` declarations the
///    persistence crate is compiled against
/// 4. Reverts every migration and checks that no table is left behind
fn verify_migrations() -> Result<()> {
    use diesel::Connection;
    use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};

    const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../crates/persistence/migrations");

    tracing::info!("Applying migrations to an in-memory database");
    let mut conn = SqliteConnection::establish(":memory:")
        .wrap_err("Failed to create SQLite in-memory database")?;
    diesel::sql_query("PRAGMA foreign_keys = ON")
        .execute(&mut conn)
        .wrap_err("Failed to enable foreign keys on SQLite")?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to apply migrations: {e}"))?;

    let migrated: Schema = introspect_sqlite_schema(&mut conn)?;
    let declared: Schema = parse_diesel_schema(DIESEL_SCHEMA)?;
    compare_schemas(&migrated, &declared)?;
    tracing::info!(tables = migrated.tables.len(), "Migrations match the Diesel schema");

    conn.revert_all_migrations(MIGRATIONS)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to revert migrations: {e}"))?;
    let reverted: Schema = introspect_sqlite_schema(&mut conn)?;
    if !reverted.tables.is_empty() {
        return Err(color_eyre::eyre::eyre!(
            "Down migrations left tables behind: {:?}",
            reverted.tables.keys().collect::<Vec<_>>()
        ));
    }

    tracing::info!("✓ Migration verification passed");
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Schema {
    tables: BTreeMap<String, Table>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Table {
    columns: BTreeMap<String, Column>,
    primary_keys: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Column {
    normalized_type: String,
    nullable: bool,
}

fn introspect_sqlite_schema(conn: &mut SqliteConnection) -> Result<Schema> {
    #[derive(QueryableByName)]
    struct TableName {
        #[diesel(sql_type = Text)]
        name: String,
    }

    #[derive(QueryableByName)]
    struct ColumnInfo {
        #[diesel(sql_type = Text)]
        name: String,
        #[diesel(sql_type = Text)]
        r#type: String,
        #[diesel(sql_type = Integer)]
        notnull: i32,
        #[diesel(sql_type = Integer)]
        pk: i32,
    }

    let mut schema = Schema::default();

    let tables: Vec<TableName> = diesel::sql_query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '__diesel_schema_migrations' ORDER BY name",
    )
    .load(conn)
    .wrap_err("Failed to query SQLite tables")?;

    for table in tables {
        let mut columns: Vec<ColumnInfo> =
            diesel::sql_query(format!("PRAGMA table_info({})", table.name))
                .load(conn)
                .wrap_err(format!("Failed to get columns for table {}", table.name))?;
        // Composite keys report their position in `pk`.
        columns.sort_by_key(|c| c.pk);

        let mut table_info = Table::default();
        for col in columns {
            if col.pk > 0 {
                table_info.primary_keys.push(col.name.clone());
            }
            table_info.columns.insert(
                col.name,
                Column {
                    normalized_type: normalize_sqlite_type(&col.r#type),
                    nullable: col.notnull == 0 && col.pk == 0,
                },
            );
        }
        schema.tables.insert(table.name, table_info);
    }

    Ok(schema)
}

fn normalize_sqlite_type(sqlite_type: &str) -> String {
    let upper = sqlite_type.to_uppercase();
    if upper.contains("INT") {
        "integer".to_string()
    } else if upper.contains("CHAR") || upper.contains("TEXT") || upper.contains("CLOB") {
        "text".to_string()
    } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
        "real".to_string()
    } else {
        upper.to_lowercase()
    }
}

fn normalize_diesel_type(diesel_type: &str) -> (String, bool) {
    let trimmed = diesel_type.trim();
    let (inner, nullable) = trimmed
        .strip_prefix("Nullable<")
        .and_then(|rest| rest.strip_suffix('>'))
        .map_or((trimmed, false), |inner| (inner, true));
    let normalized = match inner {
        "BigInt" | "Integer" | "SmallInt" | "Bool" => "integer",
        "Text" | "Timestamp" | "Date" => "text",
        "Double" | "Float" => "real",
        other => return (other.to_lowercase(), nullable),
    };
    (normalized.to_string(), nullable)
}

/// Reads the `diesel::table!` blocks of a generated schema file.
fn parse_diesel_schema(source: &str) -> Result<Schema> {
    let mut schema = Schema::default();
    let mut current: Option<(String, Table)> = None;

    for line in source.lines().map(str::trim) {
        if let Some((name, mut table)) = current.take() {
            if line == "}" {
                schema.tables.insert(name, table);
                continue;
            }
            if let Some((column, ty)) = line.trim_end_matches(',').split_once("->") {
                let (normalized_type, nullable) = normalize_diesel_type(ty);
                table.columns.insert(
                    column.trim().to_string(),
                    Column {
                        normalized_type,
                        nullable,
                    },
                );
            }
            current = Some((name, table));
            continue;
        }

        // Table headers look like `name (key, key) {`.
        let Some((name, keys)) = line
            .strip_suffix('{')
            .and_then(|header| header.trim().split_once('('))
        else {
            continue;
        };
        if name.trim().starts_with("diesel") {
            continue;
        }
        let table = Table {
            columns: BTreeMap::new(),
            primary_keys: keys
                .trim_end_matches(')')
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        };
        current = Some((name.trim().to_string(), table));
    }

    if schema.tables.is_empty() {
        return Err(color_eyre::eyre::eyre!("No tables found in the Diesel schema"));
    }
    Ok(schema)
}

fn compare_schemas(migrated: &Schema, declared: &Schema) -> Result<()> {
    let mut errors: Vec<String> = Vec::new();

    for name in declared.tables.keys() {
        if !migrated.tables.contains_key(name) {
            errors.push(format!("Table '{name}' is declared but not created by the migrations"));
        }
    }

    for (name, table) in &migrated.tables {
        let Some(expected) = declared.tables.get(name) else {
            errors.push(format!("Table '{name}' is created but missing from the Diesel schema"));
            continue;
        };

        if table.primary_keys != expected.primary_keys {
            errors.push(format!(
                "Table '{name}' primary key mismatch: migrations {:?}, schema {:?}",
                table.primary_keys, expected.primary_keys
            ));
        }

        for (column, actual) in &table.columns {
            match expected.columns.get(column) {
                None => errors.push(format!("Column '{name}.{column}' missing from the Diesel schema")),
                Some(wanted) if wanted != actual => errors.push(format!(
                    "Column '{name}.{column}' mismatch: migrations {actual:?}, schema {wanted:?}"
                )),
                Some(_) => {}
            }
        }
        for column in expected.columns.keys() {
            if !table.columns.contains_key(column) {
                errors.push(format!("Column '{name}.{column}' is declared but not created"));
            }
        }
    }

    if errors.is_empty() {
        return Ok(());
    }
    for error in &errors {
        tracing::error!("{error}");
    }
    Err(color_eyre::eyre::eyre!(
        "Schema verification failed with {} error(s)",
        errors.len()
    ))
}

/// An extension trait for `duct::Expression` that logs the command being run
/// before running it.
trait ExpressionExt {
    /// Run the command and log the command being run
    fn run_with_trace(&self) -> io::Result<Output>;
}

impl ExpressionExt for duct::Expression {
    fn run_with_trace(&self) -> io::Result<Output> {
        tracing::info!("running command: {:?}", self);
        self.run().inspect_err(|_| {
            // The command that was run may have scrolled off the screen, so repeat it here
            tracing::error!("failed to run command: {:?}", self);
        })
    }
}
