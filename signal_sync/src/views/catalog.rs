//! Source-side view discovery and target-side DDL steps.

use std::collections::{BTreeSet, HashSet};

use diesel::{
    QueryableByName, connection::SimpleConnection, prelude::*, sql_query, sql_types::{BigInt, Text},
};

use crate::{db::ident::Ident, schema::sqlite_master as sm, views::ViewError};

/// Schema every SQLite view lives in.
pub const DEFAULT_SCHEMA: &str = "main";

/// Schemas that always exist and are never created.
const SYSTEM_SCHEMAS: [&str; 2] = ["main", "temp"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceView {
    pub schema: String,
    pub name: String,
}

impl SourceView {
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// User views of the source, optionally restricted to `allow`, ordered by name.
pub fn list_views(conn: &mut SqliteConnection, allow: &[String]) -> QueryResult<Vec<SourceView>> {
    let mut query = sm::table
        .filter(sm::object_type.eq("view"))
        .filter(sm::name.not_like("sqlite_%"))
        .select(sm::name)
        .order(sm::name.asc())
        .into_boxed();
    if !allow.is_empty() {
        query = query.filter(sm::name.eq_any(allow));
    }
    let names: Vec<String> = query.load(conn)?;
    Ok(names
        .into_iter()
        .map(|name| SourceView {
            schema: DEFAULT_SCHEMA.to_string(),
            name,
        })
        .collect())
}

/// Names of every user table and view in the source.
pub fn object_names(conn: &mut SqliteConnection) -> QueryResult<Vec<String>> {
    sm::table
        .filter(sm::object_type.eq_any(["table", "view"]))
        .filter(sm::name.not_like("sqlite_%"))
        .select(sm::name)
        .order(sm::name.asc())
        .load(conn)
}

/// The stored `CREATE VIEW` statement for `view`.
///
/// A body that does not start with `CREATE` is wrapped as
/// `CREATE VIEW "schema"."name" AS ...`.
pub fn view_definition(conn: &mut SqliteConnection, view: &SourceView) -> Result<String, ViewError> {
    let stored: Option<Option<String>> = sm::table
        .filter(sm::object_type.eq("view"))
        .filter(sm::name.eq(&view.name))
        .select(sm::sql)
        .first(conn)
        .optional()?;
    let body = stored
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ViewError::NotFound(view.qualified()))?;

    if body.to_ascii_uppercase().starts_with("CREATE") {
        return Ok(body);
    }
    let schema = Ident::parse(&view.schema)?;
    let name = Ident::parse(&view.name)?;
    Ok(format!("CREATE VIEW {schema}.{name} AS\n{body}"))
}

/// Other source objects the definition mentions, as `main.<name>`, sorted.
///
/// Informational only: views are created in name order regardless.
pub fn view_dependencies(definition: &str, view: &str, objects: &[String]) -> Vec<String> {
    let tokens: HashSet<String> = definition
        .split(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_lowercase)
        .collect();
    objects
        .iter()
        .filter(|o| !o.eq_ignore_ascii_case(view))
        .filter(|o| tokens.contains(&o.to_ascii_lowercase()))
        .map(|o| format!("{DEFAULT_SCHEMA}.{o}"))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(QueryableByName)]
struct Present {
    #[diesel(sql_type = BigInt)]
    present: i64,
}

/// Check that `schema` is usable on the target.
///
/// SQLite has no `CREATE SCHEMA`; a schema is an attached database. System schemas
/// pass, anything else must already be attached.
pub fn ensure_schema(conn: &mut SqliteConnection, schema: &str) -> Result<(), ViewError> {
    if SYSTEM_SCHEMAS.iter().any(|s| s.eq_ignore_ascii_case(schema)) {
        return Ok(());
    }
    let schema = Ident::parse(schema)?;
    let row: Present = sql_query(
        "SELECT COUNT(*) AS present FROM pragma_database_list WHERE name = ? COLLATE NOCASE",
    )
    .bind::<Text, _>(schema.as_str())
    .get_result(conn)?;
    if row.present == 0 {
        return Err(ViewError::MissingSchema(schema.as_str().to_string()));
    }
    Ok(())
}

pub fn drop_view(conn: &mut SqliteConnection, view: &SourceView) -> Result<(), ViewError> {
    let schema = Ident::parse(&view.schema)?;
    let name = Ident::parse(&view.name)?;
    conn.batch_execute(&format!("DROP VIEW IF EXISTS {schema}.{name}"))?;
    Ok(())
}

pub fn create_view(conn: &mut SqliteConnection, definition: &str) -> Result<(), ViewError> {
    conn.batch_execute(definition)?;
    Ok(())
}
