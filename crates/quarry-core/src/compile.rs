//! Compiles descriptors into SQL text plus ordered parameters.
//!
//! Compilation is pure and deterministic: the same descriptor and dialect
//! always yield the same SQL and the same parameter list. Statements use
//! `?` placeholders; values never appear in the SQL text except for join
//! filters and coalesce defaults, which are escaped.

use crate::condition::{column_reference, quote_identifier, quote_table, ColumnDefinition};
use crate::dialect::Dialect;
use crate::error::{Error, Result};
use crate::schema::{Order, Schema, SchemaKind};
use crate::value::SqlValue;

/// SQL text and its parameters, in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Bound values.
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Creates a statement.
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

/// One SQL text executed once per parameter row.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStatement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// One parameter list per execution.
    pub rows: Vec<Vec<SqlValue>>,
}

/// Compiles an executable descriptor into the statements it runs, in order.
///
/// Most kinds produce one statement; alter and modify produce one per column.
///
/// # Errors
///
/// Returns [`Error::NotExecutable`] for select kinds, and validation or
/// dialect errors otherwise.
pub fn statements(schema: &Schema, dialect: &dyn Dialect) -> Result<Vec<Statement>> {
    schema.validate()?;
    let statement = match schema.kind {
        SchemaKind::Create => create_table(schema, dialect),
        SchemaKind::Alter => return Ok(alter_table(schema, dialect)),
        SchemaKind::Modify => return modify_columns(schema, dialect),
        SchemaKind::Rename => rename_table(schema)?,
        SchemaKind::Drop => {
            Statement::new(format!("DROP TABLE {}", quote_table(&schema.table)), Vec::new())
        }
        SchemaKind::CreateIndex => create_index(schema),
        SchemaKind::Insert => insert(schema),
        SchemaKind::InsertAll => insert_all(schema)?,
        SchemaKind::Update => update(schema),
        SchemaKind::Delete => delete(schema),
        SchemaKind::Upsert => upsert_rows(std::slice::from_ref(schema), dialect)?,
        SchemaKind::Select | SchemaKind::SelectCount => {
            return Err(Error::NotExecutable(schema.table.clone()));
        }
    };
    Ok(vec![statement])
}

fn create_table(schema: &Schema, dialect: &dyn Dialect) -> Statement {
    let mut parts: Vec<String> = schema
        .columns
        .iter()
        .map(|c| dialect.column_definition(c))
        .collect();
    let inline_key = schema.columns.iter().any(|c| dialect.inlines_primary_key(c));
    if !schema.primary_keys.is_empty() && !inline_key {
        parts.push(format!("PRIMARY KEY ({})", schema.primary_keys.join(", ")));
    }
    parts.extend(schema.foreign_keys.iter().cloned());
    Statement::new(
        format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            quote_table(&schema.table),
            parts.join(", ")
        ),
        Vec::new(),
    )
}

/// One `ADD COLUMN` per column; added columns are forced nullable so
/// existing rows stay valid.
fn alter_table(schema: &Schema, dialect: &dyn Dialect) -> Vec<Statement> {
    let table = quote_table(&schema.table);
    schema
        .columns
        .iter()
        .map(|column| {
            let column = ColumnDefinition {
                nullable: true,
                ..column.clone()
            };
            Statement::new(
                format!(
                    "ALTER TABLE {table} ADD COLUMN {}",
                    dialect.column_definition(&column)
                ),
                Vec::new(),
            )
        })
        .collect()
}

fn modify_columns(schema: &Schema, dialect: &dyn Dialect) -> Result<Vec<Statement>> {
    schema
        .columns
        .iter()
        .map(|column| {
            dialect
                .modify_column(&schema.table, column)
                .map(|sql| Statement::new(sql, Vec::new()))
        })
        .collect()
}

fn rename_table(schema: &Schema) -> Result<Statement> {
    let target = schema
        .target_table
        .as_deref()
        .ok_or_else(|| Error::invalid(&schema.table, "rename needs a target table"))?;
    Ok(Statement::new(
        format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_table(&schema.table),
            quote_table(target)
        ),
        Vec::new(),
    ))
}

fn create_index(schema: &Schema) -> Statement {
    let column = &schema.columns[0];
    let index = format!("idx_{}_{}", schema.table.replace('.', "_"), column.name);
    Statement::new(
        format!(
            "CREATE INDEX {} ON {} ({})",
            quote_identifier(&index),
            quote_table(&schema.table),
            column.quoted_name()
        ),
        Vec::new(),
    )
}

fn quoted_names<'a>(columns: impl Iterator<Item = &'a ColumnDefinition>) -> Vec<String> {
    columns.map(ColumnDefinition::quoted_name).collect()
}

fn placeholders(count: usize) -> String {
    format!("({})", vec!["?"; count].join(", "))
}

fn insert(schema: &Schema) -> Statement {
    let names = quoted_names(schema.columns.iter());
    Statement::new(
        format!(
            "INSERT INTO {} ({}) VALUES {}",
            quote_table(&schema.table),
            names.join(", "),
            placeholders(names.len())
        ),
        schema.columns.iter().map(ColumnDefinition::bound_value).collect(),
    )
}

fn insert_all(schema: &Schema) -> Result<Statement> {
    let target = schema
        .target_table
        .as_deref()
        .ok_or_else(|| Error::invalid(&schema.table, "insert all needs a target table"))?;
    let names = quoted_names(schema.columns.iter().filter(|c| !c.auto_increment)).join(", ");
    Ok(Statement::new(
        format!(
            "INSERT INTO {} ({names}) SELECT {names} FROM {}",
            quote_table(target),
            quote_table(&schema.table)
        ),
        Vec::new(),
    ))
}

/// ` WHERE a AND b`, or nothing without predicates.
fn where_sql(schema: &Schema) -> String {
    if schema.predicates.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = schema.predicates.iter().map(|p| p.render()).collect();
    format!(" WHERE {}", rendered.join(" AND "))
}

/// Predicate values in rendering order; a second pass over the same list
/// [`where_sql`] walks.
fn predicate_values(schema: &Schema, out: &mut Vec<SqlValue>) {
    for predicate in &schema.predicates {
        predicate.collect_values(out);
    }
}

fn joins_sql(schema: &Schema) -> String {
    schema
        .joins
        .iter()
        .map(|j| format!(" {}", j.render()))
        .collect()
}

/// SET values first, predicate values after.
fn update_params(schema: &Schema) -> Vec<SqlValue> {
    let mut params: Vec<SqlValue> =
        schema.columns.iter().map(ColumnDefinition::bound_value).collect();
    predicate_values(schema, &mut params);
    params
}

fn update_sql(schema: &Schema) -> String {
    let assignments = schema
        .columns
        .iter()
        .map(|c| format!("{} = ?", c.quoted_name()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "UPDATE {}{} SET {assignments}{}",
        quote_table(&schema.table),
        joins_sql(schema),
        where_sql(schema)
    )
}

fn update(schema: &Schema) -> Statement {
    Statement::new(update_sql(schema), update_params(schema))
}

fn delete(schema: &Schema) -> Statement {
    let mut params = Vec::new();
    predicate_values(schema, &mut params);
    Statement::new(
        format!("DELETE FROM {}{}", quote_table(&schema.table), where_sql(schema)),
        params,
    )
}

/// Compiles a select descriptor.
///
/// # Errors
///
/// Returns [`Error::InvalidSchema`] if the descriptor is not a select.
pub fn select(schema: &Schema) -> Result<Statement> {
    schema.validate()?;
    if schema.kind != SchemaKind::Select {
        return Err(Error::invalid(&schema.table, "not a select descriptor"));
    }
    let projection = if schema.projections.is_empty() {
        String::from("*")
    } else {
        schema
            .projections
            .iter()
            .map(|p| p.render())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut sql = format!(
        "SELECT {}{projection} FROM {}{}{}",
        if schema.distinct { "DISTINCT " } else { "" },
        quote_table(&schema.table),
        joins_sql(schema),
        where_sql(schema)
    );
    if !schema.order_by.is_empty() {
        let order = schema
            .order_by
            .iter()
            .map(|(column, direction)| {
                let column = match column.rsplit_once('.') {
                    Some((prefix, name)) => column_reference(Some(&quote_table(prefix)), name),
                    None => quote_identifier(column),
                };
                match direction {
                    Order::Asc => format!("{column} ASC"),
                    Order::Desc => format!("{column} DESC"),
                }
            })
            .collect::<Vec<_>>()
            .join(", ");
        sql.push_str(" ORDER BY ");
        sql.push_str(&order);
    }
    let mut params = Vec::new();
    predicate_values(schema, &mut params);
    Ok(Statement::new(sql, params))
}

/// Compiles `SELECT COUNT(*)` over the descriptor's predicates.
///
/// Joins, projections and ordering are not rendered.
///
/// # Errors
///
/// Returns [`Error::InvalidSchema`] for a descriptor that is not a select
/// or select-count.
pub fn select_count(schema: &Schema) -> Result<Statement> {
    schema.validate()?;
    if !matches!(schema.kind, SchemaKind::Select | SchemaKind::SelectCount) {
        return Err(Error::invalid(&schema.table, "not a select descriptor"));
    }
    let mut params = Vec::new();
    predicate_values(schema, &mut params);
    Ok(Statement::new(
        format!("SELECT COUNT(*) FROM {}{}", quote_table(&schema.table), where_sql(schema)),
        params,
    ))
}

/// Checks that every row targets the first row's table and declares the
/// same columns in the same order.
fn check_batch(schemas: &[Schema], kind: SchemaKind) -> Result<()> {
    let Some(first) = schemas.first() else {
        return Ok(());
    };
    for (index, schema) in schemas.iter().enumerate() {
        schema.validate()?;
        if schema.kind != kind {
            return Err(Error::invalid(
                &schema.table,
                format!(
                    "batch row {index} is a {} descriptor, expected {}",
                    schema.kind.as_str(),
                    kind.as_str()
                ),
            ));
        }
        if schema.table != first.table {
            return Err(Error::invalid(
                &schema.table,
                format!("batch row {index} targets a different table than `{}`", first.table),
            ));
        }
        let same_shape = schema.columns.len() == first.columns.len()
            && schema
                .columns
                .iter()
                .zip(&first.columns)
                .all(|(a, b)| a.name == b.name);
        if !same_shape {
            return Err(Error::invalid(
                &schema.table,
                format!("batch row {index} declares different columns than the first row"),
            ));
        }
    }
    Ok(())
}

fn multi_row_insert(
    schemas: &[Schema],
    keep: impl Fn(&ColumnDefinition) -> bool + Copy,
) -> (String, Vec<String>, Vec<SqlValue>) {
    let first = &schemas[0];
    let names = quoted_names(first.columns.iter().filter(|c| keep(*c)));
    let tuple = placeholders(names.len());
    let tuples = vec![tuple.as_str(); schemas.len()].join(", ");
    let params = schemas
        .iter()
        .flat_map(|s| s.columns.iter().filter(move |c| keep(*c)))
        .map(ColumnDefinition::bound_value)
        .collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES {tuples}",
        quote_table(&first.table),
        names.join(", ")
    );
    (sql, names, params)
}

/// One multi-row `INSERT`. Returns `None` for an empty batch.
///
/// # Errors
///
/// Returns [`Error::InvalidSchema`] when rows differ in table or columns.
pub fn insert_batch(schemas: &[Schema]) -> Result<Option<Statement>> {
    check_batch(schemas, SchemaKind::Insert)?;
    if schemas.is_empty() {
        return Ok(None);
    }
    let (sql, _, params) = multi_row_insert(schemas, |_| true);
    Ok(Some(Statement::new(sql, params)))
}

fn upsert_rows(schemas: &[Schema], dialect: &dyn Dialect) -> Result<Statement> {
    let first = &schemas[0];
    let (mut sql, names, params) = multi_row_insert(schemas, |c| !c.auto_increment);
    let mut conflict: Vec<String> = first
        .columns
        .iter()
        .filter(|c| c.primary_key && !c.auto_increment)
        .map(ColumnDefinition::quoted_name)
        .collect();
    // Each unique column is its own constraint; SQLite accepts one target.
    if conflict.is_empty() {
        conflict.extend(
            first
                .columns
                .iter()
                .find(|c| c.unique)
                .map(ColumnDefinition::quoted_name),
        );
    }
    sql.push_str(&dialect.upsert_clause(&first.table, &conflict, &names)?);
    Ok(Statement::new(sql, params))
}

/// One multi-row upsert. Auto-increment columns are left out. Returns
/// `None` for an empty batch.
///
/// # Errors
///
/// Returns [`Error::InvalidSchema`] when rows differ in table or columns, or
/// when the dialect needs a conflict target and the rows declare none.
pub fn upsert_batch(schemas: &[Schema], dialect: &dyn Dialect) -> Result<Option<Statement>> {
    check_batch(schemas, SchemaKind::Upsert)?;
    if schemas.is_empty() {
        return Ok(None);
    }
    upsert_rows(schemas, dialect).map(Some)
}

/// The first row's `UPDATE` text with one parameter row per descriptor:
/// that row's SET values followed by its predicate values.
///
/// # Errors
///
/// Returns [`Error::InvalidSchema`] when rows differ in table, columns, or
/// predicate shape.
pub fn update_batch(schemas: &[Schema]) -> Result<Option<BatchStatement>> {
    check_batch(schemas, SchemaKind::Update)?;
    let Some(first) = schemas.first() else {
        return Ok(None);
    };
    let sql = update_sql(first);
    for (index, schema) in schemas.iter().enumerate() {
        if update_sql(schema) != sql {
            return Err(Error::invalid(
                &schema.table,
                format!("batch row {index} renders a different UPDATE than the first row"),
            ));
        }
    }
    Ok(Some(BatchStatement {
        sql,
        rows: schemas.iter().map(update_params).collect(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, SqliteDialect};

    fn users() -> Schema {
        Schema::create("users", |t| {
            t.auto_increment("id");
            t.string("name", 50);
            t.integer("age");
        })
    }

    fn single(schema: &Schema, dialect: &dyn Dialect) -> Statement {
        let mut statements = statements(schema, dialect).unwrap();
        assert_eq!(statements.len(), 1);
        statements.remove(0)
    }

    #[test]
    fn test_create_sqlite_inlines_primary_key() {
        assert_eq!(
            single(&users(), &SqliteDialect::new()).sql,
            "CREATE TABLE IF NOT EXISTS `users` (`id` INTEGER PRIMARY KEY AUTOINCREMENT, \
             `name` VARCHAR(50) NOT NULL, `age` INT NOT NULL)"
        );
    }

    #[test]
    fn test_create_mysql_has_table_level_primary_key() {
        assert_eq!(
            single(&users(), &MySqlDialect::new()).sql,
            "CREATE TABLE IF NOT EXISTS `users` (`id` INT AUTO_INCREMENT NOT NULL, \
             `name` VARCHAR(50) NOT NULL, `age` INT NOT NULL, PRIMARY KEY (`id`))"
        );
    }

    #[test]
    fn test_create_with_foreign_key() {
        let schema = Schema::create("orders", |t| {
            t.auto_increment_big_int("id");
            t.big_int("user_id").foreign_key("users");
        });
        assert_eq!(
            single(&schema, &MySqlDialect::new()).sql,
            "CREATE TABLE IF NOT EXISTS `orders` (`id` BIGINT AUTO_INCREMENT NOT NULL, \
             `user_id` BIGINT NOT NULL, PRIMARY KEY (`id`), \
             FOREIGN KEY (`user_id`) REFERENCES `users`(`user_id`) ON DELETE CASCADE)"
        );
    }

    #[test]
    fn test_create_is_deterministic() {
        let dialect = SqliteDialect::new();
        assert_eq!(single(&users(), &dialect), single(&users(), &dialect));
    }

    #[test]
    fn test_alter_forces_nullable() {
        let schema = Schema::alter("users", |t| {
            t.string("email", 255);
            t.boolean("active");
        });
        let sql: Vec<String> = statements(&schema, &SqliteDialect::new())
            .unwrap()
            .into_iter()
            .map(|s| s.sql)
            .collect();
        assert_eq!(
            sql,
            [
                "ALTER TABLE `users` ADD COLUMN `email` VARCHAR(255) NULL",
                "ALTER TABLE `users` ADD COLUMN `active` BOOLEAN NULL",
            ]
        );
    }

    #[test]
    fn test_insert_binds_in_column_order() {
        let schema = Schema::insert("users", |t| {
            t.string_value("name", "a");
            t.big_int_value("age", 1);
        });
        let statement = single(&schema, &SqliteDialect::new());
        assert_eq!(statement.sql, "INSERT INTO `users` (`name`, `age`) VALUES (?, ?)");
        assert_eq!(
            statement.params,
            vec![SqlValue::Text(String::from("a")), SqlValue::Int(1)]
        );
    }

    #[test]
    fn test_update_binds_set_then_where() {
        let mut schema = Schema::update("users", |t| {
            t.string_value("name", "b");
            t.big_int_value("age", 2);
        });
        schema.where_eq("id", 7).where_op("age", "<", 99);
        let statement = single(&schema, &SqliteDialect::new());
        assert_eq!(
            statement.sql,
            "UPDATE `users` SET `name` = ?, `age` = ? WHERE `id` = ? AND `age` < ?"
        );
        assert_eq!(
            statement.params,
            vec![
                SqlValue::Text(String::from("b")),
                SqlValue::Int(2),
                SqlValue::Int(7),
                SqlValue::Int(99)
            ]
        );
    }

    #[test]
    fn test_delete() {
        let mut schema = Schema::delete("users", |_| {});
        schema.where_null("email");
        let statement = single(&schema, &SqliteDialect::new());
        assert_eq!(statement.sql, "DELETE FROM `users` WHERE `email` IS NULL");
        assert!(statement.params.is_empty());
    }

    #[test]
    fn test_upsert_sqlite_uses_unique_column_as_target() {
        let schema = Schema::upsert("users", |t| {
            t.string_value("username", "x").unique();
            t.string_value("email", "e1");
        });
        assert_eq!(
            single(&schema, &SqliteDialect::new()).sql,
            "INSERT INTO `users` (`username`, `email`) VALUES (?, ?) \
             ON CONFLICT (`username`) DO UPDATE SET `username` = excluded.`username`, \
             `email` = excluded.`email`"
        );
    }

    #[test]
    fn test_upsert_sqlite_targets_first_of_several_unique_columns() {
        let schema = Schema::upsert("accounts", |t| {
            t.string_value("username", "u").unique();
            t.string_value("email", "e").unique();
        });
        let sql = single(&schema, &SqliteDialect::new()).sql;
        assert!(sql.contains(" ON CONFLICT (`username`) DO UPDATE SET "), "{sql}");
    }

    #[test]
    fn test_upsert_skips_auto_increment() {
        let schema = Schema::upsert("users", |t| {
            t.auto_increment("id").value(5);
            t.string_value("username", "x").unique();
        });
        let statement = single(&schema, &MySqlDialect::new());
        assert_eq!(
            statement.sql,
            "INSERT INTO `users` (`username`) VALUES (?) \
             ON DUPLICATE KEY UPDATE `username` = VALUES(`username`)"
        );
        assert_eq!(statement.params, vec![SqlValue::Text(String::from("x"))]);
    }

    #[test]
    fn test_select_is_not_executable() {
        let result = statements(&Schema::select("users"), &SqliteDialect::new());
        assert!(matches!(result, Err(Error::NotExecutable(_))));
    }

    #[test]
    fn test_select_with_join_projection_and_order() {
        let mut schema = Schema::select("orders");
        schema
            .left_join("users", Some("u"), "id", "orders", "user_id")
            .add_select_prefixed("u", "name")
            .add_select_coalesce(None, "total", "total", 0)
            .where_prefixed("u", "age", ">=", 18)
            .order_by_desc("orders.id");
        let statement = select(&schema).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT u.`name`, COALESCE(`total`, 0) AS total FROM `orders` \
             LEFT JOIN `users` AS u ON u.`id` = `orders`.`user_id` \
             WHERE u.`age` >= ? ORDER BY `orders`.`id` DESC"
        );
        assert_eq!(statement.params, vec![SqlValue::Int(18)]);
    }

    #[test]
    fn test_select_distinct_in() {
        let mut schema = Schema::select("users");
        schema.distinct().add_select("name").where_in("id", [1, 2, 3]);
        let statement = select(&schema).unwrap();
        assert_eq!(
            statement.sql,
            "SELECT DISTINCT `name` FROM `users` WHERE `id` IN (?, ?, ?)"
        );
        assert_eq!(statement.params.len(), 3);
    }

    #[test]
    fn test_select_count() {
        let mut schema = Schema::select_count("users");
        schema.where_op("age", ">", 1);
        let statement = select_count(&schema).unwrap();
        assert_eq!(statement.sql, "SELECT COUNT(*) FROM `users` WHERE `age` > ?");
        assert_eq!(statement.params, vec![SqlValue::Int(1)]);
    }

    #[test]
    fn test_select_count_ignores_joins_and_projections() {
        let mut schema = Schema::select_count("orders");
        schema
            .left_join("users", Some("u"), "id", "orders", "user_id")
            .add_select("total")
            .where_eq("status", "paid");
        let statement = select_count(&schema).unwrap();
        assert_eq!(statement.sql, "SELECT COUNT(*) FROM `orders` WHERE `status` = ?");
    }

    #[test]
    fn test_select_count_rejects_other_kinds() {
        let result = select_count(&Schema::delete("users", |q| {
            q.where_eq("id", 1);
        }));
        assert!(matches!(result, Err(Error::InvalidSchema { .. })));
        assert!(select_count(&Schema::select("users")).is_ok());
    }

    #[test]
    fn test_create_index_rename_drop() {
        let dialect = SqliteDialect::new();
        assert_eq!(
            single(&Schema::create_index("users", "email"), &dialect).sql,
            "CREATE INDEX `idx_users_email` ON `users` (`email`)"
        );
        assert_eq!(
            single(&Schema::rename("users", "members"), &dialect).sql,
            "ALTER TABLE `users` RENAME TO `members`"
        );
        assert_eq!(single(&Schema::drop("users"), &dialect).sql, "DROP TABLE `users`");
    }

    #[test]
    fn test_insert_all_skips_auto_increment() {
        let schema = Schema::insert_all("users", "users_archive", |t| {
            t.auto_increment("id");
            t.string("name", 50);
            t.integer("age");
        });
        assert_eq!(
            single(&schema, &SqliteDialect::new()).sql,
            "INSERT INTO `users_archive` (`name`, `age`) SELECT `name`, `age` FROM `users`"
        );
    }

    fn row(name: &str, age: i64) -> Schema {
        Schema::insert("users", |t| {
            t.string_value("name", name);
            t.big_int_value("age", age);
        })
    }

    #[test]
    fn test_insert_batch_single_statement() {
        let statement = insert_batch(&[row("a", 1), row("b", 2)]).unwrap().unwrap();
        assert_eq!(
            statement.sql,
            "INSERT INTO `users` (`name`, `age`) VALUES (?, ?), (?, ?)"
        );
        assert_eq!(
            statement.params,
            vec![
                SqlValue::Text(String::from("a")),
                SqlValue::Int(1),
                SqlValue::Text(String::from("b")),
                SqlValue::Int(2)
            ]
        );
    }

    #[test]
    fn test_empty_batches_compile_to_nothing() {
        assert_eq!(insert_batch(&[]).unwrap(), None);
        assert_eq!(upsert_batch(&[], &SqliteDialect::new()).unwrap(), None);
        assert_eq!(update_batch(&[]).unwrap(), None);
    }

    #[test]
    fn test_batch_rejects_mixed_tables() {
        let other = Schema::insert("posts", |t| {
            t.string_value("name", "c");
            t.big_int_value("age", 3);
        });
        assert!(insert_batch(&[row("a", 1), other]).is_err());
    }

    #[test]
    fn test_update_batch_rows() {
        let update = |id: i64, age: i64| {
            let mut schema = Schema::update("users", |t| {
                t.big_int_value("age", age);
            });
            schema.where_eq("id", id);
            schema
        };
        let batch = update_batch(&[update(1, 10), update(2, 20)]).unwrap().unwrap();
        assert_eq!(batch.sql, "UPDATE `users` SET `age` = ? WHERE `id` = ?");
        assert_eq!(
            batch.rows,
            vec![
                vec![SqlValue::Int(10), SqlValue::Int(1)],
                vec![SqlValue::Int(20), SqlValue::Int(2)]
            ]
        );
    }
}
