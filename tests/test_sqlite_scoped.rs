#![cfg(feature = "sqlite")]

use named_sql::DbPool;
use named_sql::mapper::column;
use named_sql::prelude::*;
use tempfile::TempDir;

async fn setup(dir: &TempDir) -> Result<Database, NamedSqlError> {
    let path = dir.path().join("scoped.db");
    let config = DbConfig::sqlite(path.to_string_lossy()).with_extra("journal_mode", "WAL");
    let db = Database::connect(config).await?;
    db.use_connection(async |conn| {
        conn.with_blocking_sqlite(|raw| {
            raw.execute_batch(
                "CREATE TABLE items (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    name TEXT NOT NULL,
                    qty INTEGER NOT NULL DEFAULT 0
                );",
            )?;
            Ok(())
        })
        .await
    })
    .await?;
    Ok(db)
}

async fn item_count(db: &Database) -> Result<i64, NamedSqlError> {
    let count = db
        .execute_query_positional("SELECT COUNT(*) AS n FROM items", &[], |rows| {
            rows.next().map(|row| row.try_get::<i64>("n")).transpose()
        })
        .await?;
    Ok(count.unwrap_or_default())
}

fn all_idle(db: &Database) -> bool {
    match db.pool() {
        DbPool::Sqlite(pool) => {
            let state = pool.state();
            state.connections == state.idle_connections
        }
        #[allow(unreachable_patterns)]
        _ => false,
    }
}

#[test]
fn batch_counts_pass_through_in_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;
        let inserted = db
            .execute_batch(
                "INSERT INTO items (name, qty) VALUES (:name, :qty)",
                &[
                    named_params! { "name" => "bolt", "qty" => 3 },
                    named_params! { "name" => "nut", "qty" => 7 },
                    named_params! { "name" => "washer", "qty" => 7 },
                ],
            )
            .await?;
        assert_eq!(inserted, vec![1, 1, 1]);

        let updated = db
            .execute_batch(
                "UPDATE items SET qty = qty + 1 WHERE qty = :qty",
                &[named_params! { "qty" => 7 }, named_params! { "qty" => 100 }],
            )
            .await?;
        assert_eq!(updated, vec![2, 0]);
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn empty_batch_is_a_no_op() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;
        let counts = db
            .execute_batch("INSERT INTO items (name) VALUES (:name)", &[])
            .await?;
        assert!(counts.is_empty());

        let keys = db
            .execute_batch_with_generated_keys(
                "INSERT INTO items (name) VALUES (:name)",
                &[],
                column::<i64, _>(0_usize),
            )
            .await?;
        assert!(keys.is_empty());
        assert_eq!(item_count(&db).await?, 0);
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn batch_keys_follow_element_order() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;
        let names = ["first", "second"];
        let elements: Vec<NamedParams> = names
            .iter()
            .map(|name| named_params! { "name" => *name })
            .collect();
        let keys = db
            .execute_batch_with_generated_keys(
                "INSERT INTO items (name) VALUES (:name)",
                &elements,
                column::<i64, _>(0_usize),
            )
            .await?;
        assert_eq!(keys.len(), 2);

        for (key, name) in keys.iter().zip(names) {
            let found = db
                .find_all(
                    "SELECT name FROM items WHERE id = :id",
                    &named_params! { "id" => *key },
                    column::<String, _>("name"),
                )
                .await?;
            assert_eq!(found, vec![name.to_string()]);
        }

        // an explicit RETURNING clause is used as-is
        let returned = db
            .execute_with_generated_keys(
                "INSERT INTO items (name, qty) VALUES (:name, :qty) RETURNING id, qty",
                &named_params! { "name" => "third", "qty" => 9 },
                |row: &Row| row.try_get::<i64>("qty"),
            )
            .await?;
        assert_eq!(returned, vec![9]);
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn failing_batch_entry_leaves_nothing_behind() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;
        let err = db
            .execute_batch_positional(
                "INSERT INTO items (name) VALUES (?)",
                &[vec![SqlValue::from("ok")], vec![SqlValue::Null]],
            )
            .await
            .unwrap_err();
        assert!(err.is_driver_error(), "{err}");
        assert_eq!(item_count(&db).await?, 0);
        assert!(all_idle(&db));
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn missing_value_fails_before_execution() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;
        let err = db
            .execute_update(
                "INSERT INTO items (name, qty) VALUES (:name, :qty)",
                &named_params! { "name" => "orphan" },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, NamedSqlError::MissingParameter(ref name) if name == "qty"));
        assert_eq!(item_count(&db).await?, 0);

        // values the SQL does not use are ignored
        let inserted = db
            .execute_update(
                "INSERT INTO items (name) VALUES (:name)",
                &named_params! { "name" => "kept", "unused" => 1 },
            )
            .await?;
        assert_eq!(inserted, 1);
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn scoped_statements_reuse_and_release() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;

        let total = db
            .use_prepared_statement("INSERT INTO items (name, qty) VALUES (?, ?)", async |stmt| {
                let mut total = 0;
                for (name, qty) in [("a", 1), ("b", 2)] {
                    stmt.bind(1, name)?;
                    stmt.bind(2, qty)?;
                    total += stmt.execute_update().await?;
                }
                Ok(total)
            })
            .await?;
        assert_eq!(total, 2);

        let names = db
            .use_named_prepared_statement(
                "SELECT name FROM items WHERE qty >= :min OR name = :min ORDER BY id",
                async |stmt| {
                    assert_eq!(stmt.parameter_count(), 2);
                    let err = stmt.bind_named("max", 1).unwrap_err();
                    assert!(matches!(err, NamedSqlError::UnknownParameter(_)));

                    stmt.bind_named("min", 2)?;
                    let rows = stmt.execute_query().await?;
                    rows.rows()
                        .iter()
                        .map(|row| row.try_get::<String>("name"))
                        .collect::<Result<Vec<_>, _>>()
                },
            )
            .await?;
        assert_eq!(names, vec!["b".to_string()]);

        let unbound = db
            .use_prepared_statement("SELECT name FROM items WHERE id = ?", async |stmt| {
                stmt.execute_query().await
            })
            .await
            .unwrap_err();
        assert!(matches!(unbound, NamedSqlError::ParameterError(_)));

        assert!(all_idle(&db));
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn mapper_errors_propagate_unchanged() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;
        db.execute_update_positional("INSERT INTO items (name) VALUES (?)", &[SqlValue::from("x")])
            .await?;

        let missing_column = db
            .find_all("SELECT name FROM items", &NamedParams::new(), column::<String, _>("nope"))
            .await
            .unwrap_err();
        assert!(missing_column.is_mapping_error());

        let custom = db
            .find_all(
                "SELECT name FROM items",
                &NamedParams::new(),
                |_row: &Row| -> Result<(), NamedSqlError> { Err(NamedSqlError::mapping("boom")) },
            )
            .await
            .unwrap_err();
        assert_eq!(custom.to_string(), NamedSqlError::mapping("boom").to_string());
        assert!(all_idle(&db));
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn use_connection_spans_several_operations() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let db = setup(&dir).await?;
        let (ids, count) = db
            .use_connection(async |conn| {
                let ids = conn
                    .execute_with_generated_keys_positional(
                        "INSERT INTO items (name) VALUES (?)",
                        &[SqlValue::from("solo")],
                        column::<i64, _>(0_usize),
                    )
                    .await?;
                let count = conn
                    .find_all_positional(
                        "SELECT id FROM items WHERE id = ?1",
                        &[SqlValue::Int(ids[0])],
                        column::<i64, _>(0_usize),
                    )
                    .await?
                    .len();
                Ok((ids, count))
            })
            .await?;
        assert_eq!(ids.len(), 1);
        assert_eq!(count, 1);
        assert_eq!(db.db_type(), DatabaseType::Sqlite);
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}

#[test]
fn invalid_configuration_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        let err = Database::connect(DbConfig::sqlite("  ")).await.unwrap_err();
        assert!(matches!(err, NamedSqlError::ConfigError(_)));

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.db");
        let err = Database::connect(
            DbConfig::sqlite(path.to_string_lossy()).with_extra("busy_timeout_ms", "soon"),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, NamedSqlError::ConfigError(_)));
        Ok::<(), NamedSqlError>(())
    })?;
    Ok(())
}
