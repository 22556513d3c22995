use futures_util::future::try_join_all;
use tokio_postgres::{Client, GenericClient, Statement};

use crate::error::NamedSqlError;
use crate::executor::{BatchOutcome, ExecOutcome, KeyMode};
use crate::results::ResultSet;
use crate::types::SqlValue;

use super::params::Params;
use super::query::build_result_set_from_statement;

pub(crate) async fn prepare(client: &Client, sql: &str) -> Result<Statement, NamedSqlError> {
    Ok(client.prepare(sql).await?)
}

pub(crate) async fn query<C: GenericClient>(
    client: &C,
    stmt: &Statement,
    params: &[SqlValue],
) -> Result<ResultSet, NamedSqlError> {
    let converted = Params::convert(params);
    let rows = client.query(stmt, converted.as_refs()).await?;
    build_result_set_from_statement(stmt, &rows)
}

pub(crate) async fn execute<C: GenericClient>(
    client: &C,
    stmt: &Statement,
    params: &[SqlValue],
    keys: KeyMode,
) -> Result<ExecOutcome, NamedSqlError> {
    match keys {
        KeyMode::Returning => {
            let rows = query(client, stmt, params).await?;
            Ok(ExecOutcome {
                count: row_count(rows.len() as u64)?,
                keys: Some(rows),
            })
        }
        KeyMode::None | KeyMode::LastInsertRowid => {
            let converted = Params::convert(params);
            let affected = client.execute(stmt, converted.as_refs()).await?;
            Ok(ExecOutcome {
                count: row_count(affected)?,
                keys: None,
            })
        }
    }
}

/// Run every batch entry on one prepared statement inside a transaction.
///
/// The entries are pipelined on the connection and their results collected in entry order. The
/// first failure rolls the whole batch back.
pub(crate) async fn execute_batch(
    client: &mut Client,
    stmt: &Statement,
    batch: &[Vec<SqlValue>],
    keys: KeyMode,
) -> Result<BatchOutcome, NamedSqlError> {
    let mut outcome = BatchOutcome::with_capacity(batch.len(), keys);
    if batch.is_empty() {
        return Ok(outcome);
    }

    let tx = client.transaction().await?;
    let pipelined = try_join_all(
        batch
            .iter()
            .map(|params| execute(&tx, stmt, params, keys)),
    )
    .await;
    let results = match pipelined {
        Ok(results) => results,
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "postgres batch rollback failed");
            }
            return Err(e);
        }
    };
    tx.commit().await?;

    for result in results {
        outcome.push(result);
    }
    Ok(outcome)
}

fn row_count(count: u64) -> Result<i64, NamedSqlError> {
    i64::try_from(count).map_err(|e| {
        NamedSqlError::ExecutionError(format!("postgres affected rows conversion error: {e}"))
    })
}
