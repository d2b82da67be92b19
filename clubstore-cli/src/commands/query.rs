//! `clubstore query` command - Run a single statement.

use serde_json::{Map, Value as Json};

use clubstore_store::{ConnectionManager, ResultMode, Row, Statement, Value};

use crate::cli::QueryArgs;
use crate::config::Config;
use crate::error::CliResult;
use crate::output;

/// Run the query command
pub fn run(args: QueryArgs, config: &Config) -> CliResult<()> {
    let manager = ConnectionManager::new(config.store_for(args.db.as_deref()))?;
    let statement = Statement::with_params(
        args.sql,
        args.params.iter().map(|p| Value::parse_literal(p)),
    );

    if args.write {
        let affected = manager.execute_write(&statement)?;
        if args.json {
            println!("{}", serde_json::json!({ "affected": affected }));
        } else {
            output::success(&format!("{} row(s) affected", affected));
        }
        return Ok(());
    }

    let rows = manager.execute(&statement, ResultMode::Rows)?.into_rows();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows_to_json(&rows))?);
        return Ok(());
    }

    match rows.first() {
        None => output::info("No rows returned"),
        Some(first) => {
            let cells: Vec<Vec<String>> = rows
                .iter()
                .map(|r| r.values().iter().map(|v| v.to_string()).collect())
                .collect();
            output::table(first.columns(), &cells);
            output::newline();
            output::dim(&format!("{} row(s)", rows.len()));
        }
    }

    Ok(())
}

/// Rows as an array of column-keyed objects.
pub fn rows_to_json(rows: &[Row]) -> Json {
    Json::Array(
        rows.iter()
            .map(|row| {
                let mut object = Map::new();
                for (column, value) in row.columns().iter().zip(row.values()) {
                    object.insert(column.clone(), value_to_json(value));
                }
                Json::Object(object)
            })
            .collect(),
    )
}

fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Null => Json::Null,
        Value::Integer(i) => Json::from(*i),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Text(s) => Json::String(s.clone()),
        Value::Blob(b) => Json::Array(b.iter().map(|byte| Json::from(*byte)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_rows_to_json() {
        let columns: Arc<[String]> = vec!["TeamID".to_string(), "TeamName".to_string()].into();
        let rows = vec![
            Row::new(Arc::clone(&columns), vec![Value::Integer(1), Value::from("Eagles")]),
            Row::new(columns, vec![Value::Integer(2), Value::Null]),
        ];
        assert_eq!(
            rows_to_json(&rows),
            serde_json::json!([
                { "TeamID": 1, "TeamName": "Eagles" },
                { "TeamID": 2, "TeamName": null },
            ])
        );
    }
}
