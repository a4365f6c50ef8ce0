//! Output of the consolidated table.
//!
//! Each run writes a semicolon-delimited UTF-8 CSV and a SQLite database,
//! both named `<prefix>_<run id>` inside the output directory.

use crate::config::EtlConfig;
use crate::constants::RUN_ID_FORMAT;
use crate::error::{EtlError, Result};
use crate::models::{LoadReport, SinkReport};
use crate::table::{column_names, text_values};

use chrono::Local;
use polars::prelude::DataFrame;
use rusqlite::{Connection, params_from_iter};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Writes the consolidated table to the output directory
#[derive(Debug)]
pub struct Loader {
    output_dir: PathBuf,
    config: EtlConfig,
}

impl Loader {
    pub fn new(output_dir: impl Into<PathBuf>, config: &EtlConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config: config.clone(),
        }
    }

    /// Write both sinks under a run id taken from the local clock
    pub fn load(&self, table: &DataFrame) -> Result<LoadReport> {
        let run_id = Local::now().format(RUN_ID_FORMAT).to_string();
        self.load_with_run_id(table, &run_id)
    }

    /// Write both sinks under an explicit run id
    pub fn load_with_run_id(&self, table: &DataFrame, run_id: &str) -> Result<LoadReport> {
        if table.height() == 0 || table.width() == 0 {
            return Err(EtlError::EmptyTable);
        }

        fs::create_dir_all(&self.output_dir)?;
        let base_name = format!("{}_{}", self.config.output_prefix, run_id);
        let columns = column_names(table);

        let csv_path = self.output_dir.join(format!("{}.csv", base_name));
        self.write_csv(table, &csv_path)?;
        info!("Wrote {} rows to {}", table.height(), csv_path.display());

        let db_path = self.output_dir.join(format!("{}.db", base_name));
        self.write_sqlite(table, &db_path)?;
        info!(
            "Wrote {} rows to table '{}' in {}",
            table.height(),
            self.config.table_name,
            db_path.display()
        );

        Ok(LoadReport {
            run_id: run_id.to_string(),
            csv: SinkReport {
                path: csv_path,
                table: None,
                rows: table.height(),
                columns: columns.clone(),
            },
            sqlite: SinkReport {
                path: db_path,
                table: Some(self.config.table_name.clone()),
                rows: table.height(),
                columns,
            },
        })
    }

    /// A row that is null in every column is written as a quoted empty
    /// field when the table has a single column, so it never reads back as
    /// a blank line
    fn write_csv(&self, table: &DataFrame, path: &Path) -> Result<()> {
        let names = column_names(table);
        let columns = names
            .iter()
            .map(|name| text_values(table, name))
            .collect::<Result<Vec<_>>>()?;

        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Necessary)
            .delimiter(self.config.output_delimiter_byte()?)
            .from_path(path)?;
        writer.write_record(&names)?;
        for row in 0..table.height() {
            writer.write_record(
                columns
                    .iter()
                    .map(|values| values[row].as_deref().unwrap_or("")),
            )?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Replace the configured table with the contents of `table`, every
    /// column stored as TEXT
    fn write_sqlite(&self, table: &DataFrame, path: &Path) -> Result<()> {
        let names = column_names(table);
        let columns = names
            .iter()
            .map(|name| text_values(table, name))
            .collect::<Result<Vec<_>>>()?;

        let table_name = quote_identifier(&self.config.table_name);
        let column_defs = names
            .iter()
            .map(|name| format!("{} TEXT", quote_identifier(name)))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = vec!["?"; names.len()].join(", ");

        let mut conn = Connection::open(path)?;
        let tx = conn.transaction()?;
        tx.execute(&format!("DROP TABLE IF EXISTS {}", table_name), [])?;
        tx.execute(&format!("CREATE TABLE {} ({})", table_name, column_defs), [])?;
        {
            let mut insert =
                tx.prepare(&format!("INSERT INTO {} VALUES ({})", table_name, placeholders))?;
            for row in 0..table.height() {
                insert.execute(params_from_iter(
                    columns.iter().map(|values| values[row].as_deref()),
                ))?;
            }
        }
        tx.commit()?;

        debug!("Inserted {} rows into {}", table.height(), table_name);
        Ok(())
    }
}

/// Compare the stored column list of `table` in `db_path` with `expected`
pub fn verify_table_columns(db_path: &Path, table: &str, expected: &[String]) -> Result<bool> {
    let conn = Connection::open(db_path)?;
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_identifier(table)))?;
    let stored = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    if stored != expected {
        warn!(
            "Column mismatch in {}: expected {:?}, found {:?}",
            db_path.display(),
            expected,
            stored
        );
        return Ok(false);
    }
    Ok(true)
}

fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
