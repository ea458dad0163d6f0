use std::time::{SystemTime, UNIX_EPOCH};

use camino::{Utf8Path, Utf8PathBuf};
use rusqlite::{Connection, params};

use super::{LayerReport, RunLogError};

/// Persisted audit trail of completed layer runs.
#[derive(Debug)]
pub struct RunLog {
    connection: Connection,
    location: Utf8PathBuf,
}

fn to_sql_int(value: usize, what: &str) -> Result<i64, RunLogError> {
    i64::try_from(value).map_err(|err| RunLogError::RecordValue {
        what: what.to_owned(),
        source: Box::new(err),
    })
}

impl RunLog {
    /// Open (or create) the run log at the supplied path.
    ///
    /// # Errors
    ///
    /// Returns [`RunLogError::Initialise`] when the database cannot be opened
    /// or its table created.
    pub fn initialise(path: &Utf8Path) -> Result<Self, RunLogError> {
        let initialise_error = |source| RunLogError::Initialise {
            path: path.to_path_buf(),
            source,
        };
        let connection = Connection::open(path).map_err(initialise_error)?;
        connection
            .execute(
                "CREATE TABLE IF NOT EXISTS layer_runs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    layer TEXT NOT NULL,
                    dataset TEXT NOT NULL,
                    output_path TEXT NOT NULL,
                    total_features INTEGER NOT NULL,
                    valid_features INTEGER NOT NULL,
                    media_downloaded INTEGER NOT NULL,
                    media_adopted INTEGER NOT NULL,
                    media_failed INTEGER NOT NULL,
                    completed_at INTEGER NOT NULL
                )",
                [],
            )
            .map_err(initialise_error)?;
        Ok(Self {
            connection,
            location: path.to_path_buf(),
        })
    }

    /// Record a completed layer run.
    ///
    /// # Errors
    ///
    /// Returns [`RunLogError`] when a value cannot be stored or the insert fails.
    pub fn record(&self, report: &LayerReport) -> Result<(), RunLogError> {
        let duration =
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map_err(|err| RunLogError::RecordValue {
                    what: "timestamp".to_owned(),
                    source: Box::new(err),
                })?;
        let timestamp =
            i64::try_from(duration.as_secs()).map_err(|err| RunLogError::RecordValue {
                what: "timestamp".to_owned(),
                source: Box::new(err),
            })?;
        self.connection
            .execute(
                "INSERT INTO layer_runs (
                    layer,
                    dataset,
                    output_path,
                    total_features,
                    valid_features,
                    media_downloaded,
                    media_adopted,
                    media_failed,
                    completed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    report.layer.as_str(),
                    report.dataset.as_str(),
                    report.output_path.as_str(),
                    to_sql_int(report.total_features, "total features")?,
                    to_sql_int(report.valid_features, "valid features")?,
                    to_sql_int(report.media.downloaded, "downloaded media")?,
                    to_sql_int(report.media.adopted, "adopted media")?,
                    to_sql_int(report.media.failed, "failed media")?,
                    timestamp
                ],
            )
            .map_err(|source| RunLogError::RecordSql { source })?;
        Ok(())
    }

    /// Location of the underlying SQLite database.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.location
    }

    #[cfg(test)]
    pub(crate) const fn connection(&self) -> &Connection {
        &self.connection
    }
}
