use std::{
    path::{Path, PathBuf},
    sync::{mpsc, Arc, Mutex},
    thread::{self, JoinHandle},
};

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use log::{error, info, warn};
use rusqlite::{params, Connection, Row};
use tokio::sync::oneshot;

mod migrations;

use crate::models::{
    EyeMovementRecord, FocusPoint, GazeDirection, MetricSnapshot, SessionRecord, SessionSummary,
};
use migrations::run_migrations;

type DbTask = Box<dyn FnOnce(&mut Connection) + Send + 'static>;

enum DbCommand {
    Execute(DbTask),
    Shutdown,
}

/// Focus points are written in batches so one malformed point cannot sink
/// the whole session save.
const POINT_BATCH_SIZE: usize = 50;

struct DatabaseInner {
    sender: mpsc::Sender<DbCommand>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for DatabaseInner {
    fn drop(&mut self) {
        let mut guard = match self.worker.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(handle) = guard.take() {
            if let Err(err) = self.sender.send(DbCommand::Shutdown) {
                error!("could not signal database thread shutdown: {err}");
            }
            if let Err(join_err) = handle.join() {
                error!("database thread panicked: {join_err:?}");
            }
        }
    }
}

fn open_connection(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path).context("failed to open SQLite database")?;
    // WAL and foreign keys are best-effort; the store works without them.
    if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
        warn!("could not enable WAL mode: {err}");
    }
    if let Err(err) = conn.pragma_update(None, "foreign_keys", "ON") {
        warn!("could not enable foreign keys: {err}");
    }
    Ok(conn)
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| anyhow!("invalid datetime '{value}': {err}"))
}

fn direction_from_str(value: &str) -> Result<GazeDirection> {
    match value {
        "LEFT" => Ok(GazeDirection::Left),
        "CENTER" => Ok(GazeDirection::Center),
        "RIGHT" => Ok(GazeDirection::Right),
        "UNKNOWN" => Ok(GazeDirection::Unknown),
        _ => Err(anyhow!("unknown gaze direction '{value}'")),
    }
}

fn row_to_summary(row: &Row<'_>) -> Result<SessionSummary> {
    Ok(SessionSummary {
        id: row.get(0)?,
        started_at: parse_datetime(&row.get::<_, String>(1)?)?,
        ended_at: parse_datetime(&row.get::<_, String>(2)?)?,
        duration_secs: row.get(3)?,
        distraction_count: row.get(4)?,
        avg_distraction_time: row.get(5)?,
        focus_percentage: row.get(6)?,
        longest_focus_period: row.get(7)?,
    })
}

#[derive(Clone)]
pub struct Database {
    inner: Arc<DatabaseInner>,
    db_path: Arc<PathBuf>,
}

impl Database {
    pub fn new(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("failed to create database directory {}", parent.display())
            })?;
        }

        let (command_tx, command_rx) = mpsc::channel::<DbCommand>();
        let (ready_tx, ready_rx) = mpsc::channel();
        let path_for_thread = db_path.clone();

        let worker = thread::Builder::new()
            .name("focustrack-db".into())
            .spawn(move || {
                let mut conn = match open_connection(&path_for_thread) {
                    Ok(conn) => conn,
                    Err(err) => {
                        let _ = ready_tx.send(Err(err));
                        return;
                    }
                };

                let migrated =
                    run_migrations(&mut conn).context("failed to run database migrations");
                if ready_tx.send(migrated).is_err() {
                    error!("database owner went away before the ready signal");
                    return;
                }

                while let Ok(command) = command_rx.recv() {
                    match command {
                        DbCommand::Execute(task) => task(&mut conn),
                        DbCommand::Shutdown => break,
                    }
                }

                info!("Database thread shutting down");
            })
            .context("failed to spawn database worker thread")?;

        ready_rx
            .recv()
            .context("database worker exited before signaling readiness")??;

        info!("Database initialized at {}", db_path.as_path().display());

        Ok(Self {
            inner: Arc::new(DatabaseInner {
                sender: command_tx,
                worker: Mutex::new(Some(worker)),
            }),
            db_path: Arc::new(db_path),
        })
    }

    pub fn path(&self) -> &Path {
        self.db_path.as_path()
    }

    pub async fn execute<F, T>(&self, task: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let command = DbCommand::Execute(Box::new(move |conn| {
            if reply_tx.send(task(conn)).is_err() {
                error!("database caller dropped before receiving its result");
            }
        }));

        self.inner
            .sender
            .send(command)
            .map_err(|err| anyhow!("database thread is gone: {err}"))?;

        reply_rx
            .await
            .map_err(|_| anyhow!("database thread terminated unexpectedly"))?
    }

    /// Persist a finished session and its series. Returns the session id.
    pub async fn save_session(&self, record: &SessionRecord) -> Result<String> {
        let record = record.clone();
        self.execute(move |conn| {
            // A coerced representation still saves the session; the read
            // side drops series it cannot decode.
            let snapshots_json = match serde_json::to_string(&record.snapshots) {
                Ok(json) => json,
                Err(err) => {
                    warn!(
                        "failed to encode {} metric snapshots for session {}: {err}",
                        record.snapshots.len(),
                        record.id
                    );
                    format!("{:?}", record.snapshots)
                }
            };

            let eye_movement_json = record.eye_movement.as_ref().and_then(|movement| {
                match serde_json::to_string(movement) {
                    Ok(json) => Some(json),
                    Err(err) => {
                        warn!(
                            "failed to encode eye movement record for session {}: {err}",
                            record.id
                        );
                        None
                    }
                }
            });

            conn.execute(
                "INSERT INTO sessions (id, started_at, ended_at, duration_secs, distraction_count, avg_distraction_time, focus_percentage, longest_focus_period, metric_snapshots, eye_movement)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    record.id,
                    record.started_at.to_rfc3339(),
                    record.ended_at.to_rfc3339(),
                    record.duration_secs,
                    record.distraction_count,
                    record.avg_distraction_time,
                    record.focus_percentage,
                    record.longest_focus_period,
                    snapshots_json,
                    eye_movement_json,
                ],
            )
            .with_context(|| "failed to insert session")?;

            for chunk in record.focus_points.chunks(POINT_BATCH_SIZE) {
                let tx = conn
                    .transaction()
                    .context("failed to open focus point transaction")?;
                for point in chunk {
                    let inserted = tx.execute(
                        "INSERT INTO focus_points (session_id, timestamp, is_focused, gaze_direction)
                         VALUES (?1, ?2, ?3, ?4)",
                        params![
                            record.id,
                            point.timestamp.to_rfc3339(),
                            point.is_focused,
                            point.gaze_direction.as_str(),
                        ],
                    );
                    if let Err(err) = inserted {
                        warn!("skipping focus point for session {}: {err}", record.id);
                    }
                }
                tx.commit().context("failed to commit focus point batch")?;
            }

            Ok(record.id)
        })
        .await
    }

    pub async fn get_all_sessions(&self) -> Result<Vec<SessionSummary>> {
        self.execute(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, started_at, ended_at, duration_secs, distraction_count, avg_distraction_time, focus_percentage, longest_focus_period
                 FROM sessions
                 ORDER BY started_at DESC",
            )?;

            let mut rows = stmt.query([])?;
            let mut sessions = Vec::new();
            while let Some(row) = rows.next()? {
                sessions.push(row_to_summary(row)?);
            }

            Ok(sessions)
        })
        .await
    }

    pub async fn get_session_details(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        let session_id = session_id.to_string();
        self.execute(move |conn| {
            let core = {
                let mut stmt = conn.prepare(
                    "SELECT id, started_at, ended_at, duration_secs, distraction_count, avg_distraction_time, focus_percentage, longest_focus_period, metric_snapshots, eye_movement
                     FROM sessions
                     WHERE id = ?1",
                )?;

                let mut rows = stmt.query(params![session_id])?;
                match rows.next()? {
                    Some(row) => Some((
                        row_to_summary(row)?,
                        row.get::<_, String>(8)?,
                        row.get::<_, Option<String>>(9)?,
                    )),
                    None => None,
                }
            };

            let Some((summary, snapshots_json, eye_movement_json)) = core else {
                return Ok(None);
            };

            // Malformed series are dropped instead of failing the whole read.
            let snapshots: Vec<MetricSnapshot> = match serde_json::from_str(&snapshots_json) {
                Ok(snapshots) => snapshots,
                Err(err) => {
                    warn!(
                        "discarding malformed metric snapshots for session {}: {err}",
                        summary.id
                    );
                    Vec::new()
                }
            };

            let eye_movement = eye_movement_json.as_deref().and_then(|json| {
                match serde_json::from_str::<EyeMovementRecord>(json) {
                    Ok(movement) => Some(movement),
                    Err(err) => {
                        warn!(
                            "discarding malformed eye movement record for session {}: {err}",
                            summary.id
                        );
                        None
                    }
                }
            });

            let mut stmt = conn.prepare(
                "SELECT timestamp, is_focused, gaze_direction
                 FROM focus_points
                 WHERE session_id = ?1
                 ORDER BY timestamp ASC",
            )?;

            let mut rows = stmt.query(params![summary.id])?;
            let mut focus_points = Vec::new();
            while let Some(row) = rows.next()? {
                focus_points.push(FocusPoint {
                    timestamp: parse_datetime(&row.get::<_, String>(0)?)?,
                    is_focused: row.get(1)?,
                    gaze_direction: direction_from_str(&row.get::<_, String>(2)?)?,
                });
            }

            Ok(Some(SessionRecord {
                id: summary.id,
                started_at: summary.started_at,
                ended_at: summary.ended_at,
                duration_secs: summary.duration_secs,
                distraction_count: summary.distraction_count,
                avg_distraction_time: summary.avg_distraction_time,
                focus_percentage: summary.focus_percentage,
                longest_focus_period: summary.longest_focus_period,
                snapshots,
                focus_points,
                eye_movement,
            }))
        })
        .await
    }
}
