use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;
use rusqlite::Connection;

use crate::errors::AppError;
use crate::services::scheduling::local_today;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    /// Source of "today" for date checks and the calendar window.
    pub clock: fn() -> NaiveDate,
}

impl AppState {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            clock: local_today,
        }
    }

    pub fn db(&self) -> Result<MutexGuard<'_, Connection>, AppError> {
        self.db
            .lock()
            .map_err(|_| AppError::Internal("database lock poisoned".to_string()))
    }

    pub fn today(&self) -> NaiveDate {
        (self.clock)()
    }
}
