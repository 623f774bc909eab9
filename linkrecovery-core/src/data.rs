use crate::model::{
    Backlink, DashboardStats, ErrorRecord, ErrorStatus, Recommendation, ScanLog, ScanStatus,
    ScanType, Site, User,
};
use chrono::{DateTime, Duration, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Result, Row, params};
use std::fs;
use std::path::Path;

pub const DEMO_EMAIL: &str = "demo@linkrecovery.com";

const SITE_LIMIT: i64 = 100;
const ERROR_LIMIT: i64 = 1000;
const BACKLINK_LIMIT: i64 = 100;

pub struct Database {
    conn: Connection,
}

fn to_timestamp(dt: &DateTime<Utc>) -> i64 {
    dt.timestamp()
}

fn from_timestamp(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default()
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn status_column(row: &Row, idx: usize) -> Result<ErrorStatus> {
    let raw: String = row.get(idx)?;
    raw.parse::<ErrorStatus>()
        .map_err(|e| conversion_error(idx, e.to_string()))
}

fn scan_type_column(row: &Row, idx: usize) -> Result<ScanType> {
    match row.get::<_, String>(idx)?.as_str() {
        "manual" => Ok(ScanType::Manual),
        "scheduled" => Ok(ScanType::Scheduled),
        other => Err(conversion_error(idx, format!("unknown scan type '{other}'"))),
    }
}

fn scan_status_column(row: &Row, idx: usize) -> Result<ScanStatus> {
    match row.get::<_, String>(idx)?.as_str() {
        "running" => Ok(ScanStatus::Running),
        "completed" => Ok(ScanStatus::Completed),
        "failed" => Ok(ScanStatus::Failed),
        other => Err(conversion_error(idx, format!("unknown scan status '{other}'"))),
    }
}

const SITE_COLUMNS: &str = "id, user_id, site_url, site_type, permission_level, status, last_scan, created_at, updated_at";

fn site_from_row(row: &Row) -> Result<Site> {
    Ok(Site {
        id: row.get(0)?,
        user_id: row.get(1)?,
        site_url: row.get(2)?,
        site_type: row.get(3)?,
        permission_level: row.get(4)?,
        status: row.get(5)?,
        last_scan: row.get::<_, Option<i64>>(6)?.map(from_timestamp),
        created_at: from_timestamp(row.get(7)?),
        updated_at: from_timestamp(row.get(8)?),
    })
}

const ERROR_COLUMNS: &str = "e.id, e.site_id, e.url, e.backlink_count, e.impressions, e.clicks, e.priority_score, e.status, e.detected_at, e.last_checked";

fn error_from_row(row: &Row) -> Result<ErrorRecord> {
    Ok(ErrorRecord {
        id: row.get(0)?,
        site_id: row.get(1)?,
        url: row.get(2)?,
        backlink_count: row.get(3)?,
        impressions: row.get(4)?,
        clicks: row.get(5)?,
        priority_score: row.get(6)?,
        status: status_column(row, 7)?,
        detected_at: from_timestamp(row.get(8)?),
        last_checked: from_timestamp(row.get(9)?),
    })
}

const SCAN_COLUMNS: &str = "l.id, l.site_id, l.scan_type, l.status, l.errors_found, l.started_at, l.completed_at, l.error_message";

fn scan_from_row(row: &Row) -> Result<ScanLog> {
    Ok(ScanLog {
        id: row.get(0)?,
        site_id: row.get(1)?,
        scan_type: scan_type_column(row, 2)?,
        status: scan_status_column(row, 3)?,
        errors_found: row.get(4)?,
        started_at: from_timestamp(row.get(5)?),
        completed_at: row.get::<_, Option<i64>>(6)?.map(from_timestamp),
        error_message: row.get(7)?,
    })
}

fn recommendation_from_row(row: &Row) -> Result<Recommendation> {
    Ok(Recommendation {
        id: row.get(0)?,
        error_id: row.get(1)?,
        redirect_target: row.get(2)?,
        redirect_reason: row.get(3)?,
        content_suggestion: row.get(4)?,
        generated_at: from_timestamp(row.get(5)?),
    })
}

impl Database {
    pub fn drop(path: &Path) -> std::io::Result<()> {
        fs::remove_file(path)
    }

    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA cache_size = -16000;  -- 16MB cache
            PRAGMA temp_store = MEMORY;
            PRAGMA foreign_keys = ON;
            ",
        )?;

        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let db = Database { conn };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    expires_at INTEGER NOT NULL,
    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_expiry ON sessions(expires_at);

-- Monitored properties
CREATE TABLE IF NOT EXISTS sites (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    site_url TEXT NOT NULL,
    site_type TEXT NOT NULL CHECK(site_type IN ('url-prefix', 'domain')),
    permission_level TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'active' CHECK(status IN ('active', 'paused', 'error')),
    last_scan INTEGER,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE,
    UNIQUE(user_id, site_url)
);

CREATE INDEX IF NOT EXISTS idx_sites_user ON sites(user_id);

-- Broken URLs
CREATE TABLE IF NOT EXISTS errors_404 (
    id TEXT PRIMARY KEY,
    site_id TEXT NOT NULL,
    url TEXT NOT NULL,
    backlink_count INTEGER NOT NULL DEFAULT 0,
    impressions INTEGER NOT NULL DEFAULT 0,
    clicks INTEGER NOT NULL DEFAULT 0,
    priority_score INTEGER NOT NULL DEFAULT 0 CHECK(priority_score BETWEEN 0 AND 100),
    status TEXT NOT NULL DEFAULT 'new' CHECK(status IN ('new', 'fixed', 'ignored')),
    detected_at INTEGER NOT NULL,
    last_checked INTEGER NOT NULL,
    FOREIGN KEY(site_id) REFERENCES sites(id) ON DELETE CASCADE,
    UNIQUE(site_id, url)
);

CREATE INDEX IF NOT EXISTS idx_errors_site ON errors_404(site_id);
CREATE INDEX IF NOT EXISTS idx_errors_status ON errors_404(site_id, status);
CREATE INDEX IF NOT EXISTS idx_errors_priority ON errors_404(priority_score);

-- Pages linking to a broken URL
CREATE TABLE IF NOT EXISTS backlinks (
    id TEXT PRIMARY KEY,
    error_id TEXT NOT NULL,
    source_url TEXT NOT NULL,
    anchor_text TEXT,
    discovered_at INTEGER NOT NULL,
    FOREIGN KEY(error_id) REFERENCES errors_404(id) ON DELETE CASCADE,
    UNIQUE(error_id, source_url)
);

CREATE INDEX IF NOT EXISTS idx_backlinks_error ON backlinks(error_id);

CREATE TABLE IF NOT EXISTS recommendations (
    id TEXT PRIMARY KEY,
    error_id TEXT UNIQUE NOT NULL,
    redirect_target TEXT,
    redirect_reason TEXT,
    content_suggestion TEXT,
    generated_at INTEGER NOT NULL,
    FOREIGN KEY(error_id) REFERENCES errors_404(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS scan_logs (
    id TEXT PRIMARY KEY,
    site_id TEXT NOT NULL,
    scan_type TEXT NOT NULL CHECK(scan_type IN ('manual', 'scheduled')),
    status TEXT NOT NULL CHECK(status IN ('running', 'completed', 'failed')),
    errors_found INTEGER NOT NULL DEFAULT 0,
    started_at INTEGER NOT NULL,
    completed_at INTEGER,
    error_message TEXT,
    FOREIGN KEY(site_id) REFERENCES sites(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_scan_logs_site ON scan_logs(site_id, started_at);
            ",
        )?;
        Ok(())
    }

    // Users and sessions

    pub fn upsert_user_by_email(&self, email: &str) -> Result<User> {
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO users (id, email, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(email) DO NOTHING",
            params![uuid::Uuid::new_v4().to_string(), email, to_timestamp(&now)],
        )?;

        self.conn.query_row(
            "SELECT id, email, created_at FROM users WHERE email = ?1",
            params![email],
            |row| {
                Ok(User {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    created_at: from_timestamp(row.get(2)?),
                })
            },
        )
    }

    pub fn get_user(&self, user_id: &str) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, email, created_at FROM users WHERE id = ?1",
                params![user_id],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        created_at: from_timestamp(row.get(2)?),
                    })
                },
            )
            .optional()
    }

    pub fn create_session(&self, user_id: &str, ttl: Duration) -> Result<String> {
        let token = uuid::Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![&token, user_id, to_timestamp(&now), to_timestamp(&(now + ttl))],
        )?;
        Ok(token)
    }

    /// Resolve a session token to its user id. Expired sessions are purged first.
    pub fn session_user(&self, token: &str) -> Result<Option<String>> {
        self.purge_expired_sessions()?;
        self.conn
            .query_row(
                "SELECT user_id FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .optional()
    }

    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
        Ok(deleted > 0)
    }

    fn purge_expired_sessions(&self) -> Result<usize> {
        self.conn.execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![to_timestamp(&Utc::now())],
        )
    }

    // Sites

    pub fn list_sites(&self, user_id: &str) -> Result<Vec<Site>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SITE_COLUMNS} FROM sites WHERE user_id = ?1 ORDER BY created_at, rowid LIMIT ?2"
        ))?;

        let sites = stmt
            .query_map(params![user_id, SITE_LIMIT], site_from_row)?
            .collect::<Result<Vec<_>>>()?;

        Ok(sites)
    }

    pub fn find_site_by_url(&self, user_id: &str, site_url: &str) -> Result<Option<Site>> {
        self.conn
            .query_row(
                &format!("SELECT {SITE_COLUMNS} FROM sites WHERE user_id = ?1 AND site_url = ?2"),
                params![user_id, site_url],
                site_from_row,
            )
            .optional()
    }

    pub fn create_site(&self, user_id: &str, site_url: &str) -> Result<Site> {
        let now = Utc::now();
        let site = Site {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            site_url: site_url.to_string(),
            site_type: Site::site_type_for(site_url).to_string(),
            permission_level: "owner".to_string(),
            status: "active".to_string(),
            last_scan: None,
            created_at: now,
            updated_at: now,
        };

        self.conn.execute(
            "INSERT INTO sites (id, user_id, site_url, site_type, permission_level, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                &site.id,
                &site.user_id,
                &site.site_url,
                &site.site_type,
                &site.permission_level,
                &site.status,
                to_timestamp(&now),
                to_timestamp(&now),
            ],
        )?;

        Ok(site)
    }

    /// Fetch a site only when it belongs to `user_id`.
    pub fn get_site(&self, user_id: &str, site_id: &str) -> Result<Option<Site>> {
        self.conn
            .query_row(
                &format!("SELECT {SITE_COLUMNS} FROM sites WHERE id = ?1 AND user_id = ?2"),
                params![site_id, user_id],
                site_from_row,
            )
            .optional()
    }

    pub fn touch_last_scan(&self, site_id: &str) -> Result<()> {
        let now = to_timestamp(&Utc::now());
        self.conn.execute(
            "UPDATE sites SET last_scan = ?1, updated_at = ?1 WHERE id = ?2",
            params![now, site_id],
        )?;
        Ok(())
    }

    // Broken URLs

    pub fn find_error_by_url(&self, site_id: &str, url: &str) -> Result<Option<ErrorRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {ERROR_COLUMNS} FROM errors_404 e WHERE e.site_id = ?1 AND e.url = ?2"),
                params![site_id, url],
                error_from_row,
            )
            .optional()
    }

    pub fn insert_error(&self, record: &ErrorRecord) -> Result<()> {
        self.conn.execute(
            "INSERT INTO errors_404 (
                id, site_id, url, backlink_count, impressions, clicks,
                priority_score, status, detected_at, last_checked
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                &record.id,
                &record.site_id,
                &record.url,
                record.backlink_count,
                record.impressions,
                record.clicks,
                record.priority_score.min(100),
                record.status.as_str(),
                to_timestamp(&record.detected_at),
                to_timestamp(&record.last_checked),
            ],
        )?;
        Ok(())
    }

    /// Update the metrics of an already known broken URL after a rescan.
    pub fn refresh_error(
        &self,
        error_id: &str,
        impressions: u32,
        clicks: u32,
        backlink_count: u32,
        priority_score: u32,
    ) -> Result<()> {
        self.conn.execute(
            "UPDATE errors_404
             SET impressions = ?1, clicks = ?2, backlink_count = ?3, priority_score = ?4, last_checked = ?5
             WHERE id = ?6",
            params![
                impressions,
                clicks,
                backlink_count,
                priority_score.min(100),
                to_timestamp(&Utc::now()),
                error_id
            ],
        )?;
        Ok(())
    }

    pub fn get_error(&self, error_id: &str) -> Result<Option<ErrorRecord>> {
        self.conn
            .query_row(
                &format!("SELECT {ERROR_COLUMNS} FROM errors_404 e WHERE e.id = ?1"),
                params![error_id],
                error_from_row,
            )
            .optional()
    }

    /// List the broken URLs of every site owned by `user_id`, highest priority first.
    pub fn list_errors(
        &self,
        user_id: &str,
        site_id: Option<&str>,
        status: Option<ErrorStatus>,
    ) -> Result<Vec<ErrorRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {ERROR_COLUMNS}
             FROM errors_404 e
             JOIN sites s ON e.site_id = s.id
             WHERE s.user_id = ?1
               AND (?2 IS NULL OR e.site_id = ?2)
               AND (?3 IS NULL OR e.status = ?3)
             ORDER BY e.priority_score DESC, e.detected_at, e.rowid
             LIMIT ?4"
        ))?;

        let errors = stmt
            .query_map(
                params![user_id, site_id, status.map(|s| s.as_str()), ERROR_LIMIT],
                error_from_row,
            )?
            .collect::<Result<Vec<_>>>()?;

        Ok(errors)
    }

    pub fn update_error_status(&self, error_id: &str, status: ErrorStatus) -> Result<bool> {
        let updated = self.conn.execute(
            "UPDATE errors_404 SET status = ?1, last_checked = ?2 WHERE id = ?3",
            params![status.as_str(), to_timestamp(&Utc::now()), error_id],
        )?;
        Ok(updated > 0)
    }

    /// URLs of a site that were marked fixed, used as redirect candidates.
    pub fn fixed_urls(&self, site_id: &str, limit: usize) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT url FROM errors_404 WHERE site_id = ?1 AND status = 'fixed' ORDER BY rowid LIMIT ?2",
        )?;

        let urls = stmt
            .query_map(params![site_id, limit as i64], |row| row.get(0))?
            .collect::<Result<Vec<String>>>()?;

        Ok(urls)
    }

    // Backlinks

    /// Returns false when the backlink was already recorded for this error.
    pub fn insert_backlink(
        &self,
        error_id: &str,
        source_url: &str,
        anchor_text: Option<&str>,
    ) -> Result<bool> {
        let inserted = self.conn.execute(
            "INSERT INTO backlinks (id, error_id, source_url, anchor_text, discovered_at)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(error_id, source_url) DO NOTHING",
            params![
                uuid::Uuid::new_v4().to_string(),
                error_id,
                source_url,
                anchor_text,
                to_timestamp(&Utc::now())
            ],
        )?;
        Ok(inserted > 0)
    }

    /// Make `sources` the complete backlink set of an error. Pages that no
    /// longer link are removed; pages already recorded keep their id and
    /// discovery time.
    pub fn replace_backlinks(
        &self,
        error_id: &str,
        sources: &[(&str, Option<&str>)],
    ) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;

        let recorded: Vec<String> = {
            let mut stmt = tx.prepare("SELECT source_url FROM backlinks WHERE error_id = ?1")?;
            let rows = stmt
                .query_map(params![error_id], |row| row.get(0))?
                .collect::<Result<Vec<_>>>()?;
            rows
        };
        for source_url in recorded {
            if !sources.iter().any(|(url, _)| *url == source_url) {
                tx.execute(
                    "DELETE FROM backlinks WHERE error_id = ?1 AND source_url = ?2",
                    params![error_id, source_url],
                )?;
            }
        }

        for (source_url, anchor_text) in sources {
            self.insert_backlink(error_id, source_url, *anchor_text)?;
        }

        tx.commit()
    }

    pub fn list_backlinks(&self, error_id: &str) -> Result<Vec<Backlink>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, error_id, source_url, anchor_text, discovered_at
             FROM backlinks WHERE error_id = ?1 ORDER BY discovered_at, rowid LIMIT ?2",
        )?;

        let backlinks = stmt
            .query_map(params![error_id, BACKLINK_LIMIT], |row| {
                Ok(Backlink {
                    id: row.get(0)?,
                    error_id: row.get(1)?,
                    source_url: row.get(2)?,
                    anchor_text: row.get(3)?,
                    discovered_at: from_timestamp(row.get(4)?),
                })
            })?
            .collect::<Result<Vec<_>>>()?;

        Ok(backlinks)
    }

    // Recommendations

    pub fn get_recommendation(&self, error_id: &str) -> Result<Option<Recommendation>> {
        self.conn
            .query_row(
                "SELECT id, error_id, redirect_target, redirect_reason, content_suggestion, generated_at
                 FROM recommendations WHERE error_id = ?1",
                params![error_id],
                recommendation_from_row,
            )
            .optional()
    }

    /// Store a recommendation, replacing the previous one for the same error
    /// while keeping its id.
    pub fn upsert_recommendation(&self, rec: &Recommendation) -> Result<Recommendation> {
        let mut stored = rec.clone();
        if let Some(existing) = self.get_recommendation(&rec.error_id)? {
            stored.id = existing.id;
        }

        self.conn.execute(
            "INSERT INTO recommendations (
                id, error_id, redirect_target, redirect_reason, content_suggestion, generated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(error_id) DO UPDATE SET
                redirect_target = excluded.redirect_target,
                redirect_reason = excluded.redirect_reason,
                content_suggestion = excluded.content_suggestion,
                generated_at = excluded.generated_at",
            params![
                &stored.id,
                &stored.error_id,
                &stored.redirect_target,
                &stored.redirect_reason,
                &stored.content_suggestion,
                to_timestamp(&stored.generated_at),
            ],
        )?;

        Ok(stored)
    }

    // Scan logs

    pub fn create_scan_log(&self, site_id: &str, scan_type: ScanType) -> Result<ScanLog> {
        let log = ScanLog {
            id: uuid::Uuid::new_v4().to_string(),
            site_id: site_id.to_string(),
            scan_type,
            status: ScanStatus::Running,
            errors_found: 0,
            started_at: Utc::now(),
            completed_at: None,
            error_message: None,
        };

        self.conn.execute(
            "INSERT INTO scan_logs (id, site_id, scan_type, status, started_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &log.id,
                &log.site_id,
                log.scan_type.as_str(),
                log.status.as_str(),
                to_timestamp(&log.started_at)
            ],
        )?;

        Ok(log)
    }

    pub fn complete_scan_log(&self, scan_id: &str, errors_found: u32) -> Result<()> {
        self.conn.execute(
            "UPDATE scan_logs SET status = 'completed', errors_found = ?1, completed_at = ?2 WHERE id = ?3",
            params![errors_found, to_timestamp(&Utc::now()), scan_id],
        )?;
        Ok(())
    }

    pub fn fail_scan_log(&self, scan_id: &str, message: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE scan_logs SET status = 'failed', error_message = ?1, completed_at = ?2 WHERE id = ?3",
            params![message, to_timestamp(&Utc::now()), scan_id],
        )?;
        Ok(())
    }

    pub fn recent_scans(&self, user_id: &str, limit: usize) -> Result<Vec<ScanLog>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {SCAN_COLUMNS}
             FROM scan_logs l
             JOIN sites s ON l.site_id = s.id
             WHERE s.user_id = ?1
             ORDER BY l.started_at DESC, l.rowid DESC
             LIMIT ?2"
        ))?;

        let scans = stmt
            .query_map(params![user_id, limit as i64], scan_from_row)?
            .collect::<Result<Vec<_>>>()?;

        Ok(scans)
    }

    // Dashboard

    pub fn dashboard_stats(&self, user_id: &str) -> Result<DashboardStats> {
        let sites_count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sites WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )?;

        let (total, new, fixed, backlinks): (i64, i64, i64, i64) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN e.status = 'new' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN e.status = 'fixed' THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(e.backlink_count), 0)
             FROM errors_404 e
             JOIN sites s ON e.site_id = s.id
             WHERE s.user_id = ?1",
            params![user_id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )?;

        Ok(DashboardStats {
            sites_count: sites_count as u64,
            total_errors: total as u64,
            new_errors: new as u64,
            fixed_errors: fixed as u64,
            backlinks_affected: backlinks as u64,
            recent_scans: self.recent_scans(user_id, 5)?,
        })
    }
}
