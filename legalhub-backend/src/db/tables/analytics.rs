//! App events and daily counters

use chrono::Utc;
use rusqlite::{params, Result as SqliteResult};
use serde_json::Value;

use super::super::sqlite::{now_rfc3339, to_json};
use super::super::Database;
use crate::models::{DailyStats, EventType, StatType};

impl Database {
    /// Append a row to `app_events`
    pub fn log_event(
        &self,
        app_id: &str,
        event_type: EventType,
        result_id: Option<&str>,
        metadata: Option<&Value>,
    ) -> SqliteResult<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO app_events (id, app_id, event_type, result_id, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                uuid::Uuid::new_v4().to_string(),
                app_id,
                event_type.as_ref(),
                result_id,
                metadata.map(to_json),
                now_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Bump today's counter for an app, creating the day row if needed
    pub fn increment_stat(&self, app_id: &str, stat: StatType) -> SqliteResult<()> {
        let conn = self.conn.lock();
        let date = Utc::now().format("%Y-%m-%d").to_string();
        let column = stat.as_ref();
        conn.execute(
            &format!(
                "INSERT INTO app_stats_daily (app_id, date, {column}) VALUES (?1, ?2, 1)
                 ON CONFLICT(app_id, date) DO UPDATE SET {column} = {column} + 1"
            ),
            params![app_id, date],
        )?;
        Ok(())
    }

    /// Log the event and bump its daily counter
    pub fn track_event(
        &self,
        app_id: &str,
        event_type: EventType,
        result_id: Option<&str>,
        metadata: Option<&Value>,
    ) -> SqliteResult<()> {
        self.log_event(app_id, event_type, result_id, metadata)?;
        if let Some(stat) = event_type.stat() {
            self.increment_stat(app_id, stat)?;
        }
        Ok(())
    }

    /// Most recent `days` daily rows, newest first
    pub fn daily_stats(&self, app_id: &str, days: i64) -> SqliteResult<Vec<DailyStats>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT app_id, date, views, submits, shares, affiliate_clicks FROM app_stats_daily
             WHERE app_id = ?1 ORDER BY date DESC LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![app_id, days], |row| {
                Ok(DailyStats {
                    app_id: row.get(0)?,
                    date: row.get(1)?,
                    views: row.get(2)?,
                    submits: row.get(3)?,
                    shares: row.get(4)?,
                    affiliate_clicks: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    #[cfg(test)]
    pub(crate) fn count_events(&self, app_id: &str, event_type: EventType) -> SqliteResult<i64> {
        let conn = self.conn.lock();
        conn.query_row(
            "SELECT COUNT(*) FROM app_events WHERE app_id = ?1 AND event_type = ?2",
            params![app_id, event_type.as_ref()],
            |row| row.get(0),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewMiniApp, StatTotals};
    use serde_json::json;

    #[test]
    fn test_track_event_updates_daily_row() {
        let db = Database::in_memory().unwrap();
        let app = db
            .create_app(&NewMiniApp {
                slug: "demo".to_string(),
                name: "Demo".to_string(),
                description: None,
                category: "other".to_string(),
                status: "active".to_string(),
                app_type: "text".to_string(),
                input_schema: json!({ "fields": [] }),
                prompt_template: "hi".to_string(),
                output_schema: None,
                render_config: None,
                share_config: None,
                limits: None,
                temperature: None,
                max_tokens: None,
            })
            .unwrap();

        db.track_event(&app.id, EventType::View, None, None).unwrap();
        db.track_event(&app.id, EventType::View, None, None).unwrap();
        db.track_event(&app.id, EventType::AffiliateClick, None, Some(&json!({ "partner": "x" })))
            .unwrap();
        db.track_event(&app.id, EventType::Error, None, None).unwrap();

        let days = db.daily_stats(&app.id, 30).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].views, 2);
        assert_eq!(days[0].affiliate_clicks, 1);
        assert_eq!(days[0].submits, 0);

        let totals = StatTotals::from_days(&days, 4);
        assert_eq!(totals.views, 2);
        assert_eq!(totals.results, 4);
        assert_eq!(db.count_events(&app.id, EventType::Error).unwrap(), 1);
    }
}
