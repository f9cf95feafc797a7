use anyhow::Result;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS prayer_times_cache (
            date     TEXT PRIMARY KEY,
            fajr     TEXT NOT NULL,
            sunrise  TEXT NOT NULL,
            dhuhr    TEXT NOT NULL,
            asr      TEXT NOT NULL,
            maghrib  TEXT NOT NULL,
            isha     TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS schedule_events (
            date          TEXT NOT NULL,
            name          TEXT NOT NULL,
            display_name  TEXT NOT NULL,
            kind          TEXT NOT NULL CHECK(kind IN ('fard','sunnah','nafl','witr')),
            category      TEXT NOT NULL,
            time          TEXT NOT NULL,
            rakats        INTEGER NOT NULL,
            description   TEXT NOT NULL,
            is_optional   INTEGER NOT NULL DEFAULT 0,
            priority      INTEGER NOT NULL CHECK(priority BETWEEN 1 AND 7),
            day_offset    INTEGER NOT NULL DEFAULT 0,
            position      INTEGER NOT NULL,
            completed     INTEGER NOT NULL DEFAULT 0,
            moved         INTEGER NOT NULL DEFAULT 0,
            PRIMARY KEY (date, name)
        );

        CREATE TABLE IF NOT EXISTS adhkar_items (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE COLLATE NOCASE,
            session     TEXT NOT NULL,
            kind        TEXT NOT NULL CHECK(kind IN ('checkbox','counter')),
            target      INTEGER NOT NULL DEFAULT 1,
            builtin     INTEGER NOT NULL DEFAULT 0,
            sort_order  INTEGER NOT NULL DEFAULT 0,
            active      INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS adhkar_log (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            item_id    INTEGER NOT NULL REFERENCES adhkar_items(id),
            date       TEXT NOT NULL,
            count      INTEGER NOT NULL DEFAULT 0,
            completed  INTEGER NOT NULL DEFAULT 0,
            UNIQUE(item_id, date)
        );

        CREATE TABLE IF NOT EXISTS app_meta (
            key   TEXT PRIMARY KEY,
            value TEXT
        );
    ")?;

    seed_adhkar(conn)?;
    Ok(())
}

fn seed_adhkar(conn: &Connection) -> Result<()> {
    let builtins = [
        ("Morning Adhkar", "morning", "checkbox", 1, 0),
        ("Evening Adhkar", "evening", "checkbox", 1, 1),
        ("Post-Salah Tasbih", "after_prayer", "counter", 99, 2),
        ("Ayat al-Kursi", "before_sleep", "checkbox", 1, 3),
    ];

    for (name, session, kind, target, order) in &builtins {
        conn.execute(
            "INSERT OR IGNORE INTO adhkar_items
                (name, session, kind, target, builtin, sort_order, active)
             VALUES (?1, ?2, ?3, ?4, 1, ?5, 1)",
            rusqlite::params![name, session, kind, target, order],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let builtins: i64 = conn
            .query_row("SELECT COUNT(*) FROM adhkar_items WHERE builtin = 1", [], |r| r.get(0))
            .unwrap();
        assert_eq!(builtins, 4);
    }
}
