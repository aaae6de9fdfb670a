//! Local persistent state backed by SQLite.
//!
//! Holds the per-device state that survives restarts independently of
//! the remote library: the favorites set and the last chosen volume
//! level. Playlists are not stored here; they live on the server.

use rusqlite::{params, Connection, OptionalExtension};

pub struct StateStore {
    conn: Connection,
}

impl StateStore {
    pub fn new() -> Result<Self, rusqlite::Error> {
        let data_dir = dirs::data_dir()
            .expect("Could not find data directory")
            .join("playdeck");

        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).expect("Could not create data directory");
        }

        let db_path = data_dir.join("state.db");
        let conn = Connection::open(db_path)?;

        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn new_in_memory() -> Result<Self, rusqlite::Error> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn initialize_schema(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS favorites (
                track_id TEXT PRIMARY KEY
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;
        Ok(())
    }

    pub fn load_favorites(&self) -> Result<Vec<String>, rusqlite::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT track_id FROM favorites ORDER BY track_id")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect()
    }

    pub fn add_favorite(&self, track_id: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT OR IGNORE INTO favorites (track_id) VALUES (?1)",
            params![track_id],
        )?;
        Ok(())
    }

    pub fn remove_favorite(&self, track_id: &str) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "DELETE FROM favorites WHERE track_id = ?1",
            params![track_id],
        )?;
        Ok(())
    }

    pub fn load_volume(&self) -> Result<Option<f64>, rusqlite::Error> {
        let value: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = 'volume'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value.and_then(|v| v.parse::<f64>().ok()))
    }

    pub fn save_volume(&self, level: f64) -> Result<(), rusqlite::Error> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES ('volume', ?1)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![level.to_string()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_favorites_roundtrip() {
        let store = StateStore::new_in_memory().unwrap();
        assert!(store.load_favorites().unwrap().is_empty());

        store.add_favorite("b.flac").unwrap();
        store.add_favorite("a.flac").unwrap();
        store.add_favorite("a.flac").unwrap();
        assert_eq!(store.load_favorites().unwrap(), vec!["a.flac", "b.flac"]);

        store.remove_favorite("a.flac").unwrap();
        store.remove_favorite("missing.flac").unwrap();
        assert_eq!(store.load_favorites().unwrap(), vec!["b.flac"]);
    }

    #[test]
    fn test_volume_roundtrip() {
        let store = StateStore::new_in_memory().unwrap();
        assert_eq!(store.load_volume().unwrap(), None);

        store.save_volume(0.42).unwrap();
        assert_eq!(store.load_volume().unwrap(), Some(0.42));

        store.save_volume(1.0).unwrap();
        assert_eq!(store.load_volume().unwrap(), Some(1.0));
    }
}
