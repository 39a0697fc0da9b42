//! Status cache: tag → last known {status, sector, class}.
//!
//! The in-memory map mirrors the `tags` table. A refresh is a full snapshot
//! replacement, never a merge; local events only ever touch the `status`
//! field of a tag that is already cached.

use crate::db::queries::{load_tags, replace_tags, update_tag_status};
use crate::errors::AppResult;
use crate::models::tag::normalize_tag;
use crate::models::{Lookup, Status, TagRecord};
use crate::remote::{RemoteTag, StatusSource};
use rusqlite::Connection;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshReport {
    /// Tags now cached.
    pub tags: usize,
    /// Rows dropped because their identifier was blank.
    pub skipped_blank: usize,
    /// Rows dropped because their status is not one we know.
    pub skipped_unknown: usize,
}

#[derive(Debug, Default)]
pub struct StatusCache {
    entries: BTreeMap<String, TagRecord>,
}

impl StatusCache {
    /// Load the persisted snapshot.
    pub fn hydrate(conn: &Connection) -> AppResult<Self> {
        let entries = load_tags(conn)?.into_iter().collect();
        Ok(Self { entries })
    }

    pub fn lookup(&self, tag: &str) -> Lookup {
        match self.entries.get(tag.trim()) {
            Some(rec) => Lookup::Registered(rec.clone()),
            None => Lookup::Unregistered,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &TagRecord)> {
        self.entries.iter()
    }

    /// Fetch the backend's table and replace the cache with it.
    ///
    /// On any failure (transport, `ok:false`, malformed body) both the
    /// in-memory map and the persisted table are left as they were.
    pub async fn refresh(
        &mut self,
        conn: &Connection,
        source: &dyn StatusSource,
    ) -> AppResult<RefreshReport> {
        let rows = source.fetch_status_table().await?;
        self.replace_all(conn, rows)
    }

    /// Replace the whole cache with `rows` (the body of a status table).
    pub fn replace_all(&mut self, conn: &Connection, rows: Vec<RemoteTag>) -> AppResult<RefreshReport> {
        let mut fresh = BTreeMap::new();
        let mut skipped_blank = 0;
        let mut skipped_unknown = 0;

        for row in rows {
            let Some(tag) = row.tag.as_deref().and_then(normalize_tag) else {
                skipped_blank += 1;
                continue;
            };

            let status = match row.status.as_deref().map(str::trim) {
                None | Some("") => Status::Pending,
                Some(raw) => match Status::from_wire(raw) {
                    Some(status) => status,
                    None => {
                        warn!(%tag, status = raw, "unknown status in backend table, row skipped");
                        skipped_unknown += 1;
                        continue;
                    }
                },
            };

            fresh.insert(
                tag,
                TagRecord {
                    status,
                    sector: row.setor.unwrap_or_default(),
                    class: row.classe.unwrap_or_default(),
                },
            );
        }

        replace_tags(conn, fresh.iter())?;
        self.entries = fresh;

        Ok(RefreshReport {
            tags: self.entries.len(),
            skipped_blank,
            skipped_unknown,
        })
    }

    /// Reflect a locally recorded event in the cache before the backend
    /// knows about it. Unregistered tags stay unregistered.
    pub fn apply_local_status_update(
        &mut self,
        conn: &Connection,
        tag: &str,
        status: Status,
    ) -> AppResult<bool> {
        let Some(rec) = self.entries.get_mut(tag) else {
            return Ok(false);
        };
        update_tag_status(conn, tag, status)?;
        rec.status = status;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::initialize::init_db;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        init_db(&conn).unwrap();
        conn
    }

    #[test]
    fn local_update_only_touches_cached_tags() {
        let conn = conn();
        let mut cache = StatusCache::default();
        cache
            .replace_all(&conn, vec![RemoteTag::new("T-1", "PENDENTE", "N", "A")])
            .unwrap();

        assert!(cache.apply_local_status_update(&conn, "T-1", Status::Completed).unwrap());
        assert!(!cache.apply_local_status_update(&conn, "T-2", Status::Completed).unwrap());
        assert_eq!(cache.lookup("T-2"), Lookup::Unregistered);

        let back = StatusCache::hydrate(&conn).unwrap();
        assert_eq!(back.lookup("T-1").status(), Some(Status::Completed));
        assert_eq!(back.len(), 1);
    }

    #[test]
    fn unknown_status_drops_only_that_row() {
        let conn = conn();
        let mut cache = StatusCache::default();
        cache
            .replace_all(&conn, vec![RemoteTag::new("T-9", "PENDENTE", "", "")])
            .unwrap();

        let rows = vec![
            RemoteTag::new("T-1", "CONCLUIDO", "", ""),
            RemoteTag::new("T-2", "EM ANDAMENTO", "", ""),
        ];
        let report = cache.replace_all(&conn, rows).unwrap();
        assert_eq!(report.tags, 1);
        assert_eq!(report.skipped_unknown, 1);

        let back = StatusCache::hydrate(&conn).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back.lookup("T-1").status(), Some(Status::Completed));
        assert_eq!(back.lookup("T-2"), Lookup::Unregistered);
        assert_eq!(back.lookup("T-9"), Lookup::Unregistered);
    }
}
