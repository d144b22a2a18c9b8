//! Narrow read/write accessor over the taxonomy relations.
//!
//! The engine only ever needs point lookups and point inserts against
//! three tables: `nodes` (the parent-pointer tree), `names` (primary
//! names and synonyms) and `source` (provenance of added taxa). Bulk
//! loading of an NCBI archive is a separate concern and not handled here.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::Result;

/// A row of the `nodes` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub tax_id: String,
    /// The root node points at itself.
    pub parent_id: String,
    pub rank: String,
    pub source_id: i64,
}

/// A row of the `names` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameRow {
    pub tax_id: String,
    pub tax_name: String,
    pub is_primary: bool,
}

/// SQLite-backed store for the taxonomy relations.
pub struct TaxStore {
    conn: Connection,
}

impl TaxStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        debug!(db = %path.as_ref().display(), "opening taxonomy database");
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    /// Create the taxonomy tables and indexes. Idempotent. Seeds source
    /// id 1 as the NCBI taxonomy, matching the loader's convention.
    pub fn init_schema(&self) -> Result<()> {
        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                tax_id        TEXT PRIMARY KEY NOT NULL,
                parent_id     TEXT NOT NULL,
                rank          TEXT NOT NULL,
                source_id     INTEGER NOT NULL DEFAULT 1
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS names (
                tax_id        TEXT NOT NULL REFERENCES nodes(tax_id),
                tax_name      TEXT NOT NULL,
                is_primary    INTEGER NOT NULL DEFAULT 0
            )
            "#,
            [],
        )?;

        self.conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS source (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                name          TEXT UNIQUE,
                description   TEXT
            )
            "#,
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_names_tax_id ON names(tax_id)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_names_tax_name ON names(tax_name)",
            [],
        )?;
        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_names_is_primary ON names(is_primary)",
            [],
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO source (id, name, description) VALUES (1, 'NCBI', 'NCBI taxonomy')",
            [],
        )?;

        Ok(())
    }

    /// Point lookup of a node by tax_id.
    pub fn node(&self, tax_id: &str) -> Result<Option<NodeRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT tax_id, parent_id, rank, source_id FROM nodes WHERE tax_id = ?1",
                params![tax_id],
                |row| {
                    Ok(NodeRow {
                        tax_id: row.get(0)?,
                        parent_id: row.get(1)?,
                        rank: row.get(2)?,
                        source_id: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// The primary name recorded for `tax_id`, if any.
    pub fn primary_name(&self, tax_id: &str) -> Result<Option<String>> {
        let name = self
            .conn
            .query_row(
                "SELECT tax_name FROM names WHERE tax_id = ?1 AND is_primary = 1",
                params![tax_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(name)
    }

    /// Match `name` against primary names. When several taxa share the
    /// name, the lowest tax_id wins (numeric value, then lexicographic).
    pub fn match_primary(&self, name: &str) -> Result<Option<NameRow>> {
        self.match_name(name, true)
    }

    /// Match `name` against synonyms, same tie-break as `match_primary`.
    pub fn match_synonym(&self, name: &str) -> Result<Option<NameRow>> {
        self.match_name(name, false)
    }

    fn match_name(&self, name: &str, primary: bool) -> Result<Option<NameRow>> {
        let row = self
            .conn
            .query_row(
                "SELECT tax_id, tax_name, is_primary FROM names \
                 WHERE tax_name = ?1 AND is_primary = ?2 \
                 ORDER BY CAST(tax_id AS INTEGER) ASC, tax_id ASC LIMIT 1",
                params![name, primary],
                |row| {
                    Ok(NameRow {
                        tax_id: row.get(0)?,
                        tax_name: row.get(1)?,
                        is_primary: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// All non-primary names recorded for `tax_id`, in deterministic order.
    pub fn synonyms_of(&self, tax_id: &str) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT tax_name FROM names WHERE tax_id = ?1 AND is_primary = 0 ORDER BY tax_name",
        )?;
        let names = stmt
            .query_map(params![tax_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;
        Ok(names)
    }

    pub fn source_id_by_name(&self, name: &str) -> Result<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM source WHERE name = ?1",
                params![name],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    pub fn insert_node(&self, node: &NodeRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO nodes (tax_id, parent_id, rank, source_id) VALUES (?1, ?2, ?3, ?4)",
            params![node.tax_id, node.parent_id, node.rank, node.source_id],
        )?;
        Ok(())
    }

    pub fn insert_name(&self, name: &NameRow) -> Result<()> {
        self.conn.execute(
            "INSERT INTO names (tax_id, tax_name, is_primary) VALUES (?1, ?2, ?3)",
            params![name.tax_id, name.tax_name, name.is_primary],
        )?;
        Ok(())
    }

    /// Insert a source row, returning its id, or `Ok(None)` when a source
    /// with that name already exists. The name-uniqueness conflict is the
    /// one constraint violation callers are expected to absorb.
    pub fn try_insert_source(&self, name: &str, description: Option<&str>) -> Result<Option<i64>> {
        match self.conn.execute(
            "INSERT INTO source (name, description) VALUES (?1, ?2)",
            params![name, description],
        ) {
            Ok(_) => Ok(Some(self.conn.last_insert_rowid())),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> TaxStore {
        let store = TaxStore::open_in_memory().unwrap();
        store.init_schema().unwrap();
        store
    }

    #[test]
    fn test_init_schema_is_idempotent() {
        let store = store();
        store.init_schema().unwrap();
        // Seeded NCBI source survives re-initialization.
        assert_eq!(store.source_id_by_name("NCBI").unwrap(), Some(1));
    }

    #[test]
    fn test_node_roundtrip() {
        let store = store();
        let row = NodeRow {
            tax_id: "1".to_string(),
            parent_id: "1".to_string(),
            rank: "root".to_string(),
            source_id: 1,
        };
        store.insert_node(&row).unwrap();

        assert_eq!(store.node("1").unwrap(), Some(row));
        assert_eq!(store.node("2").unwrap(), None);
    }

    #[test]
    fn test_primary_name_lookup_ignores_synonyms() {
        let store = store();
        store
            .insert_name(&NameRow {
                tax_id: "1378".to_string(),
                tax_name: "Gemella Berger 1960".to_string(),
                is_primary: false,
            })
            .unwrap();
        assert_eq!(store.primary_name("1378").unwrap(), None);

        store
            .insert_name(&NameRow {
                tax_id: "1378".to_string(),
                tax_name: "Gemella".to_string(),
                is_primary: true,
            })
            .unwrap();
        assert_eq!(
            store.primary_name("1378").unwrap(),
            Some("Gemella".to_string())
        );
    }

    #[test]
    fn test_match_name_prefers_lowest_numeric_tax_id() {
        let store = store();
        for tax_id in ["100", "9", "25"] {
            store
                .insert_name(&NameRow {
                    tax_id: tax_id.to_string(),
                    tax_name: "shared".to_string(),
                    is_primary: false,
                })
                .unwrap();
        }

        let row = store.match_synonym("shared").unwrap().unwrap();
        assert_eq!(row.tax_id, "9");
    }

    #[test]
    fn test_try_insert_source_absorbs_duplicate() {
        let store = store();
        let first = store.try_insert_source("greengenes", None).unwrap();
        assert!(first.is_some());

        let second = store
            .try_insert_source("greengenes", Some("dupe"))
            .unwrap();
        assert_eq!(second, None);

        assert_eq!(store.source_id_by_name("greengenes").unwrap(), first);
    }

    #[test]
    fn test_synonyms_of_is_sorted() {
        let store = store();
        for name in ["zeta", "alpha"] {
            store
                .insert_name(&NameRow {
                    tax_id: "7".to_string(),
                    tax_name: name.to_string(),
                    is_primary: false,
                })
                .unwrap();
        }
        store
            .insert_name(&NameRow {
                tax_id: "7".to_string(),
                tax_name: "primary".to_string(),
                is_primary: true,
            })
            .unwrap();

        assert_eq!(store.synonyms_of("7").unwrap(), vec!["alpha", "zeta"]);
    }
}
