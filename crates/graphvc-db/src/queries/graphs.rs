//! Graph history queries.

use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use graphvc_core::api::GraphRecord;

use crate::pool::{DbError, DbPool, DbResult};

const MAX_TITLE_CHARS: usize = 200;

const COLUMNS: &str = "id, title, source_url, node_count, edge_count, session_id, created_at";

/// A history row to insert.
#[derive(Debug, Clone)]
pub struct NewGraph<'a> {
    pub user_id: &'a str,
    pub title: &'a str,
    pub source_url: Option<&'a str>,
    pub node_count: u32,
    pub edge_count: u32,
    pub session_id: &'a str,
}

fn map_row(row: &Row<'_>) -> rusqlite::Result<GraphRecord> {
    Ok(GraphRecord {
        id: row.get(0)?,
        title: row.get(1)?,
        source_url: row.get(2)?,
        node_count: row.get(3)?,
        edge_count: row.get(4)?,
        session_id: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Record a generated graph.
pub fn insert_graph(pool: &DbPool, graph: &NewGraph<'_>) -> DbResult<GraphRecord> {
    let record = GraphRecord {
        id: uuid::Uuid::new_v4().to_string(),
        title: graph.title.to_string(),
        source_url: graph.source_url.map(str::to_string),
        node_count: graph.node_count,
        edge_count: graph.edge_count,
        session_id: graph.session_id.to_string(),
        created_at: chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
    };

    pool.with_conn(|conn| {
        conn.execute(
            "INSERT INTO graphs (id, user_id, title, source_url, node_count, edge_count, session_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                graph.user_id,
                record.title,
                record.source_url,
                record.node_count,
                record.edge_count,
                record.session_id,
                record.created_at,
            ],
        )?;
        Ok(())
    })?;

    tracing::debug!(id = %record.id, session_id = %record.session_id, "Saved graph history row");
    Ok(record)
}

/// Graphs owned by any of `user_ids`, newest first.
pub fn list_graphs(pool: &DbPool, user_ids: &[&str]) -> DbResult<Vec<GraphRecord>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; user_ids.len()].join(", ");
    let sql = format!(
        "SELECT {} FROM graphs WHERE user_id IN ({}) ORDER BY created_at DESC, rowid DESC",
        COLUMNS, placeholders
    );

    pool.with_conn(|conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(user_ids.iter()), map_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Rename a graph the caller owns.
pub fn rename_graph(pool: &DbPool, id: &str, user_id: &str, title: &str) -> DbResult<GraphRecord> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DbError::Validation("Title cannot be empty".to_string()));
    }
    let title = match title.char_indices().nth(MAX_TITLE_CHARS) {
        Some((idx, _)) => &title[..idx],
        None => title,
    };

    pool.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE graphs SET title = ?1 WHERE id = ?2 AND user_id = ?3",
            params![title, id, user_id],
        )?;
        if changed == 0 {
            return Err(DbError::NotFound(format!("Graph: {}", id)));
        }

        conn.query_row(
            &format!("SELECT {} FROM graphs WHERE id = ?1", COLUMNS),
            params![id],
            map_row,
        )
        .map_err(DbError::from)
    })
}

/// Delete a graph the caller owns, returning the removed row.
pub fn delete_graph(pool: &DbPool, id: &str, user_id: &str) -> DbResult<GraphRecord> {
    pool.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let record = tx
            .query_row(
                &format!("SELECT {} FROM graphs WHERE id = ?1 AND user_id = ?2", COLUMNS),
                params![id, user_id],
                map_row,
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound(format!("Graph: {}", id)))?;

        tx.execute("DELETE FROM graphs WHERE id = ?1", params![id])?;
        tx.commit()?;
        Ok(record)
    })
}

/// The history row for a session, if any.
pub fn get_by_session(pool: &DbPool, session_id: &str) -> DbResult<Option<GraphRecord>> {
    pool.with_conn(|conn| {
        conn.query_row(
            &format!("SELECT {} FROM graphs WHERE session_id = ?1", COLUMNS),
            params![session_id],
            map_row,
        )
        .optional()
        .map_err(DbError::from)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn setup() -> DbPool {
        let pool = DbPool::in_memory().unwrap();
        run_migrations(&pool).unwrap();
        pool
    }

    fn insert(pool: &DbPool, user: &str, title: &str, session: &str) -> GraphRecord {
        insert_graph(
            pool,
            &NewGraph {
                user_id: user,
                title,
                source_url: None,
                node_count: 4,
                edge_count: 3,
                session_id: session,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_insert_and_get_by_session() {
        let pool = setup();
        let record = insert_graph(
            &pool,
            &NewGraph {
                user_id: "user_1",
                title: "techcrunch.com · Feb 7",
                source_url: Some("https://techcrunch.com/a"),
                node_count: 5,
                edge_count: 4,
                session_id: "sess-1",
            },
        )
        .unwrap();

        let found = get_by_session(&pool, "sess-1").unwrap().unwrap();
        assert_eq!(found, record);
        assert_eq!(found.source_url.as_deref(), Some("https://techcrunch.com/a"));
        assert!(get_by_session(&pool, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_newest_first_and_scoped() {
        let pool = setup();
        insert(&pool, "user_1", "first", "s1");
        insert(&pool, "user_2", "other", "s2");
        insert(&pool, "user_1", "second", "s3");

        let titles: Vec<String> = list_graphs(&pool, &["user_1"])
            .unwrap()
            .into_iter()
            .map(|g| g.title)
            .collect();
        assert_eq!(titles, vec!["second", "first"]);

        assert_eq!(list_graphs(&pool, &["user_1", "user_2"]).unwrap().len(), 3);
        assert!(list_graphs(&pool, &[]).unwrap().is_empty());
    }

    #[test]
    fn test_rename_enforces_ownership() {
        let pool = setup();
        let record = insert(&pool, "user_1", "old", "s1");

        let renamed = rename_graph(&pool, &record.id, "user_1", "  New name  ").unwrap();
        assert_eq!(renamed.title, "New name");

        let err = rename_graph(&pool, &record.id, "user_2", "hijack").unwrap_err();
        assert!(matches!(err, DbError::NotFound(_)));

        let err = rename_graph(&pool, &record.id, "user_1", "   ").unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));
    }

    #[test]
    fn test_delete_enforces_ownership() {
        let pool = setup();
        let record = insert(&pool, "user_1", "doomed", "s1");

        assert!(matches!(
            delete_graph(&pool, &record.id, "user_2"),
            Err(DbError::NotFound(_))
        ));
        let deleted = delete_graph(&pool, &record.id, "user_1").unwrap();
        assert_eq!(deleted.session_id, "s1");
        assert!(get_by_session(&pool, "s1").unwrap().is_none());
        assert!(matches!(
            delete_graph(&pool, &record.id, "user_1"),
            Err(DbError::NotFound(_))
        ));
    }
}
