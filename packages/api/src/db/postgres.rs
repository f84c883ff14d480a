//! PostgreSQL implementation of [`NoteStore`].
//!
//! Folder hierarchy queries (breadcrumb path, cycle check, subtree depth refresh)
//! are recursive CTEs. The recursion is capped at [`MAX_DEPTH`] levels so a
//! corrupted parent chain cannot loop forever.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use store::{
    Folder, FolderCreate, FolderFilter, FolderPatch, FolderPathEntry, Note, NoteCreate, NotePatch,
};
use uuid::Uuid;

use super::{
    NoteStore, StoreError, DUPLICATE_USER, FOLDER, MISSING_FOLDER, MISSING_PARENT, NOTE,
};
use crate::models::{FolderRow, NewUser, NoteRow, User};

const MAX_DEPTH: i32 = 256;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

async fn live_folder(
    conn: &mut PgConnection,
    owner: Uuid,
    id: Uuid,
) -> Result<Option<FolderRow>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM note_folders WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(owner)
    .fetch_optional(conn)
    .await
}

async fn live_note(
    conn: &mut PgConnection,
    owner: Uuid,
    id: Uuid,
) -> Result<Option<NoteRow>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM notes WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL")
        .bind(id)
        .bind(owner)
        .fetch_optional(conn)
        .await
}

/// Fails with `InvalidReference` unless `folder_id` is a live folder of `owner`.
async fn ensure_folder(
    conn: &mut PgConnection,
    owner: Uuid,
    folder_id: Option<Uuid>,
) -> Result<(), StoreError> {
    if let Some(folder_id) = folder_id {
        if live_folder(conn, owner, folder_id).await?.is_none() {
            return Err(StoreError::InvalidReference(MISSING_FOLDER.to_string()));
        }
    }
    Ok(())
}

/// Recomputes depths below `$1`, walking at most `$2` levels down from it.
const REFRESH_SUBTREE_DEPTH: &str = "WITH RECURSIVE subtree AS (
        SELECT id, depth, 0 AS hops FROM note_folders WHERE id = $1
        UNION ALL
        SELECT f.id, s.depth + 1, s.hops + 1
        FROM note_folders f
        JOIN subtree s ON f.parent_id = s.id
        WHERE f.deleted_at IS NULL AND s.hops < $2
    )
    UPDATE note_folders nf
    SET depth = subtree.depth, updated_at = NOW()
    FROM subtree
    WHERE nf.id = subtree.id AND nf.depth <> subtree.depth";

/// Row locks on every live folder of the owner, taken in id order.
const LOCK_OWNER_FOLDERS: &str =
    "SELECT id FROM note_folders WHERE user_id = $1 AND deleted_at IS NULL ORDER BY id FOR UPDATE";

/// Rewrite `depth` for every live descendant of `root` from the root's own depth.
async fn refresh_subtree_depth(conn: &mut PgConnection, root: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(REFRESH_SUBTREE_DEPTH)
        .bind(root)
        .bind(MAX_DEPTH)
        .execute(conn)
        .await?;
    Ok(())
}

/// Serializes reparenting per owner. Two moves that would each pass the cycle
/// check on their own snapshot cannot interleave.
async fn lock_owner_folders(conn: &mut PgConnection, owner: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(LOCK_OWNER_FOLDERS)
        .bind(owner)
        .execute(conn)
        .await?;
    Ok(())
}

/// Whether `candidate` is `folder` itself or one of its descendants.
async fn is_within(
    conn: &mut PgConnection,
    folder: Uuid,
    candidate: Uuid,
) -> Result<bool, sqlx::Error> {
    let (within,): (bool,) = sqlx::query_as(
        "WITH RECURSIVE up AS (
            SELECT id, parent_id, 0 AS hops FROM note_folders WHERE id = $1
            UNION ALL
            SELECT f.id, f.parent_id, up.hops + 1
            FROM note_folders f
            JOIN up ON f.id = up.parent_id
            WHERE up.hops < $3
        )
        SELECT EXISTS (SELECT 1 FROM up WHERE id = $2)",
    )
    .bind(candidate)
    .bind(folder)
    .bind(MAX_DEPTH)
    .fetch_one(conn)
    .await?;
    Ok(within)
}

#[async_trait]
impl NoteStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let existing: Option<(i32,)> =
            sqlx::query_as("SELECT 1 FROM users WHERE username = $1 OR email = $2")
                .bind(&user.username)
                .bind(&user.email)
                .fetch_optional(&self.pool)
                .await?;
        if existing.is_some() {
            return Err(StoreError::Conflict(DUPLICATE_USER.to_string()));
        }

        sqlx::query_as(
            "INSERT INTO users (username, email, password_hash) VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(DUPLICATE_USER.to_string())
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(sqlx::query_as("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_notes(&self, owner: Uuid, filter: FolderFilter) -> Result<Vec<Note>, StoreError> {
        let query = match filter {
            FolderFilter::All => sqlx::query_as::<_, NoteRow>(
                "SELECT * FROM notes WHERE user_id = $1 AND deleted_at IS NULL
                 ORDER BY updated_at DESC",
            )
            .bind(owner),
            FolderFilter::Root => sqlx::query_as::<_, NoteRow>(
                "SELECT * FROM notes WHERE user_id = $1 AND deleted_at IS NULL AND folder_id IS NULL
                 ORDER BY updated_at DESC",
            )
            .bind(owner),
            FolderFilter::In(folder_id) => sqlx::query_as::<_, NoteRow>(
                "SELECT * FROM notes WHERE user_id = $1 AND deleted_at IS NULL AND folder_id = $2
                 ORDER BY updated_at DESC",
            )
            .bind(owner)
            .bind(folder_id),
        };
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(NoteRow::into_model).collect())
    }

    async fn get_note(&self, owner: Uuid, id: Uuid) -> Result<Note, StoreError> {
        let mut conn = self.pool.acquire().await?;
        live_note(&mut conn, owner, id)
            .await?
            .map(NoteRow::into_model)
            .ok_or(StoreError::NotFound(NOTE))
    }

    async fn create_note(&self, owner: Uuid, create: NoteCreate) -> Result<Note, StoreError> {
        let mut conn = self.pool.acquire().await?;
        ensure_folder(&mut conn, owner, create.folder_id).await?;

        let row: NoteRow = sqlx::query_as(
            "INSERT INTO notes (user_id, title, content, folder_id) VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(owner)
        .bind(&create.title)
        .bind(&create.content)
        .bind(create.folder_id)
        .fetch_one(&mut *conn)
        .await?;
        tracing::debug!(note_id = %row.id, "created note");
        Ok(row.into_model())
    }

    async fn patch_note(&self, owner: Uuid, id: Uuid, patch: NotePatch) -> Result<Note, StoreError> {
        let mut tx = self.pool.begin().await?;
        let existing = live_note(&mut tx, owner, id)
            .await?
            .ok_or(StoreError::NotFound(NOTE))?;

        let folder_id = match patch.folder_id {
            Some(folder_id) => {
                ensure_folder(&mut tx, owner, folder_id).await?;
                folder_id
            }
            None => existing.folder_id,
        };
        let title = patch.title.unwrap_or(existing.title);
        let content = patch.content.unwrap_or(existing.content);

        let row: NoteRow = sqlx::query_as(
            "UPDATE notes SET title = $3, content = $4, folder_id = $5, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(&title)
        .bind(&content)
        .bind(folder_id)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(row.into_model())
    }

    async fn delete_note(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE notes SET deleted_at = NOW()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(NOTE));
        }
        Ok(())
    }

    async fn note_counts(&self, owner: Uuid) -> Result<HashMap<Uuid, i64>, StoreError> {
        let rows: Vec<(Uuid, i64)> = sqlx::query_as(
            "SELECT folder_id, COUNT(*) FROM notes
             WHERE user_id = $1 AND deleted_at IS NULL AND folder_id IS NOT NULL
             GROUP BY folder_id",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    async fn list_folders(&self, owner: Uuid, parent: FolderFilter) -> Result<Vec<Folder>, StoreError> {
        let query = match parent {
            FolderFilter::All => sqlx::query_as::<_, FolderRow>(
                "SELECT * FROM note_folders WHERE user_id = $1 AND deleted_at IS NULL
                 ORDER BY name, depth",
            )
            .bind(owner),
            FolderFilter::Root => sqlx::query_as::<_, FolderRow>(
                "SELECT * FROM note_folders
                 WHERE user_id = $1 AND deleted_at IS NULL AND parent_id IS NULL
                 ORDER BY name, depth",
            )
            .bind(owner),
            FolderFilter::In(parent_id) => sqlx::query_as::<_, FolderRow>(
                "SELECT * FROM note_folders
                 WHERE user_id = $1 AND deleted_at IS NULL AND parent_id = $2
                 ORDER BY name, depth",
            )
            .bind(owner)
            .bind(parent_id),
        };
        let rows = query.fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(FolderRow::into_model).collect())
    }

    async fn get_folder(&self, owner: Uuid, id: Uuid) -> Result<Folder, StoreError> {
        let mut conn = self.pool.acquire().await?;
        live_folder(&mut conn, owner, id)
            .await?
            .map(FolderRow::into_model)
            .ok_or(StoreError::NotFound(FOLDER))
    }

    async fn folder_path(&self, owner: Uuid, id: Uuid) -> Result<Vec<FolderPathEntry>, StoreError> {
        let rows: Vec<(Uuid, String, i32)> = sqlx::query_as(
            "WITH RECURSIVE ancestors AS (
                SELECT id, name, depth, parent_id, 0 AS hops
                FROM note_folders
                WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
                UNION ALL
                SELECT f.id, f.name, f.depth, f.parent_id, a.hops + 1
                FROM note_folders f
                JOIN ancestors a ON f.id = a.parent_id
                WHERE f.user_id = $2 AND f.deleted_at IS NULL AND a.hops < $3
            )
            SELECT id, name, depth FROM ancestors WHERE hops > 0 ORDER BY hops DESC",
        )
        .bind(id)
        .bind(owner)
        .bind(MAX_DEPTH)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(id, name, depth)| FolderPathEntry { id, name, depth })
            .collect())
    }

    async fn create_folder(&self, owner: Uuid, create: FolderCreate) -> Result<Folder, StoreError> {
        let mut conn = self.pool.acquire().await?;
        let depth = match create.parent_id {
            Some(parent_id) => {
                let parent = live_folder(&mut conn, owner, parent_id)
                    .await?
                    .ok_or_else(|| StoreError::InvalidReference(MISSING_PARENT.to_string()))?;
                parent.depth + 1
            }
            None => 0,
        };

        let row: FolderRow = sqlx::query_as(
            "INSERT INTO note_folders (user_id, name, parent_id, depth) VALUES ($1, $2, $3, $4)
             RETURNING *",
        )
        .bind(owner)
        .bind(&create.name)
        .bind(create.parent_id)
        .bind(depth)
        .fetch_one(&mut *conn)
        .await?;
        tracing::debug!(folder_id = %row.id, depth, "created folder");
        Ok(row.into_model())
    }

    async fn patch_folder(&self, owner: Uuid, id: Uuid, patch: FolderPatch) -> Result<Folder, StoreError> {
        let mut tx = self.pool.begin().await?;
        if matches!(patch.parent_id, Some(Some(_))) {
            lock_owner_folders(&mut tx, owner).await?;
        }
        let existing = live_folder(&mut tx, owner, id)
            .await?
            .ok_or(StoreError::NotFound(FOLDER))?;

        let (parent_id, depth) = match patch.parent_id {
            None => (existing.parent_id, existing.depth),
            Some(None) => (None, 0),
            Some(Some(parent_id)) => {
                if parent_id == id {
                    return Err(StoreError::Cycle);
                }
                let parent = live_folder(&mut tx, owner, parent_id)
                    .await?
                    .ok_or_else(|| StoreError::InvalidReference(MISSING_PARENT.to_string()))?;
                if is_within(&mut tx, id, parent_id).await? {
                    return Err(StoreError::Cycle);
                }
                (Some(parent_id), parent.depth + 1)
            }
        };
        let name = patch.name.unwrap_or(existing.name);

        let row: FolderRow = sqlx::query_as(
            "UPDATE note_folders SET name = $3, parent_id = $4, depth = $5, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING *",
        )
        .bind(id)
        .bind(owner)
        .bind(&name)
        .bind(parent_id)
        .bind(depth)
        .fetch_one(&mut *tx)
        .await?;
        if depth != existing.depth {
            refresh_subtree_depth(&mut tx, id).await?;
        }
        tx.commit().await?;
        Ok(row.into_model())
    }

    async fn delete_folder(&self, owner: Uuid, id: Uuid) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        let result = sqlx::query(
            "UPDATE note_folders SET deleted_at = NOW()
             WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL",
        )
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(FOLDER));
        }

        sqlx::query(
            "UPDATE notes SET folder_id = NULL, updated_at = NOW()
             WHERE folder_id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(owner)
        .execute(&mut *tx)
        .await?;

        let children: Vec<(Uuid,)> = sqlx::query_as(
            "UPDATE note_folders SET parent_id = NULL, depth = 0, updated_at = NOW()
             WHERE parent_id = $1 AND user_id = $2 AND deleted_at IS NULL
             RETURNING id",
        )
        .bind(id)
        .bind(owner)
        .fetch_all(&mut *tx)
        .await?;
        for (child,) in &children {
            refresh_subtree_depth(&mut tx, *child).await?;
        }

        tx.commit().await?;
        tracing::debug!(folder_id = %id, detached = children.len(), "deleted folder");
        Ok(())
    }
}
