use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::{User, UserCredentials};

const USER_COLUMNS: &str = "u.id, u.username, u.full_name, u.role_id, r.name, u.password_hash";

/// Look up an active user by username for login.
pub fn get_credentials_by_username(
    conn: &Connection,
    username: &str,
) -> Result<Option<UserCredentials>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS}
         FROM users u
         INNER JOIN roles r ON r.id = u.role_id
         WHERE u.username = ?1 AND u.is_deleted = 0 AND r.is_deleted = 0"
    );
    let creds = conn
        .query_row(&sql, params![username], row_to_credentials)
        .optional()?;
    Ok(creds)
}

/// Get an active user by id.
pub fn get_user(conn: &Connection, user_id: i64) -> Result<Option<User>, DatabaseError> {
    let sql = format!(
        "SELECT {USER_COLUMNS}
         FROM users u
         INNER JOIN roles r ON r.id = u.role_id
         WHERE u.id = ?1 AND u.is_deleted = 0"
    );
    let creds = conn
        .query_row(&sql, params![user_id], row_to_credentials)
        .optional()?;
    Ok(creds.map(|c| c.user))
}

pub fn count_users(conn: &Connection) -> Result<i64, DatabaseError> {
    let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    Ok(count)
}

/// Insert a user with an already-hashed password. Returns the new id.
pub fn insert_user(
    conn: &Connection,
    username: &str,
    password_hash: &str,
    full_name: &str,
    role_id: i64,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO users (username, password_hash, full_name, role_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![username, password_hash, full_name, role_id],
    )?;
    Ok(conn.last_insert_rowid())
}

fn row_to_credentials(row: &rusqlite::Row) -> Result<UserCredentials, rusqlite::Error> {
    Ok(UserCredentials {
        user: User {
            id: row.get(0)?,
            username: row.get(1)?,
            full_name: row.get(2)?,
            role_id: row.get(3)?,
            role_name: row.get(4)?,
        },
        password_hash: row.get(5)?,
    })
}
