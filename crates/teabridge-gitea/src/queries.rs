//! SQL against Gitea's schema
//!
//! Written with `?` placeholders; see [`numbered`] for PostgreSQL.
//! Boolean columns are read as 0/1 integers so both backends decode alike.

/// Gitea account types
pub const USER_TYPE_INDIVIDUAL: i64 = 0;
pub const USER_TYPE_ORGANIZATION: i64 = 1;

/// Gitea login types handled locally (no type, plain)
pub const LOCAL_LOGIN_TYPES: [i64; 2] = [0, 1];

pub const LIST_USERS: &str = r#"
    SELECT id, name, COALESCE(full_name, ''), COALESCE(email, ''),
           CAST(CASE WHEN keep_email_private THEN 1 ELSE 0 END AS BIGINT),
           CAST(CASE WHEN is_active THEN 1 ELSE 0 END AS BIGINT)
    FROM "user"
    WHERE type = ?
    ORDER BY id
"#;

pub const LIST_ORGANIZATIONS: &str = r#"
    SELECT id, name
    FROM "user"
    WHERE type = ?
    ORDER BY id
"#;

pub const LIST_TEAMS_FOR_USER: &str = r#"
    SELECT team.id, team.org_id, team.name
    FROM team
    INNER JOIN team_user ON team_user.team_id = team.id
    WHERE team_user.uid = ?
    ORDER BY team.id
"#;

const CREDENTIAL_COLUMNS: &str = r#"
    SELECT id, name, COALESCE(full_name, ''), COALESCE(email, ''),
           CAST(CASE WHEN keep_email_private THEN 1 ELSE 0 END AS BIGINT),
           CAST(CASE WHEN is_active THEN 1 ELSE 0 END AS BIGINT),
           CAST(CASE WHEN prohibit_login THEN 1 ELSE 0 END AS BIGINT),
           CAST(COALESCE(login_type, 0) AS BIGINT),
           COALESCE(passwd, ''), COALESCE(passwd_hash_algo, ''), COALESCE(salt, '')
    FROM "user"
"#;

pub fn credentials_by_name() -> String {
    format!("{} WHERE lower_name = ? AND type = ?", CREDENTIAL_COLUMNS)
}

pub fn credentials_by_email() -> String {
    format!("{} WHERE LOWER(email) = ? AND type = ?", CREDENTIAL_COLUMNS)
}

/// Rewrite `?` placeholders as `$1`, `$2`, ...
pub fn numbered(query: &str) -> String {
    let mut out = String::with_capacity(query.len() + 8);
    let mut index = 0;

    for c in query.chars() {
        if c == '?' {
            index += 1;
            out.push('$');
            out.push_str(&index.to_string());
        } else {
            out.push(c);
        }
    }

    out
}
