use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use super::repo_types::User;

/// Public projection of a user; the password hash is never included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserView {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            first_name: u.first_name,
            last_name: u.last_name,
            email: u.email,
            created_at: format_timestamp(u.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserList {
    pub users: Vec<UserView>,
    pub count: usize,
}

/// Raw `?limit=&offset=` values. Kept as strings so unparsable input falls
/// back to defaults instead of rejecting the request.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

impl Pagination {
    pub fn limit(&self) -> Option<i64> {
        self.limit.as_deref().and_then(|v| v.trim().parse().ok())
    }

    pub fn offset(&self) -> Option<i64> {
        self.offset.as_deref().and_then(|v| v.trim().parse().ok())
    }
}

fn format_timestamp(ts: OffsetDateTime) -> String {
    let fmt = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    ts.to_offset(time::UtcOffset::UTC)
        .format(fmt)
        .unwrap_or_else(|_| ts.to_string())
}
