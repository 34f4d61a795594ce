// src/common/pagination.rs

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::AppError;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

// Cursor "start after": o último registro da página anterior.
// Mudanças concorrentes na lista podem pular ou repetir linhas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub created_at: DateTime<Utc>,
    pub id: Uuid,
}

impl Cursor {
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}|{}", self.created_at.to_rfc3339(), self.id))
    }

    pub fn decode(raw: &str) -> Result<Self, AppError> {
        let invalid = || AppError::InvalidArgument("pagination.cursor_invalid");

        let bytes = URL_SAFE_NO_PAD.decode(raw).map_err(|_| invalid())?;
        let text = String::from_utf8(bytes).map_err(|_| invalid())?;
        let (ts, id) = text.split_once('|').ok_or_else(invalid)?;

        Ok(Self {
            created_at: DateTime::parse_from_rfc3339(ts)
                .map_err(|_| invalid())?
                .with_timezone(&Utc),
            id: Uuid::parse_str(id).map_err(|_| invalid())?,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageParams {
    pub limit: Option<i64>,
    pub cursor: Option<String>,
}

impl PageParams {
    pub fn page_size(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn cursor(&self) -> Result<Option<Cursor>, AppError> {
        self.cursor.as_deref().map(Cursor::decode).transpose()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

impl<T> Page<T> {
    /// `rows` deve vir com `page_size + 1` itens no máximo; o extra só indica que há mais.
    pub fn from_rows(mut rows: Vec<T>, page_size: i64, cursor_of: impl Fn(&T) -> Cursor) -> Self {
        let has_more = rows.len() as i64 > page_size;
        rows.truncate(page_size as usize);
        let next_cursor = if has_more {
            rows.last().map(|last| cursor_of(last).encode())
        } else {
            None
        };
        Self { items: rows, next_cursor, has_more }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor_at(secs: i64) -> Cursor {
        Cursor {
            created_at: DateTime::from_timestamp(secs, 0).expect("valid timestamp"),
            id: Uuid::new_v4(),
        }
    }

    #[test]
    fn cursor_survives_encoding() {
        let cursor = cursor_at(1_700_000_000);
        assert_eq!(Cursor::decode(&cursor.encode()).unwrap(), cursor);
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        assert!(matches!(
            Cursor::decode("not-a-cursor"),
            Err(AppError::InvalidArgument("pagination.cursor_invalid"))
        ));
    }

    #[test]
    fn page_uses_last_row_as_next_cursor() {
        let rows: Vec<Cursor> = (0..4).map(|i| cursor_at(1_700_000_000 - i)).collect();
        let third = rows[2];
        let page = Page::from_rows(rows, 3, |c| *c);

        assert!(page.has_more);
        assert_eq!(page.items.len(), 3);
        assert_eq!(page.next_cursor, Some(third.encode()));
    }

    #[test]
    fn last_page_has_no_cursor() {
        let rows: Vec<Cursor> = (0..2).map(|i| cursor_at(1_700_000_000 - i)).collect();
        let page = Page::from_rows(rows, 3, |c| *c);
        assert!(!page.has_more);
        assert!(page.next_cursor.is_none());
    }

    #[test]
    fn page_size_is_clamped() {
        let params = PageParams { limit: Some(10_000), cursor: None };
        assert_eq!(params.page_size(), MAX_PAGE_SIZE);
        let params = PageParams { limit: None, cursor: None };
        assert_eq!(params.page_size(), DEFAULT_PAGE_SIZE);
    }
}
