use serde::Serialize;
use utoipa::ToSchema;

/// Pagination metadata. `last_page` is `ceil(total / limit)`.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub total: Option<i64>,
    pub page: Option<i64>,
    pub last_page: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let last_page = if limit > 0 {
            (total + limit - 1) / limit
        } else {
            0
        };
        Self {
            total: Some(total),
            page: Some(page),
            last_page: Some(last_page),
        }
    }

    pub fn empty() -> Self {
        Self {
            total: None,
            page: None,
            last_page: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}

/// A page of results as returned on the RPC surface: `{data, meta}`.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    pub meta: Meta,
}
