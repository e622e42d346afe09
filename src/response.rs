use axum::{response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Page size of every post feed.
pub const POSTS_PER_PAGE: u64 = 10;

#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> axum::response::Response {
        Json(self).into_response()
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

/// One page of a feed, shaped like the `page_obj` a template iterates over.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaginatedResponse<T: Serialize> {
    pub items: Vec<T>,
    pub total: u64,
    /// 1-based number of this page.
    pub number: u64,
    pub per_page: u64,
    pub num_pages: u64,
    pub has_next: bool,
    pub has_previous: bool,
}

impl<T: Serialize> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, number: u64, per_page: u64) -> Self {
        let num_pages = num_pages(total, per_page);
        Self {
            items,
            total,
            number,
            per_page,
            num_pages,
            has_next: number < num_pages,
            has_previous: number > 1,
        }
    }

    pub fn map<U: Serialize>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            number: self.number,
            per_page: self.per_page,
            num_pages: self.num_pages,
            has_next: self.has_next,
            has_previous: self.has_previous,
        }
    }
}

/// Number of pages needed for `total` items. An empty result still has one
/// (empty) page.
pub fn num_pages(total: u64, per_page: u64) -> u64 {
    if per_page == 0 || total == 0 {
        return 1;
    }
    total.div_ceil(per_page)
}

/// Clamp a requested page number into `1..=num_pages`.
pub fn clamp_page(requested: u64, total: u64, per_page: u64) -> u64 {
    requested.clamp(1, num_pages(total, per_page))
}

/// `?page=` query parameter. Kept as a raw string so that garbage values
/// fall back to the first page instead of rejecting the request.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct PaginationQuery {
    pub page: Option<String>,
}

impl PaginationQuery {
    /// Missing or non-integer values ask for page 1. Integers below 1 are
    /// out of range like pages past the end, and clamp to the last page.
    pub fn requested_page(&self) -> u64 {
        let Some(raw) = self.page.as_deref() else {
            return 1;
        };
        match raw.trim().parse::<i64>() {
            Ok(n) if n >= 1 => n as u64,
            Ok(_) => u64::MAX,
            Err(_) => 1,
        }
    }
}
