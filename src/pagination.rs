use serde::Serialize;
use utoipa::ToSchema;

use crate::errors::AppError;
use crate::models::report::Report;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A requested page. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: Option<u32>,
    size: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self { page: None, size: DEFAULT_PAGE_SIZE }
    }
}

impl PageRequest {
    pub fn new(page: Option<u32>, size: Option<u32>) -> Result<Self, AppError> {
        if page == Some(0) {
            return Err(AppError::bad_request("page must be a positive integer"));
        }
        if size == Some(0) {
            return Err(AppError::bad_request("size must be a positive integer"));
        }

        Ok(Self {
            page,
            size: size.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }

    /// Parse the raw `page`/`size` query values. Blank values count as absent.
    pub fn parse(page: Option<&str>, size: Option<&str>) -> Result<Self, AppError> {
        let page = parse_positive("page", page)?;
        let size = parse_positive("size", size)?;
        Self::new(page, size)
    }

    pub fn limit(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        match self.page {
            Some(page) => u64::from(page - 1) * u64::from(self.size),
            None => 0,
        }
    }

    pub fn current_page(&self) -> u32 {
        self.page.unwrap_or(1)
    }
}

fn parse_positive(name: &str, raw: Option<&str>) -> Result<Option<u32>, AppError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(value) => value
            .parse::<u32>()
            .map(Some)
            .map_err(|_| AppError::bad_request(format!("{name} must be a positive integer"))),
    }
}

/// One page of results plus the counters clients page with.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[aliases(ReportPage = Page<Report>)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_items: u64,
    pub reports: Vec<T>,
    pub total_pages: u64,
    pub current_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64, request: &PageRequest) -> Self {
        let limit = u64::from(request.limit());
        Self {
            total_items,
            reports: items,
            total_pages: total_items.div_ceil(limit),
            current_page: request.current_page(),
        }
    }
}
