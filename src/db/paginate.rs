//! Pagination over an already-filtered select.
//!
//! The COUNT and the page SELECT are derived from the same query value via
//! sea-orm's paginator, so both sides always see identical predicates; only
//! the trailing LIMIT/OFFSET differs.

use sea_orm::{ConnectionTrait, DbErr, PaginatorTrait, SelectorTrait};
use serde::Serialize;

/// Normalized pagination input: 1-based page clamped to >= 1, page size
/// clamped to the configured ceiling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl PageRequest {
    pub fn new(page: u64, per_page: u64, max_per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, max_per_page.max(1)),
        }
    }

    /// Zero-based row offset of this page.
    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.per_page
    }
}

/// One page of results plus the totals the page-link bar needs.
#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Maps the row type while keeping the pagination metadata.
    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

pub fn total_pages(total: u64, per_page: u64) -> u64 {
    if total == 0 {
        0
    } else {
        (total + per_page - 1) / per_page
    }
}

/// Runs the COUNT variant and then the LIMIT/OFFSET variant of `query`,
/// both against the same filtered select.
pub async fn fetch_page<'db, C, Q>(
    db: &'db C,
    query: Q,
    req: PageRequest,
) -> Result<Page<<Q::Selector as SelectorTrait>::Item>, DbErr>
where
    C: ConnectionTrait,
    Q: PaginatorTrait<'db, C>,
{
    let paginator = query.paginate(db, req.per_page);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(req.page - 1).await?;

    Ok(Page {
        items,
        total,
        page: req.page,
        per_page: req.per_page,
        total_pages: total_pages(total, req.per_page),
    })
}
