use crate::state::CategoryPath;
use std::fmt;
use url::Url;

/// What a fetched page is expected to be, and so how it is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// A category listing; a seed when `depth == 0`
    Category,

    /// Page 2+ of a category listing; `follow_next` is set when pages are
    /// discovered one "next" link at a time
    Pagination { follow_next: bool },

    /// A product detail page
    Product,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Pagination { .. } => "pagination",
            Self::Product => "product",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One unit of crawl work
///
/// Tasks are immutable once created; children are built from a clone of the
/// parent's path so branches never share state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub kind: TaskKind,
    pub url: Url,
    pub category_path: CategoryPath,

    /// Category nesting below the seeds (seeds are 0)
    pub depth: u32,

    /// Page number inside the category listing (1 for the first page)
    pub page: u32,
}

impl CrawlTask {
    pub fn seed(url: Url) -> Self {
        Self {
            kind: TaskKind::Category,
            url,
            category_path: CategoryPath::new(),
            depth: 0,
            page: 1,
        }
    }

    pub fn is_seed(&self) -> bool {
        self.kind == TaskKind::Category && self.depth == 0
    }

    /// First page of a subcategory one level below this task
    pub fn subcategory(&self, url: Url, path: &CategoryPath) -> Self {
        Self {
            kind: TaskKind::Category,
            url,
            category_path: path.clone(),
            depth: self.depth + 1,
            page: 1,
        }
    }

    /// Another page of this task's listing
    pub fn pagination(&self, url: Url, path: &CategoryPath, page: u32, follow_next: bool) -> Self {
        Self {
            kind: TaskKind::Pagination { follow_next },
            url,
            category_path: path.clone(),
            depth: self.depth,
            page,
        }
    }

    /// A product found on this task's listing
    pub fn product(&self, url: Url, path: &CategoryPath) -> Self {
        Self {
            kind: TaskKind::Product,
            url,
            category_path: path.clone(),
            depth: self.depth,
            page: 1,
        }
    }
}
