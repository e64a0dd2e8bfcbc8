//! Resource-agnostic query processing over fully scanned collections: search,
//! filters, sorting, pagination, suggestions, uniqueness and manual ordering.

mod filter;
mod page;
mod reorder;
mod search;
mod sort;
mod suggest;
mod unique;
mod value;

pub use filter::{matches_filter, matches_filters, Filter, FilterOp};
pub use page::{decode_cursor, encode_cursor, paginate, Page, PageRequest, DEFAULT_PAGE_SIZE};
pub use reorder::{next_sort_order, plan_reorder, OrderChange, ReorderScope, ReorderTarget, SORT_ORDER_STEP};
pub use search::matches_query;
pub use sort::{apply_sort, SortDirection, SortSpec};
pub use suggest::{label_for, suggest, Suggestion, DEFAULT_SUGGEST_LIMIT};
pub use unique::{ensure_unique, value_exists};
pub use value::{FieldValue, Fields};
