//! Page arithmetic tests.
//!
//! Run with: cargo test --test pagination_test

use repair_console::pagination::{DEFAULT_PAGE_SIZE, Pager};

#[test]
fn twenty_three_rows_in_pages_of_ten() {
    let rows: Vec<u32> = (1..=23).collect();

    let first = Pager::new(rows.len(), None, Some(10), DEFAULT_PAGE_SIZE);
    assert_eq!(first.total_pages(), 3);
    assert_eq!(first.page, 1);
    assert!(!first.has_previous());
    assert!(first.has_next());
    assert_eq!(first.slice(&rows), &rows[0..10]);

    let last = Pager::new(rows.len(), Some(3), Some(10), DEFAULT_PAGE_SIZE);
    assert!(last.has_previous());
    assert!(!last.has_next());
    assert_eq!(last.offset(), 20);
    assert_eq!(last.slice(&rows), &[21, 22, 23]);
}

#[test]
fn out_of_range_pages_are_clamped() {
    let rows: Vec<u32> = (1..=23).collect();

    let beyond = Pager::new(rows.len(), Some(9), Some(10), DEFAULT_PAGE_SIZE);
    assert_eq!(beyond.page, 3);
    assert_eq!(beyond.slice(&rows).len(), 3);

    let zero = Pager::new(rows.len(), Some(0), Some(10), DEFAULT_PAGE_SIZE);
    assert_eq!(zero.page, 1);
}

#[test]
fn unsupported_page_size_falls_back_to_default() {
    let pager = Pager::new(100, None, Some(7), DEFAULT_PAGE_SIZE);
    assert_eq!(pager.page_size, DEFAULT_PAGE_SIZE);

    let pager = Pager::new(100, None, Some(50), DEFAULT_PAGE_SIZE);
    assert_eq!(pager.page_size, 50);
    assert_eq!(pager.total_pages(), 2);
}

#[test]
fn empty_collection_has_one_empty_page() {
    let rows: Vec<u32> = Vec::new();
    let pager = Pager::new(0, Some(4), None, DEFAULT_PAGE_SIZE);
    assert_eq!(pager.page, 1);
    assert_eq!(pager.total_pages(), 0);
    assert!(!pager.has_next());
    assert!(!pager.has_previous());
    assert!(pager.slice(&rows).is_empty());
}
