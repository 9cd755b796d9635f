//! Page arithmetic shared by the grid and the serial column.

/// Display serial number for the row at `index` (zero-based) on a
/// one-based `page` of `page_size` rows. Continuous across pages; never
/// stored, always derived.
pub fn display_sl_no(page: u32, page_size: u32, index: usize) -> u64 {
    (page.max(1) as u64 - 1) * page_size as u64 + index as u64 + 1
}

/// The slice of `rows` belonging to a one-based `page`. Out-of-range pages
/// yield an empty slice.
pub fn page_slice<T>(rows: &[T], page: u32, page_size: u32) -> &[T] {
    let size = page_size.max(1) as usize;
    let start = (page.max(1) as usize - 1).saturating_mul(size);
    if start >= rows.len() {
        return &[];
    }
    let end = (start + size).min(rows.len());
    &rows[start..end]
}

/// Number of pages needed for `total` rows. At least 1, matching the
/// backend's convention of reporting one (empty) page for no data.
pub fn page_count(total: usize, page_size: u32) -> u32 {
    let size = page_size.max(1) as usize;
    (total.div_ceil(size)).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serial_numbers_are_continuous() {
        assert_eq!(display_sl_no(1, 10, 0), 1);
        assert_eq!(display_sl_no(1, 10, 9), 10);
        assert_eq!(display_sl_no(2, 10, 0), 11);
        assert_eq!(display_sl_no(3, 10, 4), 25);
    }

    #[test]
    fn slices_cover_25_rows_in_pages_of_10() {
        let rows: Vec<u32> = (0..25).collect();
        assert_eq!(page_slice(&rows, 1, 10).len(), 10);
        assert_eq!(page_slice(&rows, 2, 10), &[10, 11, 12, 13, 14, 15, 16, 17, 18, 19]);
        assert_eq!(page_slice(&rows, 3, 10), &[20, 21, 22, 23, 24]);
        assert_eq!(page_slice(&rows, 4, 10), &[] as &[u32]);
    }

    #[test]
    fn page_count_rounds_up_and_floors_at_one() {
        assert_eq!(page_count(0, 10), 1);
        assert_eq!(page_count(10, 10), 1);
        assert_eq!(page_count(11, 10), 2);
        assert_eq!(page_count(25, 10), 3);
    }
}
