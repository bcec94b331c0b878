use filterpager_runtime::{FilterHandle, FilterTriple, GpuContext};

/// One entry of the pager: a filter and where it sits horizontally.
#[derive(Debug)]
pub struct Page<C: GpuContext> {
    pub filter: FilterHandle<C>,
    pub index: usize,
    /// Left edge in page widths. Equal to `index` while every page is one viewport wide.
    pub offset: f32,
}

impl<C: GpuContext> Clone for Page<C> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            index: self.index,
            offset: self.offset,
        }
    }
}

/// Dense, ordered page sequence. Replaced wholesale, never edited in place.
#[derive(Debug)]
pub struct PageList<C: GpuContext> {
    pages: Vec<Page<C>>,
}

impl<C: GpuContext> Default for PageList<C> {
    fn default() -> Self {
        Self { pages: Vec::new() }
    }
}

impl<C: GpuContext> PageList<C> {
    pub fn new(filters: Vec<FilterHandle<C>>) -> Self {
        let pages = filters
            .into_iter()
            .enumerate()
            .map(|(index, filter)| Page {
                filter,
                index,
                offset: index as f32,
            })
            .collect();
        Self { pages }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Page<C>> {
        self.pages.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Page<C>> {
        self.pages.iter()
    }

    pub fn clamp_index(&self, index: i64) -> Option<usize> {
        if self.pages.is_empty() {
            return None;
        }
        Some(index.clamp(0, self.pages.len() as i64 - 1) as usize)
    }

    /// Page whose left edge is at or left of `scroll_x`, if any.
    pub fn page_at(&self, scroll_x: i32, width: i32) -> Option<usize> {
        if width <= 0 || scroll_x < 0 {
            return None;
        }
        let index = (scroll_x / width) as usize;
        (index < self.pages.len()).then_some(index)
    }

    /// Neighbors of `index`; out-of-range slots are absent.
    pub fn triple_at(&self, index: usize) -> FilterTriple<C> {
        let filter = |i: Option<usize>| {
            i.and_then(|i| self.pages.get(i))
                .map(|p| p.filter.clone())
        };
        FilterTriple {
            left: filter(index.checked_sub(1)),
            current: filter(Some(index)),
            right: filter(index.checked_add(1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filterpager_runtime::testing::{CallLog, NullGpu, RecordingFilter};

    fn list(n: usize) -> PageList<NullGpu> {
        let log = CallLog::default();
        PageList::new(
            (0..n)
                .map(|i| FilterHandle::new(RecordingFilter::new(&format!("f{i}"), log.clone())))
                .collect(),
        )
    }

    fn names(t: &FilterTriple<NullGpu>) -> [Option<String>; 3] {
        let n = |h: &Option<FilterHandle<NullGpu>>| h.as_ref().map(|h| h.name().to_string());
        [n(&t.left), n(&t.current), n(&t.right)]
    }

    #[test]
    fn offsets_follow_indices() {
        let l = list(3);
        for (i, p) in l.iter().enumerate() {
            assert_eq!(p.index, i);
            assert_eq!(p.offset, i as f32);
        }
    }

    #[test]
    fn boundary_neighbors_are_absent() {
        let l = list(3);
        assert_eq!(
            names(&l.triple_at(0)),
            [None, Some("f0".into()), Some("f1".into())]
        );
        assert_eq!(
            names(&l.triple_at(2)),
            [Some("f1".into()), Some("f2".into()), None]
        );
        assert!(list(0).triple_at(0).is_empty());
    }

    #[test]
    fn page_at_maps_scroll_to_one_page() {
        let l = list(3);
        assert_eq!(l.page_at(0, 100), Some(0));
        assert_eq!(l.page_at(199, 100), Some(1));
        assert_eq!(l.page_at(300, 100), None);
        assert_eq!(l.page_at(50, 0), None);
    }

    #[test]
    fn clamp_index_handles_empty() {
        assert_eq!(list(0).clamp_index(3), None);
        assert_eq!(list(3).clamp_index(-4), Some(0));
        assert_eq!(list(3).clamp_index(9), Some(2));
    }
}
