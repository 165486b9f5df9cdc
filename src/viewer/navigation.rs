//! Position of the displayed item in the flattened collection.

/// Where the viewer was opened within the caller's paginated view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRef {
    /// 1-based page number.
    pub current_page: usize,
    pub items_per_page: usize,
    /// Index within the current page.
    pub initial_index: usize,
}

impl PageRef {
    pub fn new(current_page: usize, items_per_page: usize, initial_index: usize) -> Self {
        Self {
            current_page,
            items_per_page,
            initial_index,
        }
    }

    /// `(current_page - 1) * items_per_page + initial_index`
    pub fn global_index(&self) -> usize {
        self.current_page
            .saturating_sub(1)
            .saturating_mul(self.items_per_page)
            .saturating_add(self.initial_index)
    }
}

/// Wrap-around cursor over `len` items. `len` is always at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigationIndex {
    index: usize,
    len: usize,
}

impl NavigationIndex {
    /// Returns `None` for an empty collection.
    pub fn new(index: usize, len: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        Some(Self {
            index: index.min(len - 1),
            len,
        })
    }

    pub fn from_page(page: PageRef, len: usize) -> Option<Self> {
        Self::new(page.global_index(), len)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn next(&mut self) -> usize {
        self.index = (self.index + 1) % self.len;
        self.index
    }

    pub fn prev(&mut self) -> usize {
        self.index = (self.index + self.len - 1) % self.len;
        self.index
    }

    /// Moves to `index`, clamped to the last item.
    pub fn jump_to(&mut self, index: usize) -> usize {
        self.index = index.min(self.len - 1);
        self.index
    }

    /// Adjusts to a shrunken collection after the item at `removed` went away.
    /// Returns `None` when nothing is left.
    pub fn remove(&mut self, removed: usize) -> Option<usize> {
        if self.len <= 1 {
            return None;
        }
        self.len -= 1;
        if removed < self.index {
            self.index -= 1;
        }
        self.index = self.index.min(self.len - 1);
        Some(self.index)
    }
}
