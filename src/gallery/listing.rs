// SPDX-License-Identifier: GPL-3.0-or-later

/// Whether `name` is a bitmap directly within the storage directory.
///
/// Names are limited to ASCII letters, digits, `-`, `_` and `.` so they can be put into links
/// and HTML without escaping, and so they can never leave the directory.
pub(crate) fn is_image_name(name: &str) -> bool {
    name.len() > ".bmp".len()
        && name.ends_with(".bmp")
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
}

/// Index of the last page for `count` images. An empty gallery still has a first page.
pub(crate) fn last_page(count: usize, per_page: usize) -> usize {
    let per_page = per_page.max(1);
    let pages = count / per_page + if count % per_page == 0 { 0 } else { 1 };
    pages.saturating_sub(1)
}

/// One control in the pagination bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum PageLink {
    First,
    Previous(usize),
    Page(usize),
    Current(usize),
    Next(usize),
    Last(usize),
}

/// The images shown on one page of the gallery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Listing {
    pub(crate) names: Vec<String>,
    pub(crate) page: usize,
    pub(crate) last_page: usize,
}

impl Listing {
    /// Pick out the names on `page`, from names already in display order.
    pub(crate) fn paginate(names: &[String], page: usize, per_page: usize) -> Self {
        let per_page = per_page.max(1);
        let start = page.saturating_mul(per_page).min(names.len());
        let end = start.saturating_add(per_page).min(names.len());
        Self {
            names: names[start..end].to_vec(),
            page,
            last_page: last_page(names.len(), per_page),
        }
    }

    pub(crate) fn links(&self) -> Vec<PageLink> {
        let mut links = Vec::new();
        if self.page > 0 {
            links.push(PageLink::First);
            links.push(PageLink::Previous(self.page - 1));
        }
        let first_shown = self.page.saturating_sub(2);
        let last_shown = self.last_page.min(self.page.saturating_add(2));
        for page in first_shown..=last_shown {
            if page == self.page {
                links.push(PageLink::Current(page));
            } else {
                links.push(PageLink::Page(page));
            }
        }
        if self.page < self.last_page {
            links.push(PageLink::Next(self.page + 1));
            links.push(PageLink::Last(self.last_page));
        }
        links
    }
}
