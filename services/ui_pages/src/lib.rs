#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Keyed registry of UI page handles.
//!
//! Pages register themselves once under a stable [`PageKey`] and are never
//! removed; the registry holds weak handles only, so page lifetime stays
//! with the owning screen. Showing, hiding, and raising delegate to the
//! page's animation capability; an absent key or an already-dropped page is
//! a logged diagnostic, never an error.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    rc::{Rc, Weak},
};

use bastion_core::PageKey;
use log::warn;

/// Default animation duration applied by the convenience operations.
pub const DEFAULT_ANIMATION_SECONDS: f32 = 0.1;

/// Animation capability implemented by every registrable page.
pub trait UiPage {
    /// Plays the page's show animation over `duration` seconds.
    fn show(&mut self, duration: f32);

    /// Plays the page's hide animation over `duration` seconds.
    fn hide(&mut self, duration: f32);

    /// Reorders the page to draw last, then plays its show animation.
    fn raise_then_show(&mut self, duration: f32);
}

/// Shared, owner-held handle to a page.
pub type PageHandle = Rc<RefCell<dyn UiPage>>;

/// Registry of weak page handles keyed by stable page identity.
#[derive(Default)]
pub struct PageRegistry {
    pages: BTreeMap<PageKey, Weak<RefCell<dyn UiPage>>>,
}

impl PageRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a page under its key; the first registration wins.
    pub fn register(&mut self, key: PageKey, page: &PageHandle) {
        if self.pages.contains_key(&key) {
            warn!("page '{}' is already registered; keeping the first", key.get());
            return;
        }
        let _ = self.pages.insert(key, Rc::downgrade(page));
    }

    /// Reports whether a page is registered and still alive under the key.
    #[must_use]
    pub fn has(&self, key: PageKey) -> bool {
        self.pages
            .get(&key)
            .is_some_and(|page| page.strong_count() > 0)
    }

    /// Plays the show animation of the named page.
    pub fn show(&self, key: PageKey) {
        self.with_page(key, |page| page.show(DEFAULT_ANIMATION_SECONDS));
    }

    /// Plays the hide animation of the named page.
    pub fn hide(&self, key: PageKey) {
        self.with_page(key, |page| page.hide(DEFAULT_ANIMATION_SECONDS));
    }

    /// Reorders the named page to draw last, then shows it.
    pub fn raise(&self, key: PageKey) {
        self.with_page(key, |page| {
            page.raise_then_show(DEFAULT_ANIMATION_SECONDS);
        });
    }

    fn with_page(&self, key: PageKey, operate: impl FnOnce(&mut dyn UiPage)) {
        let Some(page) = self.pages.get(&key) else {
            warn!("page '{}' is not registered", key.get());
            return;
        };
        match page.upgrade() {
            Some(page) => operate(&mut *page.borrow_mut()),
            None => warn!("page '{}' was dropped by its owner", key.get()),
        }
    }
}
