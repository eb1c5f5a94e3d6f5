use tracing::{debug, trace};

use crate::config::{Grouping, LayoutConfig};
use crate::height::required_height;
use crate::model::{Page, PairedSystem};

/// Packing policy currently in effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackState {
    /// Fill each page until the next system would exceed the page height.
    AutoFit,
    /// Everything goes on the one page.
    SinglePage,
    /// Follow the grouping plan; `group` indexes the current plan entry.
    Grouped { group: usize },
}

impl PackState {
    pub fn initial(grouping: &Grouping) -> Self {
        match grouping {
            Grouping::Auto => Self::AutoFit,
            Grouping::SinglePage => Self::SinglePage,
            Grouping::Groups(_) => Self::Grouped { group: 0 },
        }
    }
}

/// Page under construction. Finalized into an immutable `Page` before the
/// next one is started.
#[derive(Debug)]
pub struct PageBuilder<K> {
    id: usize,
    systems: Vec<PairedSystem<K>>,
}

impl<K> PageBuilder<K> {
    pub fn new(id: usize) -> Self {
        Self {
            id,
            systems: Vec::new(),
        }
    }
    pub fn len(&self) -> usize {
        self.systems.len()
    }
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
    pub fn push(&mut self, system: PairedSystem<K>) {
        self.systems.push(system);
    }
    /// True if `system` can join this page without exceeding `cfg.page_height`.
    /// An empty page accepts anything, so an over-height system still gets a
    /// page of its own.
    pub fn fits(&self, system: &PairedSystem<K>, cfg: &LayoutConfig) -> bool {
        if self.systems.is_empty() {
            return true;
        }
        let height = required_height(self.systems.iter().chain(std::iter::once(system)), cfg);
        height <= cfg.page_height
    }
    pub fn finish(self) -> Page<K> {
        Page {
            id: self.id,
            systems: self.systems,
        }
    }
}

/// Partitions systems, in score order, into pages.
///
/// Systems are fed one at a time with [`PagePacker::push`]; pages are never
/// reopened once closed.
pub struct PagePacker<'a, K> {
    cfg: &'a LayoutConfig,
    state: PackState,
    current: PageBuilder<K>,
    pages: Vec<Page<K>>,
}

impl<'a, K> PagePacker<'a, K> {
    pub fn new(cfg: &'a LayoutConfig) -> Self {
        Self {
            cfg,
            state: PackState::initial(&cfg.grouping),
            current: PageBuilder::new(0),
            pages: Vec::new(),
        }
    }

    pub fn state(&self) -> PackState {
        self.state
    }

    pub fn push(&mut self, system: PairedSystem<K>) {
        // At most two passes: an exhausted grouping plan switches to auto-fit
        // and the same system is placed again under the new state.
        loop {
            match self.state {
                PackState::AutoFit => {
                    if !self.current.fits(&system, self.cfg) {
                        self.close_page();
                    }
                    self.place(system);
                    return;
                }
                PackState::SinglePage => {
                    self.place(system);
                    return;
                }
                PackState::Grouped { group } => {
                    let target = match &self.cfg.grouping {
                        Grouping::Groups(groups) => groups.get(group).copied(),
                        _ => None,
                    };
                    match target {
                        None => {
                            debug!(
                                system = system.index,
                                "grouping plan exhausted, falling back to auto-fit"
                            );
                            self.state = PackState::AutoFit;
                        }
                        Some(target) if self.current.len() < target => {
                            self.place(system);
                            return;
                        }
                        Some(_) => {
                            self.close_page();
                            self.state = PackState::Grouped { group: group + 1 };
                            self.place(system);
                            return;
                        }
                    }
                }
            }
        }
    }

    /// Closes the page under construction and returns all pages in order.
    pub fn finish(mut self) -> Vec<Page<K>> {
        self.close_page();
        self.pages
    }

    fn place(&mut self, system: PairedSystem<K>) {
        trace!(system = system.index, page = self.pages.len(), "place system");
        self.current.push(system);
    }

    fn close_page(&mut self) {
        if self.current.is_empty() {
            return;
        }
        let next = PageBuilder::new(self.pages.len() + 1);
        let page = std::mem::replace(&mut self.current, next).finish();
        debug!(page = page.id, systems = page.len(), "page closed");
        self.pages.push(page);
    }
}

/// Packs `systems` into pages following `cfg.grouping`.
pub fn pack_systems<K>(
    systems: impl IntoIterator<Item = PairedSystem<K>>,
    cfg: &LayoutConfig,
) -> Vec<Page<K>> {
    let mut packer = PagePacker::new(cfg);
    for system in systems {
        packer.push(system);
    }
    packer.finish()
}
