use crate::error::{AppError, Result};
use crate::ranking::{MenuEntry, SelectionMenu};
use crate::stream::{Category, FetchedVideo};

/// State of one fetch-select-download cycle.
///
/// A new fetch replaces everything derived from the previous one. Changing
/// the category rebuilds the menu and selects its first entry.
#[derive(Debug, Clone)]
pub struct Session<H> {
    url: Option<String>,
    video: Option<FetchedVideo<H>>,
    category: Category,
    menu: SelectionMenu<H>,
    selected: Option<usize>,
}

impl<H: Clone> Default for Session<H> {
    fn default() -> Self {
        Self {
            url: None,
            video: None,
            category: Category::default(),
            menu: SelectionMenu::build(&[]),
            selected: None,
        }
    }
}

impl<H: Clone> Session<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs the result of a fetch, keeping the current category.
    pub fn load(&mut self, url: impl Into<String>, video: FetchedVideo<H>) {
        self.url = Some(url.into());
        self.video = Some(video);
        self.rebuild();
    }

    pub fn set_category(&mut self, category: Category) {
        self.category = category;
        self.rebuild();
    }

    /// Selects an entry by label or 1-based position.
    pub fn select(&mut self, choice: &str) -> Result<&MenuEntry<H>> {
        if self.video.is_none() {
            return Err(AppError::NotFetched);
        }
        if self.menu.is_empty() {
            return Err(AppError::NoStreams(self.category.to_string()));
        }
        let label = self.menu.resolve(choice)?.label.clone();
        self.selected = self.menu.entries().iter().position(|e| e.label == label);
        self.selected_entry()
            .ok_or_else(|| AppError::UnknownSelection(choice.to_string()))
    }

    fn rebuild(&mut self) {
        self.menu = match &self.video {
            Some(video) => SelectionMenu::build(video.streams.get(self.category)),
            None => SelectionMenu::build(&[]),
        };
        self.selected = if self.menu.is_empty() { None } else { Some(0) };
    }
}

impl<H> Session<H> {
    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.video.as_ref().map(|v| v.title.as_str())
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn menu(&self) -> &SelectionMenu<H> {
        &self.menu
    }

    pub fn is_loaded(&self) -> bool {
        self.video.is_some()
    }

    pub fn selected_entry(&self) -> Option<&MenuEntry<H>> {
        self.selected.and_then(|i| self.menu.entries().get(i))
    }
}
