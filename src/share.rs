//! Sharing a fact as plain text through the system clipboard.
use crate::i18n::{self, Key};
use crate::model::{Fact, Language};

/// The shared text: localized title line, blank line, summary.
pub fn share_text(lang: Language, fact: &Fact) -> String {
    let title = i18n::tf(lang, Key::ShareFactTitle, &[fact.title.as_str()]);
    format!("{title}\n\n{}", fact.summary)
}

/// Lazily opened system clipboard.
///
/// The handle is kept after the first copy: on X11 the copied text is only
/// served while a clipboard instance is alive.
#[derive(Default)]
pub struct SystemClipboard {
    inner: Option<arboard::Clipboard>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy(&mut self, text: &str) -> Result<(), arboard::Error> {
        let mut clipboard = match self.inner.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let result = clipboard.set_text(text.to_owned());
        self.inner = Some(clipboard);
        result
    }
}
