//! The loaded document and the reader's position in it.

use log::info;

use crate::error::{PhotonError, Result};
use crate::geometry::PageSize;
use crate::pdf::DocumentBackend;

/// Owns the current document handle and the current page.
///
/// Pages are 1-based. Navigation clamps at both ends and never wraps.
pub struct PageSession<B: DocumentBackend> {
    backend: B,
    document: Option<B::Document>,
    page_count: u32,
    current_page: u32,
}

impl<B: DocumentBackend> PageSession<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            document: None,
            page_count: 0,
            current_page: 1,
        }
    }

    /// Parse `bytes` and make it the current document.
    ///
    /// On success the previous document is dropped and the current page
    /// goes back to 1. On failure the session is left untouched.
    pub fn load(&mut self, bytes: Vec<u8>) -> Result<u32> {
        let document = self.backend.open(bytes)?;
        let page_count = self.backend.page_count(&document);
        if page_count == 0 {
            return Err(PhotonError::EmptyDocument);
        }

        self.document = Some(document);
        self.page_count = page_count;
        self.current_page = 1;
        info!("Document loaded: {} pages", page_count);
        Ok(page_count)
    }

    /// Drop the current document, if any.
    pub fn close(&mut self) {
        self.document = None;
        self.page_count = 0;
        self.current_page = 1;
    }

    pub fn is_loaded(&self) -> bool {
        self.document.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The current document, or [`PhotonError::DocumentNotLoaded`].
    pub fn document(&self) -> Result<&B::Document> {
        self.document.as_ref().ok_or(PhotonError::DocumentNotLoaded)
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    /// Move to `page`, clamped into `1..=page_count`. No-op without a document.
    pub fn set_current_page(&mut self, page: u32) -> u32 {
        if self.page_count > 0 {
            self.current_page = page.clamp(1, self.page_count);
        }
        self.current_page
    }

    pub fn next(&mut self) -> u32 {
        self.set_current_page(self.current_page.saturating_add(1))
    }

    pub fn previous(&mut self) -> u32 {
        self.set_current_page(self.current_page.saturating_sub(1))
    }

    /// Native size of `page`. Unlike navigation this does not clamp.
    pub fn page_size(&self, page: u32) -> Result<PageSize> {
        let document = self.document()?;
        if page == 0 || page > self.page_count {
            return Err(PhotonError::PageOutOfRange {
                page,
                page_count: self.page_count,
            });
        }
        self.backend.native_size(document, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::testing::{fake_pdf, letter_pdf, FakeBackend};

    fn session(pages: usize) -> PageSession<FakeBackend> {
        let mut session = PageSession::new(FakeBackend::default());
        session.load(letter_pdf(pages)).unwrap();
        session
    }

    #[test]
    fn test_starts_empty() {
        let session = PageSession::new(FakeBackend::default());
        assert!(!session.is_loaded());
        assert_eq!(session.page_count(), 0);
        assert_eq!(session.current_page(), 1);
        assert!(matches!(session.document(), Err(PhotonError::DocumentNotLoaded)));
    }

    #[test]
    fn test_previous_at_first_page_stays() {
        let mut session = session(3);
        assert_eq!(session.previous(), 1);
        assert_eq!(session.current_page(), 1);
    }

    #[test]
    fn test_next_at_last_page_stays() {
        let mut session = session(3);
        assert_eq!(session.next(), 2);
        assert_eq!(session.next(), 3);
        assert_eq!(session.next(), 3);
        assert_eq!(session.current_page(), 3);
    }

    #[test]
    fn test_set_current_page_clamps() {
        let mut session = session(5);
        assert_eq!(session.set_current_page(0), 1);
        assert_eq!(session.set_current_page(4), 4);
        assert_eq!(session.set_current_page(40), 5);
    }

    #[test]
    fn test_navigation_without_document_is_noop() {
        let mut session = PageSession::new(FakeBackend::default());
        assert_eq!(session.next(), 1);
        assert_eq!(session.set_current_page(7), 1);
    }

    #[test]
    fn test_load_resets_page_and_count() {
        let mut session = session(10);
        session.set_current_page(8);

        let count = session.load(fake_pdf(&[(100.0, 200.0), (300.0, 400.0)])).unwrap();
        assert_eq!(count, 2);
        assert_eq!(session.page_count(), 2);
        assert_eq!(session.current_page(), 1);
        assert_eq!(
            session.page_size(2).unwrap(),
            PageSize { width: 300.0, height: 400.0 }
        );
    }

    #[test]
    fn test_failed_load_keeps_previous_document() {
        let mut session = session(4);
        session.set_current_page(3);

        assert!(session.load(b"not a document".to_vec()).is_err());
        assert_eq!(session.page_count(), 4);
        assert_eq!(session.current_page(), 3);
        assert!(session.is_loaded());
    }

    #[test]
    fn test_empty_document_rejected() {
        let mut session = PageSession::new(FakeBackend::default());
        assert!(matches!(session.load(Vec::new()), Err(PhotonError::EmptyDocument)));
        assert!(!session.is_loaded());
    }

    #[test]
    fn test_page_size_rejects_out_of_range() {
        let session = session(2);
        assert!(matches!(
            session.page_size(3),
            Err(PhotonError::PageOutOfRange { page: 3, page_count: 2 })
        ));
    }

    #[test]
    fn test_close_discards_document() {
        let mut session = session(2);
        session.close();
        assert!(!session.is_loaded());
        assert_eq!(session.page_count(), 0);
    }
}
