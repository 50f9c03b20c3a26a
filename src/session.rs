use crate::models::SourceDocument;
use crate::utils::sanitize_file_name;

/// Output name used until the caller picks one
pub const DEFAULT_FILE_NAME: &str = "extracted_info";

/// Fixed name of the Harmonised DAA workbook
pub const DETAIL_FILE_NAME: &str = "Harmonised_DAA_format.xlsx";

/// Caller-owned upload state.
///
/// The extraction core never holds on to this. Callers pass it in, get an
/// updated value back, and keep it for as long as their session lives.
#[derive(Debug, Clone)]
pub struct UploadSession {
    documents: Vec<SourceDocument>,
    file_name: String,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new(DEFAULT_FILE_NAME)
    }
}

impl UploadSession {
    pub fn new(default_file_name: &str) -> Self {
        Self {
            documents: Vec::new(),
            file_name: fallback_name(default_file_name),
        }
    }

    /// Append uploads after the ones already in the session, keeping their order
    pub fn with_documents(mut self, documents: impl IntoIterator<Item = SourceDocument>) -> Self {
        self.documents.extend(documents);
        self
    }

    /// Remember an output name. Forbidden characters are stripped; a name
    /// that ends up empty keeps the previous one.
    pub fn with_file_name(mut self, name: &str) -> Self {
        let sanitized = sanitize_file_name(name);
        if !sanitized.is_empty() {
            self.file_name = sanitized;
        }
        self
    }

    /// Drop all uploads, keep the remembered file name
    pub fn clear(mut self) -> Self {
        self.documents.clear();
        self
    }

    pub fn documents(&self) -> &[SourceDocument] {
        &self.documents
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Download name of the iLab workbook
    pub fn aggregate_file_name(&self) -> String {
        format!("{}.xlsx", self.file_name)
    }

    pub fn detail_file_name(&self) -> &'static str {
        DETAIL_FILE_NAME
    }
}

fn fallback_name(name: &str) -> String {
    let sanitized = sanitize_file_name(name);
    if sanitized.is_empty() {
        DEFAULT_FILE_NAME.to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(name: &str) -> SourceDocument {
        SourceDocument::new(name, Vec::new())
    }

    fn names(session: &UploadSession) -> Vec<&str> {
        session.documents().iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_default_file_name() {
        let session = UploadSession::default();
        assert_eq!(session.aggregate_file_name(), "extracted_info.xlsx");
        assert_eq!(session.detail_file_name(), "Harmonised_DAA_format.xlsx");
    }

    #[test]
    fn test_uploads_append_in_order() {
        let session = UploadSession::default()
            .with_documents(vec![doc("a.pdf"), doc("b.pdf")])
            .with_documents(vec![doc("c.pdf")]);
        assert_eq!(names(&session), vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_file_name_is_sanitized() {
        let session = UploadSession::default().with_file_name("lot:99/final");
        assert_eq!(session.aggregate_file_name(), "lot99final.xlsx");
    }

    #[test]
    fn test_empty_file_name_keeps_previous() {
        let session = UploadSession::default()
            .with_file_name("batch_7")
            .with_file_name("???");
        assert_eq!(session.file_name(), "batch_7");
    }

    #[test]
    fn test_clear_keeps_file_name() {
        let session = UploadSession::default()
            .with_file_name("batch_7")
            .with_documents(vec![doc("a.pdf")])
            .clear();
        assert!(session.documents().is_empty());
        assert_eq!(session.file_name(), "batch_7");
    }

    #[test]
    fn test_invalid_default_falls_back() {
        let session = UploadSession::new("//");
        assert_eq!(session.file_name(), DEFAULT_FILE_NAME);
    }
}
