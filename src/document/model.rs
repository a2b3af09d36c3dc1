use url::Url;

/// Snapshot of an open document: its identity, version and full text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    uri: Url,
    version: i32,
    text: String,
}

impl Document {
    pub fn new(uri: Url, version: i32, text: impl Into<String>) -> Self {
        Self {
            uri,
            version,
            text: text.into(),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    /// Get the document version
    pub fn version(&self) -> i32 {
        self.version
    }

    /// Get the text content
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Get the text content as owned String
    pub fn into_text(self) -> String {
        self.text
    }

    /// Replace text and version together
    pub(crate) fn update(&mut self, version: i32, text: String) {
        self.version = version;
        self.text = text;
    }
}
