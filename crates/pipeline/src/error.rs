#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// The archive has no `.kml` member, or the KML is not well-formed
    /// XML. Fatal: the whole run aborts before any write.
    #[error("Format error: {0}")]
    Format(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<quick_xml::Error> for ImportError {
    fn from(e: quick_xml::Error) -> Self {
        Self::Format(format!("malformed KML document: {e}"))
    }
}

impl From<zip::result::ZipError> for ImportError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::Format(format!("unreadable KMZ archive: {e}"))
    }
}
