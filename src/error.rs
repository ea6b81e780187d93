//! Error types for the DHD conversion pipeline.

use std::path::PathBuf;

/// Result type alias for DHD builder operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can abort a conversion run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required report field is absent
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A component in the stack order has no catalog image
    #[error("No image registered for component '{0}'")]
    UnresolvedComponent(String),

    /// The component image directory does not exist
    #[error("Component image directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    /// The stack order produced no rows to draw
    #[error("Stack has zero height; nothing to save")]
    EmptyStack,

    /// The stack would not fit in one image buffer
    #[error("Stack is too large to compose")]
    StackTooLarge,

    /// Picture scale is not a positive finite number
    #[error("Invalid picture scale: {0}")]
    InvalidScale(f64),

    /// The workbook template is not a usable XLSX package
    #[error("Invalid workbook template: {0}")]
    InvalidTemplate(String),

    /// A cell reference like `D2` could not be parsed
    #[error("Invalid cell reference: '{0}'")]
    InvalidCellRef(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Report JSON could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Image decode/encode error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// XLSX container error
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Streaming XML error while patching a part
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// XML parse error while reading a part
    #[error("XML parse error: {0}")]
    XmlParse(#[from] roxmltree::Error),
}

impl From<quick_xml::events::attributes::AttrError> for Error {
    fn from(err: quick_xml::events::attributes::AttrError) -> Self {
        Error::Xml(quick_xml::Error::from(err))
    }
}
