use formats::DatasetError;
use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerError {
    /// A required DOM element id was not found.
    MissingElement(String),
    Config(String),
    Dataset(DatasetError),
    Gpu(String),
    Texture(String),
}

impl std::fmt::Display for ViewerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerError::MissingElement(id) => write!(f, "missing element #{id}"),
            ViewerError::Config(msg) => write!(f, "invalid viewer config: {msg}"),
            ViewerError::Dataset(err) => write!(f, "{err}"),
            ViewerError::Gpu(msg) => write!(f, "gpu error: {msg}"),
            ViewerError::Texture(msg) => write!(f, "texture error: {msg}"),
        }
    }
}

impl std::error::Error for ViewerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ViewerError::Dataset(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DatasetError> for ViewerError {
    fn from(err: DatasetError) -> Self {
        ViewerError::Dataset(err)
    }
}

impl From<ViewerError> for JsValue {
    fn from(err: ViewerError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}
