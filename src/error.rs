use std::path::PathBuf;
use wasm_bindgen::JsValue;

#[derive(Debug)]
pub enum ScrubError {
    XmlParse(quick_xml::Error),
    XmlWrite(std::io::Error),
    MissingElement(&'static str),
    /// Input ended inside an element that was never closed.
    UnexpectedEof(String),
    UndefinedEntity(String),
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    InvalidAttribute {
        element: &'static str,
        attribute: &'static str,
        value: String,
    },
    InvalidText {
        element: &'static str,
        value: String,
    },
    /// A latitude/longitude pair that is not a usable coordinate.
    InvalidArgument {
        latitude: f64,
        longitude: f64,
    },
    /// A track point whose coordinate cannot be filtered.
    InvalidInput {
        track: usize,
        segment: usize,
        point: usize,
        latitude: f64,
        longitude: f64,
    },
    InvalidThreshold(String),
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for ScrubError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::XmlParse(e) => write!(f, "XML parse error: {e}"),
            Self::XmlWrite(e) => write!(f, "XML write error: {e}"),
            Self::MissingElement(element) => write!(f, "Missing <{element}> element"),
            Self::UnexpectedEof(element) => {
                write!(f, "Unexpected end of file inside <{element}>; the GPX file looks truncated")
            }
            Self::UndefinedEntity(name) => write!(f, "Undefined entity reference '&{name};'"),
            Self::MissingAttribute { element, attribute } => {
                write!(f, "Missing attribute '{attribute}' on <{element}>")
            }
            Self::InvalidAttribute {
                element,
                attribute,
                value,
            } => write!(
                f,
                "Invalid value '{value}' for attribute '{attribute}' on <{element}>"
            ),
            Self::InvalidText { element, value } => {
                write!(f, "Invalid content '{value}' in <{element}>")
            }
            Self::InvalidArgument {
                latitude,
                longitude,
            } => write!(
                f,
                "Invalid coordinate ({latitude}, {longitude}): latitude must be within \
                 [-90, 90] and longitude within [-180, 180]"
            ),
            Self::InvalidInput {
                track,
                segment,
                point,
                latitude,
                longitude,
            } => write!(
                f,
                "Invalid track point #{point} in track {track}, segment {segment}: \
                 ({latitude}, {longitude}) is not a valid coordinate"
            ),
            Self::InvalidThreshold(value) => write!(
                f,
                "Invalid maximum distance '{value}': expected a finite, non-negative number of meters"
            ),
            Self::Io { path, source } => write!(f, "{}: {source}", path.display()),
        }
    }
}

impl std::error::Error for ScrubError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::XmlParse(e) => Some(e),
            Self::XmlWrite(e) => Some(e),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<quick_xml::Error> for ScrubError {
    fn from(e: quick_xml::Error) -> Self {
        Self::XmlParse(e)
    }
}

impl From<std::io::Error> for ScrubError {
    fn from(e: std::io::Error) -> Self {
        Self::XmlWrite(e)
    }
}

impl From<ScrubError> for JsValue {
    fn from(e: ScrubError) -> Self {
        js_sys::Error::new(&e.to_string()).into()
    }
}
