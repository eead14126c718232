pub mod error;
pub mod files;
pub mod geo;
pub mod gpx_types;
pub mod options;
pub mod parser;
pub mod scrubber;
pub mod writer;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::error::ScrubError;
use crate::options::ScrubOptions;
use crate::scrubber::{ScrubReport, Scrubber};

/// Scrub a GPX string, returning the cleaned GPX and what was removed.
pub fn scrub_gpx(
    gpx_string: &str,
    options: &ScrubOptions,
) -> Result<(String, ScrubReport), ScrubError> {
    let scrubber = Scrubber::new(options)?;
    let doc = parser::parse_gpx(gpx_string)?;
    let (doc, report) = scrubber.scrub_document(doc)?;
    Ok((writer::to_xml(&doc)?, report))
}

/// Scrub a GPX string, returning the cleaned GPX string.
#[wasm_bindgen(js_name = scrubGpx)]
pub fn scrub_gpx_js(gpx_string: &str, options: JsValue) -> Result<String, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let (gpx, _) = scrub_gpx(gpx_string, &opts)?;
    Ok(gpx)
}

#[derive(Serialize)]
struct ScrubOutput {
    gpx: String,
    report: ScrubReport,
}

/// Scrub a GPX string, returning `{ gpx, report }` as a JS object.
#[wasm_bindgen(js_name = scrubGpxWithReport)]
pub fn scrub_gpx_with_report_js(gpx_string: &str, options: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();

    let opts = parse_options(options)?;
    let (gpx, report) = scrub_gpx(gpx_string, &opts)?;
    serde_wasm_bindgen::to_value(&ScrubOutput { gpx, report })
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_options(options: JsValue) -> Result<ScrubOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Err(JsValue::from_str("options.maxDist is required"));
    }
    serde_wasm_bindgen::from_value(options).map_err(|e| JsValue::from_str(&e.to_string()))
}
