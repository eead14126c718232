use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::error::ScrubError;
use crate::options::ScrubOptions;
use crate::parser::parse_gpx;
use crate::scrubber::{ScrubReport, Scrubber};
use crate::writer::to_xml;

type Result<T> = std::result::Result<T, ScrubError>;

/// Scrub the GPX file at `input` and write the result to `output`.
///
/// The threshold is checked before `input` is opened. `output` is replaced
/// in one rename, so on any failure it is left as it was.
pub fn scrub_file(input: &Path, output: &Path, options: &ScrubOptions) -> Result<ScrubReport> {
    let scrubber = Scrubber::new(options)?;

    let xml = fs::read_to_string(input).map_err(|source| ScrubError::Io {
        path: input.to_path_buf(),
        source,
    })?;
    debug!("read {} bytes from {}", xml.len(), input.display());

    let doc = parse_gpx(&xml)?;
    let (doc, report) = scrubber.scrub_document(doc)?;
    let scrubbed = to_xml(&doc)?;

    write_replacing(output, scrubbed.as_bytes())?;
    info!("wrote {} ({} bytes)", output.display(), scrubbed.len());

    Ok(report)
}

/// Write to a sibling temporary file, then rename it over `path`.
fn write_replacing(path: &Path, contents: &[u8]) -> Result<()> {
    let tmp = temp_path(path);
    if let Err(source) = fs::write(&tmp, contents).and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(ScrubError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", std::process::id()))
}
