use std::borrow::Cow;

use quick_xml::Writer;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::QName;

use crate::error::ScrubError;
use crate::gpx_types::*;

type Result<T> = std::result::Result<T, ScrubError>;

/// Serialize a document back to GPX XML.
///
/// Point children keep the order they were read in, and raw elements keep
/// their content. Everything else is written in GPX 1.1 schema order.
pub fn to_xml(doc: &GpxDocument) -> Result<String> {
    let mut out = GpxWriter {
        writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        prefix: doc.prefix.clone(),
    };
    out.document(doc)?;

    String::from_utf8(out.writer.into_inner()).map_err(|e| {
        ScrubError::XmlWrite(std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })
}

struct GpxWriter {
    writer: Writer<Vec<u8>>,
    /// Prefix of the source root, applied to every GPX element.
    prefix: Option<String>,
}

impl GpxWriter {
    fn emit(&mut self, event: Event<'_>) -> Result<()> {
        self.writer.write_event(event)?;
        Ok(())
    }

    fn qualify(&self, local: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{local}"),
            None => local.to_string(),
        }
    }

    fn start(&self, local: &str) -> BytesStart<'static> {
        BytesStart::new(self.qualify(local))
    }

    fn end(&mut self, local: &str) -> Result<()> {
        let name = self.qualify(local);
        self.emit(Event::End(BytesEnd::new(name)))
    }

    fn document(&mut self, doc: &GpxDocument) -> Result<()> {
        self.emit(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        let root = self.qualify("gpx");
        self.emit(Event::Start(raw_start(&root, &doc.attributes)))?;

        if let Some(metadata) = &doc.metadata {
            self.raw(metadata)?;
        }
        for wpt in &doc.waypoints {
            self.point("wpt", wpt)?;
        }
        for rte in &doc.routes {
            self.route(rte)?;
        }
        for trk in &doc.tracks {
            self.track(trk)?;
        }
        for extra in &doc.extras {
            self.raw(extra)?;
        }

        self.end("gpx")
    }

    fn route(&mut self, rte: &GpxRoute) -> Result<()> {
        self.emit(Event::Start(self.start("rte")))?;
        self.optional_text("name", &rte.name)?;
        self.optional_text("cmt", &rte.cmt)?;
        self.optional_text("desc", &rte.desc)?;
        self.optional_text("src", &rte.src)?;
        if let Some(link) = &rte.link {
            self.link(link)?;
        }
        if let Some(n) = rte.number {
            self.text_element("number", &n.to_string())?;
        }
        self.optional_text("type", &rte.route_type)?;
        for extra in &rte.extras {
            self.raw(extra)?;
        }
        for pt in &rte.points {
            self.point("rtept", pt)?;
        }
        self.end("rte")
    }

    fn track(&mut self, trk: &GpxTrack) -> Result<()> {
        self.emit(Event::Start(self.start("trk")))?;
        self.optional_text("name", &trk.name)?;
        self.optional_text("cmt", &trk.cmt)?;
        self.optional_text("desc", &trk.desc)?;
        self.optional_text("src", &trk.src)?;
        if let Some(link) = &trk.link {
            self.link(link)?;
        }
        if let Some(n) = trk.number {
            self.text_element("number", &n.to_string())?;
        }
        self.optional_text("type", &trk.track_type)?;
        for extra in &trk.extras {
            self.raw(extra)?;
        }
        for seg in &trk.segments {
            self.segment(seg)?;
        }
        self.end("trk")
    }

    fn segment(&mut self, seg: &GpxSegment) -> Result<()> {
        if seg.points.is_empty() && seg.extras.is_empty() {
            return self.emit(Event::Empty(self.start("trkseg")));
        }

        self.emit(Event::Start(self.start("trkseg")))?;
        for pt in &seg.points {
            self.point("trkpt", pt)?;
        }
        for extra in &seg.extras {
            self.raw(extra)?;
        }
        self.end("trkseg")
    }

    fn point(&mut self, tag: &str, pt: &GpxPoint) -> Result<()> {
        let lat = pt.lat.to_string();
        let lon = pt.lon.to_string();
        let mut start = self.start(tag);
        start.push_attribute(("lat", lat.as_str()));
        start.push_attribute(("lon", lon.as_str()));

        let has_children = pt.ele.is_some()
            || pt.time.is_some()
            || pt.name.is_some()
            || pt.cmt.is_some()
            || pt.desc.is_some()
            || pt.src.is_some()
            || pt.link.is_some()
            || pt.sym.is_some()
            || pt.point_type.is_some()
            || !pt.extras.is_empty();
        if !has_children {
            return self.emit(Event::Empty(start));
        }

        self.emit(Event::Start(start))?;
        // Recorded order first, then whatever it does not mention.
        let fallback = PointChild::SCHEMA_ORDER
            .into_iter()
            .chain((0..pt.extras.len()).map(PointChild::Extra));
        let mut written = Vec::new();
        for child in pt.children.iter().copied().chain(fallback) {
            if !written.contains(&child) {
                written.push(child);
                self.point_child(pt, child)?;
            }
        }
        self.end(tag)
    }

    /// Write one child of `pt`, or nothing if it is absent.
    fn point_child(&mut self, pt: &GpxPoint, child: PointChild) -> Result<()> {
        match child {
            PointChild::Ele => match pt.ele {
                Some(ele) => self.text_element("ele", &ele.to_string()),
                None => Ok(()),
            },
            PointChild::Time => self.optional_text("time", &pt.time),
            PointChild::Name => self.optional_text("name", &pt.name),
            PointChild::Cmt => self.optional_text("cmt", &pt.cmt),
            PointChild::Desc => self.optional_text("desc", &pt.desc),
            PointChild::Src => self.optional_text("src", &pt.src),
            PointChild::Link => match &pt.link {
                Some(link) => self.link(link),
                None => Ok(()),
            },
            PointChild::Sym => self.optional_text("sym", &pt.sym),
            PointChild::Type => self.optional_text("type", &pt.point_type),
            PointChild::Extra(i) => match pt.extras.get(i) {
                Some(extra) => self.raw(extra),
                None => Ok(()),
            },
        }
    }

    fn link(&mut self, link: &GpxLink) -> Result<()> {
        let mut start = self.start("link");
        start.push_attribute(("href", link.href.as_str()));

        if link.text.is_none() && link.link_type.is_none() {
            return self.emit(Event::Empty(start));
        }

        self.emit(Event::Start(start))?;
        self.optional_text("text", &link.text)?;
        self.optional_text("type", &link.link_type)?;
        self.end("link")
    }

    /// Raw elements keep the name they were read with.
    fn raw(&mut self, element: &RawElement) -> Result<()> {
        let start = raw_start(&element.name, &element.attributes);
        match &element.inner {
            None => self.emit(Event::Empty(start)),
            Some(inner) => {
                self.emit(Event::Start(start))?;
                // Already-escaped markup, written back byte for byte.
                self.emit(Event::Text(BytesText::from_escaped(inner.as_str())))?;
                self.emit(Event::End(BytesEnd::new(element.name.as_str())))
            }
        }
    }

    fn text_element(&mut self, local: &str, text: &str) -> Result<()> {
        self.emit(Event::Start(self.start(local)))?;
        self.emit(Event::Text(BytesText::new(text)))?;
        self.end(local)
    }

    fn optional_text(&mut self, local: &str, value: &Option<String>) -> Result<()> {
        match value {
            Some(text) => self.text_element(local, text),
            None => Ok(()),
        }
    }
}

/// Start tag whose attribute values are already escaped.
fn raw_start<'a>(name: &'a str, attributes: &'a [(String, String)]) -> BytesStart<'a> {
    let mut start = BytesStart::new(name);
    for (key, value) in attributes {
        start.push_attribute(Attribute {
            key: QName(key.as_bytes()),
            value: Cow::Borrowed(value.as_bytes()),
        });
    }
    start
}
