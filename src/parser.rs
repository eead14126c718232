use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};

use crate::error::ScrubError;
use crate::gpx_types::*;

type Result<T> = std::result::Result<T, ScrubError>;

/// Parse a GPX XML string into a GpxDocument.
pub fn parse_gpx(xml: &str) -> Result<GpxDocument> {
    let mut reader = Reader::from_str(xml);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"gpx" => {
                let mut doc = GpxDocument {
                    prefix: root_prefix(&e),
                    attributes: attributes_of(&e)?,
                    ..GpxDocument::default()
                };
                parse_root(&mut reader, &mut doc)?;
                return Ok(doc);
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"gpx" => {
                return Ok(GpxDocument {
                    prefix: root_prefix(&e),
                    attributes: attributes_of(&e)?,
                    ..GpxDocument::default()
                });
            }
            Ok(Event::Eof) => return Err(ScrubError::MissingElement("gpx")),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }
}

fn root_prefix(e: &BytesStart<'_>) -> Option<String> {
    e.name()
        .prefix()
        .map(|p| String::from_utf8_lossy(p.as_ref()).into_owned())
}

/// Parse the children of the root `<gpx>` element.
fn parse_root<'a>(reader: &mut Reader<&'a [u8]>, doc: &mut GpxDocument) -> Result<()> {
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"metadata" => doc.metadata = Some(read_raw(reader, &e)?),
                b"wpt" => doc.waypoints.push(parse_point(&e, reader)?),
                b"rte" => doc.routes.push(parse_route(reader)?),
                b"trk" => doc.tracks.push(parse_track(reader)?),
                _ => doc.extras.push(read_raw(reader, &e)?),
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"metadata" => doc.metadata = Some(empty_raw(&e)?),
                b"wpt" => doc.waypoints.push(empty_point(&e)?),
                b"rte" => doc.routes.push(GpxRoute::default()),
                b"trk" => doc.tracks.push(GpxTrack::default()),
                _ => doc.extras.push(empty_raw(&e)?),
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"gpx" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(b"gpx")),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(())
}

/// Parse lat/lon attributes from a point element's start tag.
fn parse_lat_lon(e: &BytesStart<'_>, element: &'static str) -> Result<(f64, f64)> {
    let mut lat: Option<f64> = None;
    let mut lon: Option<f64> = None;

    for attr_result in e.attributes() {
        let attr = attr_result.map_err(|e| ScrubError::XmlParse(e.into()))?;
        let key = attr.key.local_name();
        let val = std::str::from_utf8(&attr.value).unwrap_or_default();
        match key.as_ref() {
            b"lat" => {
                lat = Some(val.trim().parse::<f64>().map_err(|_| {
                    ScrubError::InvalidAttribute {
                        element,
                        attribute: "lat",
                        value: val.to_string(),
                    }
                })?);
            }
            b"lon" => {
                lon = Some(val.trim().parse::<f64>().map_err(|_| {
                    ScrubError::InvalidAttribute {
                        element,
                        attribute: "lon",
                        value: val.to_string(),
                    }
                })?);
            }
            _ => {}
        }
    }

    let lat = lat.ok_or(ScrubError::MissingAttribute {
        element,
        attribute: "lat",
    })?;
    let lon = lon.ok_or(ScrubError::MissingAttribute {
        element,
        attribute: "lon",
    })?;

    Ok((lat, lon))
}

fn point_element_name(e: &BytesStart<'_>) -> &'static str {
    match e.local_name().as_ref() {
        b"wpt" => "wpt",
        b"rtept" => "rtept",
        _ => "trkpt",
    }
}

/// A self-closing point element such as `<trkpt lat=".." lon=".."/>`.
fn empty_point(e: &BytesStart<'_>) -> Result<GpxPoint> {
    let (lat, lon) = parse_lat_lon(e, point_element_name(e))?;
    Ok(GpxPoint::new(lat, lon))
}

/// Parse a point element (wpt, rtept, trkpt) and its children.
/// Called after receiving Event::Start for the point element.
fn parse_point<'a>(start: &BytesStart<'a>, reader: &mut Reader<&'a [u8]>) -> Result<GpxPoint> {
    let (lat, lon) = parse_lat_lon(start, point_element_name(start))?;

    let mut point = GpxPoint::new(lat, lon);
    let end_name = start.name().0.to_vec(); // own the end tag name for comparison

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let child = match e.local_name().as_ref() {
                    b"ele" => {
                        let text = read_text_owned(reader, &e)?;
                        point.ele = Some(text.trim().parse::<f64>().map_err(|_| {
                            ScrubError::InvalidText {
                                element: "ele",
                                value: text.clone(),
                            }
                        })?);
                        PointChild::Ele
                    }
                    b"time" => {
                        point.time = Some(read_text_owned(reader, &e)?);
                        PointChild::Time
                    }
                    b"name" => {
                        point.name = Some(read_text_owned(reader, &e)?);
                        PointChild::Name
                    }
                    b"cmt" => {
                        point.cmt = Some(read_text_owned(reader, &e)?);
                        PointChild::Cmt
                    }
                    b"desc" => {
                        point.desc = Some(read_text_owned(reader, &e)?);
                        PointChild::Desc
                    }
                    b"src" => {
                        point.src = Some(read_text_owned(reader, &e)?);
                        PointChild::Src
                    }
                    b"sym" => {
                        point.sym = Some(read_text_owned(reader, &e)?);
                        PointChild::Sym
                    }
                    b"type" => {
                        point.point_type = Some(read_text_owned(reader, &e)?);
                        PointChild::Type
                    }
                    b"link" => {
                        point.link = Some(parse_link(&e, reader)?);
                        PointChild::Link
                    }
                    _ => {
                        point.extras.push(read_raw(reader, &e)?);
                        PointChild::Extra(point.extras.len() - 1)
                    }
                };
                record_child(&mut point, child);
            }
            Ok(Event::Empty(e)) => {
                let child = match e.local_name().as_ref() {
                    b"link" => {
                        point.link = Some(empty_link(&e));
                        PointChild::Link
                    }
                    _ => {
                        point.extras.push(empty_raw(&e)?);
                        PointChild::Extra(point.extras.len() - 1)
                    }
                };
                record_child(&mut point, child);
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(unexpected_eof(&end_name)),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(point)
}

/// A repeated typed child keeps its first position; the last value wins.
fn record_child(point: &mut GpxPoint, child: PointChild) {
    if !point.children.contains(&child) {
        point.children.push(child);
    }
}

fn link_href(start: &BytesStart<'_>) -> String {
    let mut href = String::new();
    for attr in start.attributes().flatten() {
        if attr.key.local_name().as_ref() == b"href" {
            href = std::str::from_utf8(&attr.value)
                .ok()
                .and_then(|raw| unescape(raw).ok())
                .map(|v| v.into_owned())
                .unwrap_or_default();
        }
    }
    href
}

fn empty_link(start: &BytesStart<'_>) -> GpxLink {
    GpxLink {
        href: link_href(start),
        text: None,
        link_type: None,
    }
}

/// Parse a <link> element.
fn parse_link<'a>(start: &BytesStart<'a>, reader: &mut Reader<&'a [u8]>) -> Result<GpxLink> {
    let mut link = empty_link(start);

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"text" => link.text = Some(read_text_owned(reader, &e)?),
                b"type" => link.link_type = Some(read_text_owned(reader, &e)?),
                _ => {
                    reader
                        .read_to_end(e.name())
                        .map_err(ScrubError::XmlParse)?;
                }
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"link" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(b"link")),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(link)
}

/// Parse a <rte> element.
fn parse_route<'a>(reader: &mut Reader<&'a [u8]>) -> Result<GpxRoute> {
    let mut route = GpxRoute::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => route.name = Some(read_text_owned(reader, &e)?),
                b"cmt" => route.cmt = Some(read_text_owned(reader, &e)?),
                b"desc" => route.desc = Some(read_text_owned(reader, &e)?),
                b"src" => route.src = Some(read_text_owned(reader, &e)?),
                b"type" => route.route_type = Some(read_text_owned(reader, &e)?),
                b"number" => route.number = Some(parse_number(reader, &e)?),
                b"link" => route.link = Some(parse_link(&e, reader)?),
                b"rtept" => route.points.push(parse_point(&e, reader)?),
                _ => route.extras.push(read_raw(reader, &e)?),
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"rtept" => route.points.push(empty_point(&e)?),
                b"link" => route.link = Some(empty_link(&e)),
                _ => route.extras.push(empty_raw(&e)?),
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"rte" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(b"rte")),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(route)
}

/// Parse a <trk> element.
fn parse_track<'a>(reader: &mut Reader<&'a [u8]>) -> Result<GpxTrack> {
    let mut track = GpxTrack::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"name" => track.name = Some(read_text_owned(reader, &e)?),
                b"cmt" => track.cmt = Some(read_text_owned(reader, &e)?),
                b"desc" => track.desc = Some(read_text_owned(reader, &e)?),
                b"src" => track.src = Some(read_text_owned(reader, &e)?),
                b"type" => track.track_type = Some(read_text_owned(reader, &e)?),
                b"number" => track.number = Some(parse_number(reader, &e)?),
                b"link" => track.link = Some(parse_link(&e, reader)?),
                b"trkseg" => track.segments.push(parse_segment(reader)?),
                _ => track.extras.push(read_raw(reader, &e)?),
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                // Kept so that empty segments survive the round trip.
                b"trkseg" => track.segments.push(GpxSegment::default()),
                b"link" => track.link = Some(empty_link(&e)),
                _ => track.extras.push(empty_raw(&e)?),
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trk" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(b"trk")),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(track)
}

/// Parse a <trkseg> element.
fn parse_segment<'a>(reader: &mut Reader<&'a [u8]>) -> Result<GpxSegment> {
    let mut segment = GpxSegment::default();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"trkpt" => segment.points.push(parse_point(&e, reader)?),
                _ => segment.extras.push(read_raw(reader, &e)?),
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"trkpt" => segment.points.push(empty_point(&e)?),
                _ => segment.extras.push(empty_raw(&e)?),
            },
            Ok(Event::End(e)) if e.local_name().as_ref() == b"trkseg" => break,
            Ok(Event::Eof) => return Err(unexpected_eof(b"trkseg")),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(segment)
}

fn parse_number<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<u32> {
    let text = read_text_owned(reader, start)?;
    text.trim()
        .parse::<u32>()
        .map_err(|_| ScrubError::InvalidText {
            element: "number",
            value: text.clone(),
        })
}

/// Attributes of a tag as (qualified name, raw value) pairs.
fn attributes_of(e: &BytesStart<'_>) -> Result<Vec<(String, String)>> {
    e.attributes()
        .map(|attr_result| {
            let attr = attr_result.map_err(|e| ScrubError::XmlParse(e.into()))?;
            Ok((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                String::from_utf8_lossy(&attr.value).into_owned(),
            ))
        })
        .collect()
}

/// Capture an element the model does not interpret, inner markup included.
fn read_raw<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<RawElement> {
    let inner = reader
        .read_text(start.name())
        .map_err(ScrubError::XmlParse)?;

    Ok(RawElement {
        name: String::from_utf8_lossy(start.name().as_ref()).into_owned(),
        attributes: attributes_of(start)?,
        inner: Some(inner.into_owned()),
    })
}

/// End of input reached while `name` was still open.
fn unexpected_eof(name: &[u8]) -> ScrubError {
    ScrubError::UnexpectedEof(String::from_utf8_lossy(name).into_owned())
}

fn empty_raw(e: &BytesStart<'_>) -> Result<RawElement> {
    Ok(RawElement {
        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
        attributes: attributes_of(e)?,
        inner: None,
    })
}

/// Read text content of an element as an owned String.
/// Handles regular text, CDATA sections, and entity references (Event::GeneralRef).
fn read_text_owned<'a>(reader: &mut Reader<&'a [u8]>, start: &BytesStart<'_>) -> Result<String> {
    let end_name = start.name().0.to_vec();
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                let raw = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(raw);
            }
            Ok(Event::CData(e)) => {
                let s = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                text.push_str(s);
            }
            Ok(Event::GeneralRef(e)) => {
                if let Ok(Some(ch)) = e.resolve_char_ref() {
                    text.push(ch);
                } else {
                    let name = std::str::from_utf8(e.as_ref()).unwrap_or_default();
                    match name {
                        "amp" => text.push('&'),
                        "lt" => text.push('<'),
                        "gt" => text.push('>'),
                        "quot" => text.push('"'),
                        "apos" => text.push('\''),
                        _ => return Err(ScrubError::UndefinedEntity(name.to_string())),
                    }
                }
            }
            Ok(Event::End(e)) if e.name().0 == end_name.as_slice() => break,
            Ok(Event::Eof) => return Err(unexpected_eof(&end_name)),
            Err(e) => return Err(ScrubError::XmlParse(e)),
            _ => {}
        }
    }

    Ok(text)
}
