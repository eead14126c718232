use crate::error::ScrubError;
use crate::geo::Coordinate;

/// Parsed GPX document. Track points are the only part the scrubber
/// rewrites; everything else is written back as it was read.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GpxDocument {
    /// Namespace prefix of the root element (`g` for `<g:gpx>`). Every GPX
    /// element is written back under it.
    pub prefix: Option<String>,
    /// Attributes of the root `<gpx>` element (version, creator, namespaces),
    /// values kept in their escaped source form.
    pub attributes: Vec<(String, String)>,
    pub metadata: Option<RawElement>,
    pub waypoints: Vec<GpxPoint>,
    pub routes: Vec<GpxRoute>,
    pub tracks: Vec<GpxTrack>,
    /// Other top-level children, usually `<extensions>`.
    pub extras: Vec<RawElement>,
}

impl GpxDocument {
    pub fn track_point_count(&self) -> usize {
        self.tracks
            .iter()
            .flat_map(|trk| &trk.segments)
            .map(|seg| seg.points.len())
            .sum()
    }
}

/// An element the model does not interpret, kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct RawElement {
    /// Qualified name as written in the source, prefix included.
    pub name: String,
    pub attributes: Vec<(String, String)>,
    /// Unparsed inner XML, or `None` for a self-closing element.
    pub inner: Option<String>,
}

/// A single GPX point (used for wpt, rtept, trkpt).
#[derive(Debug, Clone, PartialEq)]
pub struct GpxPoint {
    pub lat: f64,
    pub lon: f64,
    pub ele: Option<f64>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    pub sym: Option<String>,
    pub point_type: Option<String>,
    pub link: Option<GpxLink>,
    /// Children without a typed field (`hdop`, `sat`, `extensions`, ...).
    pub extras: Vec<RawElement>,
    /// Order the children appeared in. Empty for points built in code,
    /// which are written in GPX 1.1 schema order.
    pub children: Vec<PointChild>,
}

impl GpxPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            ele: None,
            time: None,
            name: None,
            cmt: None,
            desc: None,
            src: None,
            sym: None,
            point_type: None,
            link: None,
            extras: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn coordinate(&self) -> Result<Coordinate, ScrubError> {
        Coordinate::new(self.lat, self.lon)
    }
}

/// A child element of a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointChild {
    Ele,
    Time,
    Name,
    Cmt,
    Desc,
    Src,
    Link,
    Sym,
    Type,
    /// Index into [`GpxPoint::extras`].
    Extra(usize),
}

impl PointChild {
    /// Typed children in GPX 1.1 schema order.
    pub const SCHEMA_ORDER: [PointChild; 9] = [
        Self::Ele,
        Self::Time,
        Self::Name,
        Self::Cmt,
        Self::Desc,
        Self::Src,
        Self::Link,
        Self::Sym,
        Self::Type,
    ];
}

/// A GPX link element.
#[derive(Debug, Clone, PartialEq)]
pub struct GpxLink {
    pub href: String,
    pub text: Option<String>,
    pub link_type: Option<String>,
}

/// A GPX route (<rte>).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GpxRoute {
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    pub link: Option<GpxLink>,
    pub number: Option<u32>,
    pub route_type: Option<String>,
    pub points: Vec<GpxPoint>,
    pub extras: Vec<RawElement>,
}

/// A GPX track (<trk>).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub cmt: Option<String>,
    pub desc: Option<String>,
    pub src: Option<String>,
    pub link: Option<GpxLink>,
    pub number: Option<u32>,
    pub track_type: Option<String>,
    pub segments: Vec<GpxSegment>,
    pub extras: Vec<RawElement>,
}

/// A GPX track segment (<trkseg>).
#[derive(Debug, Default, Clone, PartialEq)]
pub struct GpxSegment {
    pub points: Vec<GpxPoint>,
    pub extras: Vec<RawElement>,
}
