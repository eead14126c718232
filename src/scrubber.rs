use log::{Level, debug, info, log_enabled, warn};
use serde::Serialize;

use crate::error::ScrubError;
use crate::geo::{Coordinate, bearing, distance};
use crate::gpx_types::*;
use crate::options::ScrubOptions;

type Result<T> = std::result::Result<T, ScrubError>;

/// Position of a segment inside its document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentId {
    pub track: usize,
    pub segment: usize,
}

/// Counts gathered while scrubbing a document.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrubReport {
    pub tracks: usize,
    pub segments: usize,
    pub points_read: usize,
    pub points_kept: usize,
    pub points_dropped: usize,
}

impl ScrubReport {
    fn add_segment(&mut self, read: usize, kept: usize) {
        self.segments += 1;
        self.points_read += read;
        self.points_kept += kept;
        self.points_dropped += read - kept;
    }
}

/// Indices of the points kept by a single greedy pass.
///
/// The first point is the initial anchor. Every later point is compared with
/// the current anchor: farther than `max_dist` and it is dropped, otherwise it
/// is kept and becomes the new anchor.
pub fn retained_indices(coords: &[Coordinate], max_dist: f64) -> Vec<usize> {
    let Some((&first, rest)) = coords.split_first() else {
        return Vec::new();
    };

    let mut kept = Vec::with_capacity(coords.len());
    kept.push(0);
    let mut anchor = first;

    for (offset, &candidate) in rest.iter().enumerate() {
        let index = offset + 1;
        let dist = distance(anchor, candidate);
        if dist > max_dist {
            debug!(
                "drop point #{index} ({}, {}): {dist} m from last kept point",
                candidate.lat(),
                candidate.lon()
            );
            continue;
        }
        if log_enabled!(Level::Debug) {
            debug!(
                "keep point #{index}: {dist} m at {}° from last kept point",
                bearing(anchor, candidate)
            );
        }
        kept.push(index);
        anchor = candidate;
    }

    kept
}

/// Removes implausible jumps from the track segments of a GPX document.
#[derive(Debug, Clone, Copy)]
pub struct Scrubber {
    max_dist: f64,
}

impl Scrubber {
    pub fn new(options: &ScrubOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self {
            max_dist: options.max_dist,
        })
    }

    /// Filter every track segment. Waypoints, routes and all non-point
    /// content are returned untouched.
    pub fn scrub_document(&self, mut doc: GpxDocument) -> Result<(GpxDocument, ScrubReport)> {
        // Reject bad coordinates before any segment is rebuilt.
        for (t, trk) in doc.tracks.iter().enumerate() {
            for (s, seg) in trk.segments.iter().enumerate() {
                segment_coordinates(seg, SegmentId { track: t, segment: s })?;
            }
        }

        let mut report = ScrubReport::default();
        let tracks = std::mem::take(&mut doc.tracks);
        doc.tracks = tracks
            .into_iter()
            .enumerate()
            .map(|(t, trk)| self.scrub_track(trk, t, &mut report))
            .collect::<Result<Vec<_>>>()?;

        info!(
            "scrubbed {} track(s), {} segment(s): kept {} of {} points, dropped {} (max distance {} m)",
            report.tracks,
            report.segments,
            report.points_kept,
            report.points_read,
            report.points_dropped,
            self.max_dist
        );

        Ok((doc, report))
    }

    fn scrub_track(
        &self,
        mut trk: GpxTrack,
        index: usize,
        report: &mut ScrubReport,
    ) -> Result<GpxTrack> {
        report.tracks += 1;
        let segments = std::mem::take(&mut trk.segments);
        trk.segments = segments
            .into_iter()
            .enumerate()
            .map(|(s, seg)| {
                let read = seg.points.len();
                let id = SegmentId {
                    track: index,
                    segment: s,
                };
                let scrubbed = self.scrub_segment(seg, id)?;
                report.add_segment(read, scrubbed.points.len());
                Ok(scrubbed)
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(trk)
    }

    /// Filter one segment. The kept points are a subsequence of the input in
    /// the same order; an empty segment comes back empty.
    pub fn scrub_segment(&self, mut segment: GpxSegment, id: SegmentId) -> Result<GpxSegment> {
        let coords = segment_coordinates(&segment, id)?;
        let read = coords.len();

        let mut keep = retained_indices(&coords, self.max_dist).into_iter().peekable();
        let points = std::mem::take(&mut segment.points);
        segment.points = points
            .into_iter()
            .enumerate()
            .filter(|(i, _)| keep.next_if_eq(i).is_some())
            .map(|(_, pt)| pt)
            .collect();

        let kept = segment.points.len();
        debug!(
            "track {} segment {}: kept {kept} of {read} points",
            id.track, id.segment
        );
        if read > 1 && kept == 1 {
            warn!(
                "track {} segment {}: every point after the first is farther than {} m from it",
                id.track, id.segment, self.max_dist
            );
        }

        Ok(segment)
    }
}

fn segment_coordinates(seg: &GpxSegment, id: SegmentId) -> Result<Vec<Coordinate>> {
    seg.points
        .iter()
        .enumerate()
        .map(|(point, pt)| {
            pt.coordinate().map_err(|_| ScrubError::InvalidInput {
                track: id.track,
                segment: id.segment,
                point,
                latitude: pt.lat,
                longitude: pt.lon,
            })
        })
        .collect()
}
