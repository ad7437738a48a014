//! A `.lax` spatial index: a quadtree over a file's point indices, letting a
//! rectangular query skip straight to the chunks that can contain a hit
//! instead of decoding the whole file.
//!
//! Unlike the header/VLR readers this module has no direct counterpart in
//! the point codec itself; it is built from the on-disk layout described
//! for the sidecar (magic, quadtree descriptor, per-cell interval arrays)
//! rather than adapted from an existing reader/writer pair.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

use crate::container::vlr::Vlr;
use crate::{LasZipError, Result};

pub const USER_ID: &str = "LAStools";
pub const RECORD_ID: u16 = 30;
const MAGIC: [u8; 4] = *b"LASX";

/// An axis-aligned rectangle in point-cloud coordinate space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Rect {
    fn intersects(&self, other: &Rect) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    fn quadrant(&self, q: usize) -> Rect {
        let mid_x = (self.min_x + self.max_x) / 2.0;
        let mid_y = (self.min_y + self.max_y) / 2.0;
        match q {
            0 => Rect { min_x: self.min_x, min_y: self.min_y, max_x: mid_x, max_y: mid_y },
            1 => Rect { min_x: mid_x, min_y: self.min_y, max_x: self.max_x, max_y: mid_y },
            2 => Rect { min_x: self.min_x, min_y: mid_y, max_x: mid_x, max_y: self.max_y },
            _ => Rect { min_x: mid_x, min_y: mid_y, max_x: self.max_x, max_y: self.max_y },
        }
    }
}

/// A contiguous run of point indices, stored as `[start, start + len)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: u32,
    pub len: u32,
}

enum Node {
    Leaf { bounds: Rect, intervals: Vec<Interval> },
    Branch { bounds: Rect, children: Vec<Node> },
}

impl Node {
    fn bounds(&self) -> Rect {
        match self {
            Node::Leaf { bounds, .. } => *bounds,
            Node::Branch { bounds, .. } => *bounds,
        }
    }

    fn point_count(&self) -> usize {
        match self {
            Node::Leaf { intervals, .. } => intervals.iter().map(|i| i.len as usize).sum(),
            Node::Branch { children, .. } => children.iter().map(Node::point_count).sum(),
        }
    }

    fn query(&self, rect: &Rect, out: &mut Vec<Interval>) {
        if !self.bounds().intersects(rect) {
            return;
        }
        match self {
            Node::Leaf { intervals, .. } => out.extend_from_slice(intervals),
            Node::Branch { children, .. } => {
                for child in children {
                    child.query(rect, out);
                }
            }
        }
    }

    /// Bottom-up coarsening: collapses a branch into a leaf once its total
    /// point count falls below `minimum_points`.
    fn coarsen(self, minimum_points: usize) -> Node {
        match self {
            Node::Branch { bounds, children } => {
                let children: Vec<Node> =
                    children.into_iter().map(|c| c.coarsen(minimum_points)).collect();
                let total: usize = children.iter().map(Node::point_count).sum();
                if total < minimum_points {
                    let mut intervals: Vec<Interval> = children
                        .into_iter()
                        .flat_map(|c| match c {
                            Node::Leaf { intervals, .. } => intervals,
                            Node::Branch { .. } => unreachable!("coarsened child is a leaf"),
                        })
                        .collect();
                    compact_intervals(&mut intervals);
                    Node::Leaf { bounds, intervals }
                } else {
                    Node::Branch { bounds, children }
                }
            }
            leaf => leaf,
        }
    }

    fn leaf_count(&self) -> usize {
        match self {
            Node::Leaf { .. } => 1,
            Node::Branch { children, .. } => children.iter().map(Node::leaf_count).sum(),
        }
    }
}

/// Merges adjacent/overlapping `(start, len)` runs so a leaf's point list is
/// stored as the smallest possible number of intervals.
fn compact_intervals(intervals: &mut Vec<Interval>) {
    intervals.sort_by_key(|i| i.start);
    let mut out: Vec<Interval> = Vec::with_capacity(intervals.len());
    for interval in intervals.drain(..) {
        if let Some(last) = out.last_mut() {
            if interval.start <= last.start + last.len {
                last.len = last.len.max(interval.start + interval.len - last.start);
                continue;
            }
        }
        out.push(interval);
    }
    *intervals = out;
}

/// A built spatial index: a quadtree whose leaves hold run-length-compacted
/// point-index intervals.
pub struct SpatialIndex {
    root: Node,
}

impl SpatialIndex {
    /// Builds an index over `points` (x, y pairs in file order), subdividing
    /// any cell holding more than `cell_capacity` points, then coarsening
    /// back up so no leaf holds fewer than `minimum_points` (unless it is
    /// the root).
    pub fn build(points: &[(f64, f64)], cell_capacity: usize, minimum_points: usize) -> Self {
        let bounds = bounding_rect(points);
        let indices: Vec<u32> = (0..points.len() as u32).collect();
        let mut root = Self::subdivide(points, &indices, bounds, cell_capacity, 0);
        root = root.coarsen(minimum_points);
        Self { root }
    }

    fn subdivide(
        points: &[(f64, f64)],
        indices: &[u32],
        bounds: Rect,
        cell_capacity: usize,
        depth: u32,
    ) -> Node {
        if indices.len() <= cell_capacity || depth >= 24 {
            let mut intervals: Vec<Interval> =
                indices.iter().map(|&i| Interval { start: i, len: 1 }).collect();
            compact_intervals(&mut intervals);
            return Node::Leaf { bounds, intervals };
        }

        let mut buckets: [Vec<u32>; 4] = Default::default();
        for &i in indices {
            let (x, y) = points[i as usize];
            let q = quadrant_of(&bounds, x, y);
            buckets[q].push(i);
        }

        let children = (0..4)
            .map(|q| {
                Self::subdivide(points, &buckets[q], bounds.quadrant(q), cell_capacity, depth + 1)
            })
            .collect();
        Node::Branch { bounds, children }
    }

    /// Caps the number of leaves (and therefore intervals) in the index by
    /// repeatedly raising `minimum_points` and re-coarsening until the leaf
    /// count is at or below `max_intervals`.
    pub fn cap_intervals(self, max_intervals: usize, points: &[(f64, f64)], cell_capacity: usize) -> Self {
        if self.root.leaf_count() <= max_intervals {
            return self;
        }
        let bounds = self.root.bounds();
        let total = self.root.point_count();
        let mut minimum_points = total.max(1) / max_intervals.max(1);
        let mut root = self.root;
        loop {
            minimum_points = (minimum_points * 2).max(1);
            let rebuilt = Self::subdivide(
                points,
                &(0..points.len() as u32).collect::<Vec<_>>(),
                bounds,
                cell_capacity,
                0,
            )
            .coarsen(minimum_points);
            let leaves = rebuilt.leaf_count();
            root = rebuilt;
            if leaves <= max_intervals || minimum_points >= total.max(1) {
                break;
            }
        }
        Self { root }
    }

    /// Returns the deduplicated, sorted set of point-index intervals that
    /// intersect `rect`.
    pub fn query(&self, rect: &Rect) -> Vec<Interval> {
        let mut out = Vec::new();
        self.root.query(rect, &mut out);
        compact_intervals(&mut out);
        out
    }

    pub fn read_from<R: Read>(mut src: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        src.read_exact(&mut magic)?;
        if magic != MAGIC {
            return Err(LasZipError::CorruptStream("bad spatial index magic"));
        }
        let min_x = src.read_f64::<LittleEndian>()?;
        let min_y = src.read_f64::<LittleEndian>()?;
        let max_x = src.read_f64::<LittleEndian>()?;
        let max_y = src.read_f64::<LittleEndian>()?;
        let bounds = Rect { min_x, min_y, max_x, max_y };
        let root = Self::read_node(&mut src, bounds)?;
        Ok(Self { root })
    }

    fn read_node<R: Read>(src: &mut R, bounds: Rect) -> Result<Node> {
        let is_branch = src.read_u8()? != 0;
        if is_branch {
            let mut children = Vec::with_capacity(4);
            for q in 0..4 {
                children.push(Self::read_node(src, bounds.quadrant(q))?);
            }
            Ok(Node::Branch { bounds, children })
        } else {
            let count = src.read_u32::<LittleEndian>()? as usize;
            let mut intervals = Vec::with_capacity(count);
            for _ in 0..count {
                let start = src.read_u32::<LittleEndian>()?;
                let len = src.read_u32::<LittleEndian>()?;
                intervals.push(Interval { start, len });
            }
            Ok(Node::Leaf { bounds, intervals })
        }
    }

    pub fn write_to<W: Write>(&self, mut dst: W) -> Result<()> {
        dst.write_all(&MAGIC)?;
        let bounds = self.root.bounds();
        dst.write_f64::<LittleEndian>(bounds.min_x)?;
        dst.write_f64::<LittleEndian>(bounds.min_y)?;
        dst.write_f64::<LittleEndian>(bounds.max_x)?;
        dst.write_f64::<LittleEndian>(bounds.max_y)?;
        Self::write_node(&self.root, &mut dst)
    }

    fn write_node<W: Write>(node: &Node, dst: &mut W) -> Result<()> {
        match node {
            Node::Branch { children, .. } => {
                dst.write_u8(1)?;
                for child in children {
                    Self::write_node(child, dst)?;
                }
                Ok(())
            }
            Node::Leaf { intervals, .. } => {
                dst.write_u8(0)?;
                dst.write_u32::<LittleEndian>(intervals.len() as u32)?;
                for interval in intervals {
                    dst.write_u32::<LittleEndian>(interval.start)?;
                    dst.write_u32::<LittleEndian>(interval.len)?;
                }
                Ok(())
            }
        }
    }

    /// Wraps the serialized index as an EVLR suitable for appending to a
    /// self-contained indexed LAZ file, rather than writing a separate
    /// `.lax` sidecar.
    pub fn to_vlr(&self) -> Result<Vlr> {
        let mut data = Vec::new();
        self.write_to(&mut data)?;
        Ok(Vlr::new(USER_ID, RECORD_ID, "spatial index", data))
    }

    pub fn from_vlr(vlr: &Vlr) -> Result<Option<Self>> {
        if !vlr.matches(USER_ID, RECORD_ID) {
            return Ok(None);
        }
        Self::read_from(vlr.data.as_slice()).map(Some)
    }
}

fn quadrant_of(bounds: &Rect, x: f64, y: f64) -> usize {
    let mid_x = (bounds.min_x + bounds.max_x) / 2.0;
    let mid_y = (bounds.min_y + bounds.max_y) / 2.0;
    match (x >= mid_x, y >= mid_y) {
        (false, false) => 0,
        (true, false) => 1,
        (false, true) => 2,
        (true, true) => 3,
    }
}

fn bounding_rect(points: &[(f64, f64)]) -> Rect {
    let mut rect = Rect {
        min_x: f64::INFINITY,
        min_y: f64::INFINITY,
        max_x: f64::NEG_INFINITY,
        max_y: f64::NEG_INFINITY,
    };
    for &(x, y) in points {
        rect.min_x = rect.min_x.min(x);
        rect.max_x = rect.max_x.max(x);
        rect.min_y = rect.min_y.min(y);
        rect.max_y = rect.max_y.max(y);
    }
    if !rect.min_x.is_finite() {
        rect = Rect { min_x: 0.0, min_y: 0.0, max_x: 0.0, max_y: 0.0 };
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_points() -> Vec<(f64, f64)> {
        let mut points = Vec::new();
        for x in 0..20 {
            for y in 0..20 {
                points.push((x as f64, y as f64));
            }
        }
        points
    }

    #[test]
    fn query_finds_points_in_rect_and_only_those() {
        let points = grid_points();
        let index = SpatialIndex::build(&points, 8, 0);
        let rect = Rect { min_x: 0.0, min_y: 0.0, max_x: 2.0, max_y: 2.0 };
        let intervals = index.query(&rect);

        let mut found: Vec<u32> = intervals
            .iter()
            .flat_map(|i| i.start..i.start + i.len)
            .collect();
        found.sort_unstable();
        found.dedup();

        let expected: Vec<u32> = (0..points.len() as u32)
            .filter(|&i| rect.contains_point(points[i as usize].0, points[i as usize].1))
            .collect();
        assert_eq!(found, expected);
    }

    #[test]
    fn coarsening_reduces_leaf_count_without_losing_points() {
        let points = grid_points();
        let fine = SpatialIndex::build(&points, 4, 0);
        let coarse = SpatialIndex::build(&points, 4, 50);
        assert!(coarse.root.leaf_count() <= fine.root.leaf_count());
        assert_eq!(coarse.root.point_count(), points.len());
    }

    #[test]
    fn round_trips_through_bytes() {
        let points = grid_points();
        let index = SpatialIndex::build(&points, 8, 0);
        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();
        let read_back = SpatialIndex::read_from(buf.as_slice()).unwrap();
        assert_eq!(
            index.query(&Rect { min_x: 0.0, min_y: 0.0, max_x: 19.0, max_y: 19.0 }),
            read_back.query(&Rect { min_x: 0.0, min_y: 0.0, max_x: 19.0, max_y: 19.0 }),
        );
    }
}
