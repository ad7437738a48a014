#[macro_use]
extern crate criterion;
extern crate lazpoint;

use criterion::Criterion;

use lazpoint::las::v2;
use lazpoint::record::{RecordCompressor, SequentialPointRecordCompressor};
use lazpoint::Reader;
use std::fs::File;
use std::io::{BufReader, Cursor};

struct RawPointsData {
    point_size: usize,
    points_data: Vec<u8>,
}

impl RawPointsData {
    fn cycling_iterator(&self) -> std::iter::Cycle<std::slice::ChunksExact<u8>> {
        self.points_data.chunks_exact(self.point_size).cycle()
    }
}

fn get_raw_points_data(path: &str) -> RawPointsData {
    let mut reader = Reader::new(BufReader::new(File::open(path).unwrap())).unwrap();
    let point_size = reader.point_len();
    let mut points_data = vec![0u8; point_size * reader.num_points() as usize];
    for point in points_data.chunks_mut(point_size) {
        reader.read_point(point).unwrap();
    }
    RawPointsData {
        point_size,
        points_data,
    }
}

fn point_0_v2_record_compression_benchmark(c: &mut Criterion) {
    let raw_points_data = get_raw_points_data("tests/data/point10.las");

    let mut record_compressor = SequentialPointRecordCompressor::new(Cursor::new(Vec::<u8>::new()));
    record_compressor.add_field_compressor(v2::LasPoint0Compressor::default());

    c.bench_function("point_0_v2_compression", move |b| {
        let mut raw_pts_iter = raw_points_data.cycling_iterator();
        b.iter(|| record_compressor.compress_next(raw_pts_iter.next().unwrap()));
    });
}

fn point_1_v2_record_compression_benchmark(c: &mut Criterion) {
    let raw_points_data = get_raw_points_data("tests/data/point-time.las");

    let mut record_compressor = SequentialPointRecordCompressor::new(Cursor::new(Vec::<u8>::new()));
    record_compressor.add_field_compressor(v2::LasPoint0Compressor::default());
    record_compressor.add_field_compressor(v2::GpsTimeCompressor::default());

    c.bench_function("point_1_v2_compression", move |b| {
        let mut raw_pts_iter = raw_points_data.cycling_iterator();
        b.iter(|| record_compressor.compress_next(raw_pts_iter.next().unwrap()));
    });
}

fn point_2_v2_record_compression_benchmark(c: &mut Criterion) {
    let raw_points_data = get_raw_points_data("tests/data/point-color.las");

    let mut record_compressor = SequentialPointRecordCompressor::new(Cursor::new(Vec::<u8>::new()));
    record_compressor.add_field_compressor(v2::LasPoint0Compressor::default());
    record_compressor.add_field_compressor(v2::LasRGBCompressor::default());

    c.bench_function("point_2_v2_compression", move |b| {
        let mut raw_pts_iter = raw_points_data.cycling_iterator();
        b.iter(|| record_compressor.compress_next(raw_pts_iter.next().unwrap()));
    });
}

fn point_3_v2_record_compression_benchmark(c: &mut Criterion) {
    let raw_points_data = get_raw_points_data("tests/data/point-time-color.las");

    let mut record_compressor = SequentialPointRecordCompressor::new(Cursor::new(Vec::<u8>::new()));
    record_compressor.add_field_compressor(v2::LasPoint0Compressor::default());
    record_compressor.add_field_compressor(v2::GpsTimeCompressor::default());
    record_compressor.add_field_compressor(v2::LasRGBCompressor::default());

    c.bench_function("point_3_v2_compression", move |b| {
        let mut raw_pts_iter = raw_points_data.cycling_iterator();
        b.iter(|| record_compressor.compress_next(raw_pts_iter.next().unwrap()));
    });
}

criterion_group!(
    version_2_point_formats,
    point_0_v2_record_compression_benchmark,
    point_1_v2_record_compression_benchmark,
    point_2_v2_record_compression_benchmark,
    point_3_v2_record_compression_benchmark
);
criterion_main!(version_2_point_formats);
