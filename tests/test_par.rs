use std::fs::File;
use std::io::{Seek, SeekFrom};

use lazpoint::container::header::Header;
use lazpoint::container::vlr::Vlr;
use lazpoint::{LazVlr, Reader};

/// Reads just enough of a LAZ file to hand back its point size, point count,
/// and a parallel decompressor positioned at the start of point data.
#[cfg(feature = "parallel")]
fn open_for_parallel_decompression(
    mut laz_file: File,
) -> (usize, u64, lazpoint::parallel::ParLasZipDecompressor<File>) {
    let header = Header::read_from(&mut laz_file).unwrap();
    let mut laszip_vlr = None;
    for _ in 0..header.number_of_variable_length_records {
        let vlr = Vlr::read_from(&mut laz_file).unwrap();
        if vlr.matches(LazVlr::USER_ID, LazVlr::RECORD_ID) {
            laszip_vlr = Some(LazVlr::read_from(&mut vlr.data.as_slice()).unwrap());
        }
    }
    let laz_vlr = laszip_vlr.expect("no laszip VLR in file");
    laz_file
        .seek(SeekFrom::Start(u64::from(header.offset_to_point_data)))
        .unwrap();
    let point_size = laz_vlr.items_size() as usize;
    let decompressor =
        lazpoint::parallel::ParLasZipDecompressor::new(laz_file, laz_vlr).unwrap();
    (point_size, header.effective_point_count(), decompressor)
}

/// Test that on a file with only one chunk,
/// if we use parallel decompressor with a small number of points
/// everything works.
#[cfg(feature = "parallel")]
#[test]
fn test_par_decompress_less_than_chunk_size() {
    let laz_path = "tests/data/extra-bytes.laz";
    let las_path = "tests/data/extra-bytes.las";

    let laz_file = File::open(laz_path).unwrap();
    let (point_size, num_points, mut decompressor) = open_for_parallel_decompression(laz_file);

    // The LAS file is our ground truth, read through the plain raw-record path.
    let mut las_reader = Reader::new(File::open(las_path).unwrap()).unwrap();
    assert_eq!(las_reader.point_len(), point_size);
    assert_eq!(las_reader.num_points(), num_points);

    let num_points_per_iter = 50;
    let mut num_point_left = num_points;
    let mut points = vec![0u8; point_size * num_points_per_iter];
    let mut expected_points = vec![0u8; point_size * num_points_per_iter];

    while num_point_left > 0 {
        let points_to_read = (num_points_per_iter as u64).min(num_point_left) as usize;
        let end = points_to_read * point_size;
        decompressor.decompress_many(&mut points[..end]).unwrap();

        for point in expected_points[..end].chunks_mut(point_size) {
            las_reader.read_point(point).unwrap();
        }

        assert_eq!(&expected_points[..end], &points[..end]);
        num_point_left -= points_to_read as u64;
    }
}
