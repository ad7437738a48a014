use std::fs::File;
use std::io::BufReader;

use lazpoint::Reader;

fn read_all_points(path: &str) -> (usize, Vec<u8>) {
    let mut reader = Reader::new(BufReader::new(File::open(path).unwrap())).unwrap();
    let point_len = reader.point_len();
    let mut buf = vec![0u8; point_len];
    let mut points = Vec::new();
    for _ in 0..reader.num_points() {
        reader.read_point(&mut buf).unwrap();
        points.extend_from_slice(&buf);
    }
    (point_len, points)
}

#[test]
fn test_version_1_point_wise() {
    let (las_point_len, las_points) = read_all_points("./tests/data/point-version-1-point-wise.las");
    let (laz_point_len, laz_points) = read_all_points("./tests/data/point-version-1-point-wise.laz");

    assert_eq!(las_point_len, laz_point_len);
    assert_eq!(las_points.len(), laz_points.len());

    for (i, (las_point, laz_point)) in las_points
        .chunks(las_point_len)
        .zip(laz_points.chunks(laz_point_len))
        .enumerate()
    {
        assert_eq!(las_point, laz_point, "Point {} are not equal", i);
    }
}
