use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;

const WATER: [u8; 3] = [20, 40, 200];
const LAND: [u8; 3] = [90, 80, 70];

/// Write a 48x16 color raster plus its world-file sidecar: quarter-degree
/// pixels anchored at (-100 E, 60 N). `land_cols` paints a full-height wall.
fn write_fixture(dir: &Path, land_cols: std::ops::Range<u32>) -> std::path::PathBuf {
    let raster_path = dir.join("ice.png");
    let img = image::RgbImage::from_fn(48, 16, |x, _y| {
        if land_cols.contains(&x) {
            image::Rgb(LAND)
        } else {
            image::Rgb(WATER)
        }
    });
    img.save(&raster_path).expect("fixture raster writes");

    fs::write(
        dir.join("ice.wld"),
        "0.25\n0.0\n0.0\n-0.25\n-99.875\n59.875\n",
    )
    .expect("fixture world file writes");

    raster_path
}

fn route_cmd(raster: &Path, output: &Path) -> Command {
    let mut cmd = Command::cargo_bin("icelane-cli").expect("binary builds");
    cmd.args(["route", "--raster"])
        .arg(raster)
        .args(["--from-lon=-99.0", "--from-lat=59.0"])
        .args(["--to-lon=-89.0", "--to-lat=58.0"])
        .arg("--output")
        .arg(output);
    cmd
}

#[test]
fn route_succeeds_on_open_water() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raster = write_fixture(dir.path(), 0..0);
    let output = dir.path().join("route.geojson");

    route_cmd(&raster, &output)
        .assert()
        .success()
        .stdout(predicate::str::contains("Route:"))
        .stdout(predicate::str::contains("Route GeoJSON written"));

    let raw = fs::read_to_string(&output).expect("route file exists");
    let geojson: geojson::GeoJson = raw.parse().expect("valid GeoJSON");
    let geojson::GeoJson::FeatureCollection(collection) = geojson else {
        panic!("expected a feature collection");
    };
    assert_eq!(collection.features.len(), 1);

    let properties = collection.features[0]
        .properties
        .as_ref()
        .expect("feature properties");
    assert!(properties.get("cell_count").and_then(|v| v.as_u64()).unwrap() > 0);
    assert!(properties.get("total_cost").and_then(|v| v.as_f64()).unwrap() > 0.0);
}

#[test]
fn route_fails_when_basins_are_disconnected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raster = write_fixture(dir.path(), 20..28);
    let output = dir.path().join("route.geojson");

    route_cmd(&raster, &output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no open-water route"));
    assert!(!output.exists());
}

#[test]
fn route_honors_the_expansion_budget() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raster = write_fixture(dir.path(), 0..0);
    let output = dir.path().join("route.geojson");

    route_cmd(&raster, &output)
        .args(["--max-expansions", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expansion budget"));
}

#[test]
fn route_requires_a_world_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raster = write_fixture(dir.path(), 0..0);
    fs::remove_file(dir.path().join("ice.wld")).expect("remove sidecar");
    let output = dir.path().join("route.geojson");

    route_cmd(&raster, &output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no world file"));
}

#[test]
fn corridor_lanes_lower_the_reported_cost() {
    let dir = tempfile::tempdir().expect("tempdir");
    let raster = write_fixture(dir.path(), 0..0);

    // A lane tracing the requested route keeps the whole path discounted.
    let corridor_path = dir.path().join("lanes.geojson");
    fs::write(
        &corridor_path,
        r#"{"type":"FeatureCollection","features":[{"type":"Feature","properties":{},
            "geometry":{"type":"LineString","coordinates":[[-99.0,59.0],[-89.0,58.0]]}}]}"#,
    )
    .expect("corridor file writes");

    let plain_out = dir.path().join("plain.geojson");
    route_cmd(&raster, &plain_out).assert().success();
    let discounted_out = dir.path().join("discounted.geojson");
    route_cmd(&raster, &discounted_out)
        .arg("--corridors")
        .arg(&corridor_path)
        .args(["--corridor-buffer", "50000"])
        .assert()
        .success();

    let cost = |path: &Path| -> f64 {
        let raw = fs::read_to_string(path).expect("route file exists");
        let geojson::GeoJson::FeatureCollection(collection) =
            raw.parse().expect("valid GeoJSON")
        else {
            panic!("expected a feature collection");
        };
        collection.features[0]
            .properties
            .as_ref()
            .unwrap()
            .get("total_cost")
            .and_then(|v| v.as_f64())
            .unwrap()
    };

    assert!(cost(&discounted_out) < cost(&plain_out));
}
