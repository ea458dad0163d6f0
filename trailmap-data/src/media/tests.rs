use super::{
    DEFAULT_EXTENSION, MediaAsset, MediaCache, MediaFetcher, MediaReport, MediaSettings,
    infer_extension, split_links,
};
use crate::test_support::{StubMediaTransport, block_on_for_tests};
use camino::{Utf8Path, Utf8PathBuf};
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;
use trailmap_core::{Feature, Geometry, LayerName, Properties};

const PHOTO: &str = "https://cdn.example/photos/summit.png";
const MISSING: &str = "https://cdn.example/photos/gone.jpg";

#[fixture]
fn layer() -> LayerName {
    LayerName::new("Trails").expect("valid layer name")
}

#[fixture]
fn output_dir() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn utf8(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 temp path")
}

fn feature_with_links(position: usize, links: Option<&str>) -> Feature {
    let mut properties = Properties::from([("name".to_owned(), json!(format!("f{position}")))]);
    if let Some(value) = links {
        properties.insert("media_links".to_owned(), Value::from(value));
    }
    Feature::new(
        position,
        Some(Geometry::Point {
            coordinates: json!([1.0, 2.0]),
        }),
        properties,
    )
}

fn localize(
    transport: &StubMediaTransport,
    settings: &MediaSettings,
    root: &Utf8Path,
    layer: &LayerName,
    features: &mut [Feature],
) -> MediaReport {
    let cache = MediaCache::new();
    let fetcher = MediaFetcher::new(transport, &cache, settings, root);
    block_on_for_tests(fetcher.localize(layer, features))
}

#[rstest]
#[case("https://a.example/x/photo.PNG", ".png")]
#[case("https://a.example/x/photo.jpeg?size=l#top", ".jpeg")]
#[case("https://a.example/x/scan.TIFF", ".tiff")]
#[case("https://a.example/x/doc.pdf", DEFAULT_EXTENSION)]
#[case("https://a.example/x/image", DEFAULT_EXTENSION)]
#[case("https://a.example/dir.png/image", DEFAULT_EXTENSION)]
#[case("not a url.gif", ".gif")]
fn infers_extensions(#[case] url: &str, #[case] expected: &str) {
    assert_eq!(infer_extension(url), expected);
}

#[rstest]
#[case("", &[])]
#[case("https://a/1.jpg", &["https://a/1.jpg"])]
#[case("https://a/1.jpg,https://a/2.jpg", &["https://a/1.jpg", "https://a/2.jpg"])]
#[case(" https://a/1.jpg \n\thttps://a/2.jpg ,", &["https://a/1.jpg", "https://a/2.jpg"])]
fn splits_links(#[case] value: &str, #[case] expected: &[&str]) {
    assert_eq!(split_links(value), expected);
}

#[rstest]
fn asset_names_are_content_addressed(layer: LayerName) {
    let media_dir = Utf8Path::new("media");
    let first = MediaAsset::derive(PHOTO, &layer, 3, media_dir);
    let again = MediaAsset::derive(PHOTO, &layer, 3, media_dir);
    let other = MediaAsset::derive(MISSING, &layer, 3, media_dir);
    assert_eq!(first, again);
    assert_ne!(first.file_name(), other.file_name());

    let name = first.file_name();
    let hash = name
        .strip_prefix("trails_3_")
        .and_then(|rest| rest.strip_suffix(".png"))
        .expect("name follows <layer>_<position>_<hash><ext>");
    assert_eq!(hash.len(), 12);
    assert!(hash.chars().all(|ch| ch.is_ascii_hexdigit()));
    assert_eq!(first.relative_path(), media_dir.join(name));
}

#[rstest]
fn downloads_once_and_rewrites_references(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let transport = StubMediaTransport::new().with_asset(PHOTO, b"png-bytes".to_vec());
    let mut features = vec![
        feature_with_links(0, Some(PHOTO)),
        feature_with_links(1, None),
        feature_with_links(2, Some(PHOTO)),
    ];
    let report = localize(
        &transport,
        &MediaSettings::default(),
        &root,
        &layer,
        &mut features,
    );

    assert_eq!(transport.calls_for(PHOTO), 1);
    assert_eq!(report.referenced, 2);
    assert_eq!(report.unique, 1);
    assert_eq!(report.downloaded, 1);
    assert_eq!(report.reused, 1);

    let first = features[0].string_property("media_links").expect("rewritten");
    let third = features[2].string_property("media_links").expect("rewritten");
    assert_eq!(first, third);
    assert!(first.starts_with("media/trails_0_"), "path uses first position: {first}");
    assert_eq!(fs::read(root.join(first)).expect("stored asset"), b"png-bytes");
    assert_eq!(features[1].string_property("media_links"), None);
}

#[rstest]
fn repeated_link_in_one_property_is_fetched_once(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let transport = StubMediaTransport::new().with_asset(PHOTO, b"png-bytes".to_vec());
    let links = format!("{PHOTO} {PHOTO}");
    let mut features = vec![feature_with_links(0, Some(&links))];
    let report = localize(
        &transport,
        &MediaSettings::default(),
        &root,
        &layer,
        &mut features,
    );

    assert_eq!(transport.calls_for(PHOTO), 1);
    assert_eq!(report.referenced, 2);
    assert_eq!(report.unique, 1);
    assert_eq!(report.reused, 1);
    let rewritten = features[0].string_property("media_links").expect("rewritten");
    let parts: Vec<&str> = rewritten.split(' ').collect();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0], parts[1]);
    assert!(parts[0].starts_with("media/trails_0_"));
}

#[rstest]
#[case("")]
#[case(" , ")]
fn property_without_links_is_not_counted_as_stripped(
    layer: LayerName,
    output_dir: TempDir,
    #[case] links: &str,
) {
    let root = utf8(&output_dir);
    let transport = StubMediaTransport::new();
    let mut features = vec![feature_with_links(0, Some(links))];
    let report = localize(
        &transport,
        &MediaSettings::default(),
        &root,
        &layer,
        &mut features,
    );

    assert!(!features[0].properties().contains_key("media_links"));
    assert_eq!(report.referenced, 0);
    assert_eq!(report.failed, 0);
    assert_eq!(report.stripped_features, 0);
    assert_eq!(transport.total_calls(), 0);
}

#[rstest]
fn failed_links_are_dropped_in_order(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let second = "https://cdn.example/photos/second.webp";
    let transport = StubMediaTransport::new()
        .with_asset(PHOTO, b"one".to_vec())
        .with_asset(second, b"two".to_vec())
        .with_status(MISSING, 404);
    let mut features = vec![feature_with_links(
        0,
        Some(&format!("{PHOTO}, {MISSING} {second}")),
    )];
    let report = localize(
        &transport,
        &MediaSettings::default(),
        &root,
        &layer,
        &mut features,
    );

    let value = features[0].string_property("media_links").expect("kept");
    let paths: Vec<&str> = value.split(' ').collect();
    assert_eq!(paths.len(), 2);
    assert!(paths[0].ends_with(".png"));
    assert!(paths[1].ends_with(".webp"));
    assert_eq!(report.failed, 1);
    assert_eq!(report.downloaded, 2);
    assert_eq!(report.stripped_features, 0);
}

#[rstest]
fn property_is_removed_when_every_link_fails(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let transport = StubMediaTransport::new().with_status(MISSING, 404);
    let mut features = vec![feature_with_links(0, Some(MISSING))];
    let report = localize(
        &transport,
        &MediaSettings::default(),
        &root,
        &layer,
        &mut features,
    );

    assert!(!features[0].properties().contains_key("media_links"));
    assert_eq!(features[0].string_property("name"), Some("f0"));
    assert_eq!(report.failed, 1);
    assert_eq!(report.stripped_features, 1);
    assert!(!root.join("media").exists(), "nothing stored for failures");
}

#[rstest]
fn second_run_adopts_existing_files(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let settings = MediaSettings::default();
    let source = || vec![feature_with_links(0, Some(PHOTO)), feature_with_links(1, Some(PHOTO))];

    let first_transport = StubMediaTransport::new().with_asset(PHOTO, b"png".to_vec());
    let mut first_run = source();
    localize(&first_transport, &settings, &root, &layer, &mut first_run);

    let second_transport = StubMediaTransport::new().with_asset(PHOTO, b"png".to_vec());
    let mut second_run = source();
    let report = localize(&second_transport, &settings, &root, &layer, &mut second_run);

    assert_eq!(second_transport.total_calls(), 0);
    assert_eq!(report.adopted, 1);
    assert_eq!(report.downloaded, 0);
    assert_eq!(first_run, second_run);
}

#[rstest]
#[case(1)]
#[case(4)]
#[case(16)]
fn each_url_is_fetched_once_regardless_of_workers(
    layer: LayerName,
    output_dir: TempDir,
    #[case] workers: usize,
) {
    let root = utf8(&output_dir);
    let urls: Vec<String> = (0..6)
        .map(|index| format!("https://cdn.example/{index}.jpg"))
        .collect();
    let transport = urls.iter().fold(StubMediaTransport::new(), |stub, url| {
        stub.with_asset(url.clone(), url.as_bytes().to_vec())
    });
    let mut features: Vec<Feature> = (0..12)
        .map(|position| {
            let links = format!("{} {}", urls[position % 6], urls[(position + 1) % 6]);
            feature_with_links(position, Some(&links))
        })
        .collect();
    let settings = MediaSettings::default().with_workers(workers);
    let report = localize(&transport, &settings, &root, &layer, &mut features);

    for url in &urls {
        assert_eq!(transport.calls_for(url), 1, "{url} fetched more than once");
    }
    assert_eq!(report.unique, 6);
    assert_eq!(report.downloaded, 6);
    assert_eq!(report.referenced, 24);
    assert_eq!(report.reused, 18);
}

#[rstest]
fn custom_property_and_media_dir(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let transport = StubMediaTransport::new().with_asset(PHOTO, b"png".to_vec());
    let mut feature = feature_with_links(0, None);
    feature.set_property("gx_media_links", Value::from(PHOTO));
    let mut features = vec![feature];
    let settings = MediaSettings::default()
        .with_property("gx_media_links")
        .with_media_dir("assets/img");
    localize(&transport, &settings, &root, &layer, &mut features);

    let value = features[0]
        .string_property("gx_media_links")
        .expect("rewritten");
    assert!(value.starts_with("assets/img/trails_0_"));
    assert!(root.join(value).is_file());
}

#[rstest]
fn non_string_property_is_left_alone(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let transport = StubMediaTransport::new();
    let mut feature = feature_with_links(0, None);
    feature.set_property("media_links", json!(42));
    let mut features = vec![feature.clone()];
    let report = localize(
        &transport,
        &MediaSettings::default(),
        &root,
        &layer,
        &mut features,
    );
    assert_eq!(features, vec![feature]);
    assert_eq!(report, MediaReport::default());
}

#[rstest]
fn cache_exposes_resolved_paths(layer: LayerName, output_dir: TempDir) {
    let root = utf8(&output_dir);
    let transport = StubMediaTransport::new()
        .with_asset(PHOTO, b"png".to_vec())
        .with_status(MISSING, 500);
    let cache = MediaCache::new();
    let settings = MediaSettings::default();
    let fetcher = MediaFetcher::new(&transport, &cache, &settings, &root);
    let mut features = vec![feature_with_links(0, Some(&format!("{PHOTO} {MISSING}")))];
    block_on_for_tests(fetcher.localize(&layer, &mut features));

    assert_eq!(cache.len(), 2);
    let stored = cache.local_path(PHOTO).expect("downloaded asset has a path");
    assert_eq!(
        Some(stored.as_path()),
        cache.asset(PHOTO).as_ref().map(MediaAsset::relative_path)
    );
    assert_eq!(cache.local_path(MISSING), None);
    assert!(cache.asset(MISSING).is_some());
}
