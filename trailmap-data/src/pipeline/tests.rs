use super::{
    LayerJob, LayerJobError, Pipeline, PipelineError, PipelineSettings, RunLog, RunLogError,
};
use crate::convert::ConversionError;
use crate::source::SourceError;
use crate::test_support::{
    StubConverter, StubDatasetSource, StubMediaTransport, block_on_for_tests, feature_collection,
    point_feature, sample_kml,
};
use crate::transport::TransportError;
use camino::Utf8PathBuf;
use rstest::{fixture, rstest};
use serde_json::{Value, json};
use std::fs;
use tempfile::TempDir;
use trailmap_core::LayerNameError;

const PHOTO: &str = "https://cdn.example/a.png";

#[fixture]
fn workspace() -> TempDir {
    TempDir::new().expect("create temp dir")
}

fn root(dir: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(dir.path().join("dist")).expect("utf-8 temp path")
}

fn job(text: &str) -> LayerJob {
    text.parse().expect("valid layer job")
}

fn converter_output() -> Vec<u8> {
    feature_collection(&[
        point_feature(-9.142, 38.736, &json!({"name": "kept", "media_links": PHOTO})),
        json!({
            "type": "Feature",
            "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1]]]},
            "properties": {"name": "open ring"}
        }),
        point_feature(2.0, 3.0, &json!({"name": "also kept"})),
    ])
}

fn read_json(path: &camino::Utf8Path) -> Value {
    let text = fs::read_to_string(path).expect("layer file");
    serde_json::from_str(&text).expect("valid json")
}

#[rstest]
#[case("Trails=abc", "Trails", "abc")]
#[case("  Camp Sites = x_Y-1 ", "Camp Sites", "x_Y-1")]
fn parses_layer_jobs(#[case] text: &str, #[case] layer: &str, #[case] dataset: &str) {
    let parsed = job(text);
    assert_eq!(parsed.layer.as_str(), layer);
    assert_eq!(parsed.dataset.as_str(), dataset);
}

#[rstest]
fn rejects_malformed_layer_jobs() {
    assert_eq!(
        "Trails".parse::<LayerJob>(),
        Err(LayerJobError::MissingSeparator("Trails".to_owned()))
    );
    assert_eq!(
        "=abc".parse::<LayerJob>(),
        Err(LayerJobError::Name(LayerNameError::Empty))
    );
    assert!(matches!(
        "Trails=a/b".parse::<LayerJob>(),
        Err(LayerJobError::Dataset(_))
    ));
}

#[rstest]
fn scratch_defaults_beneath_output_dir() {
    let settings = PipelineSettings::new("dist");
    assert_eq!(settings.scratch_dir, Utf8PathBuf::from("dist/.scratch"));
    assert_eq!(
        settings.scratch_path(&job("Hiking Trails=abc")),
        Utf8PathBuf::from("dist/.scratch/hiking_trails_abc.kml")
    );
}

#[rstest]
fn ingests_a_layer_end_to_end(workspace: TempDir) {
    let root = root(&workspace);
    let source = StubDatasetSource::with_payload(sample_kml());
    let converter = StubConverter::with_output(converter_output());
    let media = StubMediaTransport::new().with_asset(PHOTO, b"png".to_vec());
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root));

    let report =
        block_on_for_tests(pipeline.run_layer(&job("Trails=abc"))).expect("layer should run");

    assert_eq!(report.total_features, 3);
    assert_eq!(report.valid_features, 2);
    assert_eq!(report.rejected_features(), 1);
    assert_eq!(report.media.downloaded, 1);
    assert_eq!(report.output_path, root.join("trails.geojson"));
    assert_eq!(report.raw_path, root.join(".scratch/trails_abc.kml"));
    assert_eq!(fs::read(&report.raw_path).expect("raw payload"), sample_kml());

    let written = read_json(&report.output_path);
    assert_eq!(written["name"], "Trails Layer (abc)");
    let names: Vec<&str> = written["features"]
        .as_array()
        .expect("features array")
        .iter()
        .filter_map(|feature| feature["properties"]["name"].as_str())
        .collect();
    assert_eq!(names, ["kept", "also kept"]);
    let local = written["features"][0]["properties"]["media_links"]
        .as_str()
        .expect("rewritten link");
    assert!(root.join(local).is_file());
}

#[rstest]
fn download_failure_stops_before_conversion(workspace: TempDir) {
    let root = root(&workspace);
    let source = StubDatasetSource::with_error(TransportError::Http {
        url: "https://maps.example/kml?mid=abc".into(),
        status: 404,
        message: "not found".into(),
    });
    let converter = StubConverter::with_output(converter_output());
    let media = StubMediaTransport::new();
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root));

    let err = block_on_for_tests(pipeline.run_layer(&job("Trails=abc")))
        .expect_err("download failure is fatal");

    assert!(matches!(
        err,
        PipelineError::Download {
            source: SourceError::Transport { .. },
            ..
        }
    ));
    assert_eq!(converter.calls(), 0);
    assert!(!root.join("trails.geojson").exists());
}

#[rstest]
fn html_payload_is_a_download_error(workspace: TempDir) {
    let root = root(&workspace);
    let source = StubDatasetSource::with_payload(b"<html>Sign in</html>".to_vec());
    let converter = StubConverter::with_output(converter_output());
    let media = StubMediaTransport::new();
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root));

    let err = block_on_for_tests(pipeline.run_layer(&job("Trails=abc"))).expect_err("not kml");
    assert!(matches!(
        err,
        PipelineError::Download {
            source: SourceError::NotKml { .. },
            ..
        }
    ));
    assert_eq!(converter.calls(), 0);
    assert!(root.join(".scratch/trails_abc.kml").is_file());
}

#[rstest]
fn conversion_failure_is_fatal(workspace: TempDir) {
    let root = root(&workspace);
    let source = StubDatasetSource::with_payload(sample_kml());
    let converter = StubConverter::failing("exit status: 1", "ERROR 4: unable to open");
    let media = StubMediaTransport::new();
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root));

    let err = block_on_for_tests(pipeline.run_layer(&job("Trails=abc"))).expect_err("fatal");
    assert!(matches!(
        err,
        PipelineError::Conversion {
            source: ConversionError::Failed { .. },
            ..
        }
    ));
    assert!(err.to_string().contains("Trails"));
    assert!(!root.join("trails.geojson").exists());
    assert_eq!(
        fs::read(root.join(".scratch/trails_abc.kml")).expect("raw payload kept"),
        sample_kml()
    );
}

#[rstest]
fn duplicate_file_stems_are_rejected_up_front(workspace: TempDir) {
    let root = root(&workspace);
    let source = StubDatasetSource::with_payload(sample_kml());
    let converter = StubConverter::with_output(converter_output());
    let media = StubMediaTransport::new();
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root));

    let jobs = [job("Camp Sites=abc"), job("camp sites=def")];
    let err = block_on_for_tests(pipeline.run_layers(&jobs)).expect_err("stems collide");
    match err {
        PipelineError::DuplicateLayer { stem, .. } => assert_eq!(stem, "camp_sites"),
        other => panic!("expected DuplicateLayer, got {other:?}"),
    }
    assert_eq!(source.calls(), 0);
}

#[rstest]
fn multi_layer_run_yields_tiling_inputs(workspace: TempDir) {
    let root = root(&workspace);
    let source = StubDatasetSource::with_payload(sample_kml());
    let converter = StubConverter::with_output(converter_output());
    let media = StubMediaTransport::new().with_asset(PHOTO, b"png".to_vec());
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root));

    let jobs = [job("Trails=abc"), job("Camp Sites=def")];
    let report = block_on_for_tests(pipeline.run_layers(&jobs)).expect("run succeeds");

    let inputs = report.tiling_inputs();
    assert_eq!(inputs.len(), 2);
    assert_eq!(inputs[0].0.as_str(), "Trails");
    assert_eq!(inputs[0].1, root.join("trails.geojson"));
    assert_eq!(inputs[1].1, root.join("camp_sites.geojson"));

    let manifest_path = root.join("layers.json");
    report
        .write_manifest(&manifest_path)
        .expect("manifest written");
    let manifest = read_json(&manifest_path);
    assert_eq!(manifest["layers"][0]["name"], "trails");
    assert_eq!(manifest["layers"][1]["name"], "camp_sites");
    assert_eq!(
        manifest["layers"][1]["path"],
        root.join("camp_sites.geojson").as_str()
    );
}

#[rstest]
fn run_log_records_each_layer(workspace: TempDir) {
    let root = root(&workspace);
    let log_path = Utf8PathBuf::from_path_buf(workspace.path().join("runs.sqlite"))
        .expect("utf-8 temp path");
    let run_log = RunLog::initialise(&log_path).expect("run log opens");
    let source = StubDatasetSource::with_payload(sample_kml());
    let converter = StubConverter::with_output(converter_output());
    let media = StubMediaTransport::new().with_asset(PHOTO, b"png".to_vec());
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root))
        .with_run_log(&run_log);

    block_on_for_tests(pipeline.run_layers(&[job("Trails=abc"), job("Parks=def")]))
        .expect("run succeeds");

    let rows: Vec<(String, i64, i64)> = run_log
        .connection()
        .prepare("SELECT layer, valid_features, media_downloaded FROM layer_runs ORDER BY id")
        .expect("prepare query")
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))
        .expect("query rows")
        .collect::<Result<_, _>>()
        .expect("decode rows");
    assert_eq!(
        rows,
        vec![("Trails".to_owned(), 2, 1), ("Parks".to_owned(), 2, 1)]
    );
    assert_eq!(run_log.path(), log_path);
}

#[rstest]
fn run_log_failure_is_reported_after_the_layer_is_written(workspace: TempDir) {
    let root = root(&workspace);
    let log_path = Utf8PathBuf::from_path_buf(workspace.path().join("runs.sqlite"))
        .expect("utf-8 temp path");
    let run_log = RunLog::initialise(&log_path).expect("run log opens");
    run_log
        .connection()
        .execute("DROP TABLE layer_runs", [])
        .expect("drop table");
    let source = StubDatasetSource::with_payload(sample_kml());
    let converter = StubConverter::with_output(converter_output());
    let media = StubMediaTransport::new().with_asset(PHOTO, b"png".to_vec());
    let pipeline = Pipeline::new(&source, &converter, &media, PipelineSettings::new(&root))
        .with_run_log(&run_log);

    let err = block_on_for_tests(pipeline.run_layer(&job("Trails=abc")))
        .expect_err("insert into a missing table fails");

    assert!(matches!(
        err,
        PipelineError::RunLog(RunLogError::RecordSql { .. })
    ));
    assert!(root.join("trails.geojson").is_file());
    let written = read_json(&root.join("trails.geojson"));
    assert_eq!(written["features"].as_array().map(Vec::len), Some(2));
}
