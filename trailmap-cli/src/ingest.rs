//! Ingest command implementation for the Trailmap CLI.

use camino::Utf8PathBuf;
use clap::Parser;
use log::info;
use ortho_config::{OrthoConfig, SubcmdConfigMerge};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tokio::runtime::Builder;
use trailmap_data::convert::{CommandConverter, Converter, DEFAULT_CONVERTER_PROGRAM};
use trailmap_data::media::{HttpMediaTransport, MediaSettings, MediaTransport};
use trailmap_data::pipeline::{LayerJob, Pipeline, PipelineSettings, RunLog, RunReport};
use trailmap_data::source::{DatasetSource, HttpDatasetSource, HttpSourceConfig};

use crate::CliError;

pub(crate) const ARG_LAYER: &str = "layer";
pub(crate) const ARG_OUTPUT_DIR: &str = "output-dir";
pub(crate) const ARG_SCRATCH_DIR: &str = "scratch-dir";
pub(crate) const ARG_MEDIA_DIR: &str = "media-dir";
pub(crate) const ARG_MEDIA_PROPERTY: &str = "media-property";
pub(crate) const ARG_MEDIA_WORKERS: &str = "media-workers";
pub(crate) const ARG_CONVERTER: &str = "converter";
pub(crate) const ARG_ENDPOINT: &str = "endpoint";
pub(crate) const ARG_RUN_LOG: &str = "run-log";
pub(crate) const ARG_MANIFEST: &str = "manifest";
pub(crate) const ENV_LAYERS: &str = "TRAILMAP_CMDS_INGEST_LAYERS";

/// Output directory used when none is configured.
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "dist";

/// CLI arguments for the `ingest` subcommand.
#[derive(Debug, Clone, Parser, Deserialize, Serialize, OrthoConfig, Default)]
#[command(
    name = "ingest",
    long_about = "Download each published dataset as KML, convert it to \
                 GeoJSON with an external converter, drop invalid \
                 geometries, localise referenced media and write one \
                 deterministic file per layer. Options can come from CLI \
                 flags, configuration files, or environment variables.",
    about = "Ingest published datasets into layer files"
)]
#[ortho_config(prefix = "TRAILMAP")]
pub(crate) struct IngestArgs {
    /// Layer to ingest as `<Name>=<datasetId>`; repeat for several layers.
    #[arg(long = ARG_LAYER, value_name = "name=id")]
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub(crate) layers: Vec<String>,
    /// Directory receiving layer files and media (default `dist`).
    #[arg(long = ARG_OUTPUT_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) output_dir: Option<Utf8PathBuf>,
    /// Directory receiving raw downloads (default `<output-dir>/.scratch`).
    #[arg(long = ARG_SCRATCH_DIR, value_name = "dir")]
    #[serde(default)]
    pub(crate) scratch_dir: Option<Utf8PathBuf>,
    /// Media directory relative to the output directory (default `media`).
    #[arg(long = ARG_MEDIA_DIR, value_name = "name")]
    #[serde(default)]
    pub(crate) media_dir: Option<Utf8PathBuf>,
    /// Feature property holding media links (default `media_links`).
    #[arg(long = ARG_MEDIA_PROPERTY, value_name = "name")]
    #[serde(default)]
    pub(crate) media_property: Option<String>,
    /// Maximum concurrent media downloads (default 4).
    #[arg(long = ARG_MEDIA_WORKERS, value_name = "n")]
    #[serde(default)]
    pub(crate) media_workers: Option<usize>,
    /// Converter program invoked as `<program> -f GeoJSON /vsistdout/ <input>`.
    #[arg(long = ARG_CONVERTER, value_name = "program")]
    #[serde(default)]
    pub(crate) converter: Option<String>,
    /// Export endpoint queried with `mid=<datasetId>&forcekml=1`.
    #[arg(long = ARG_ENDPOINT, value_name = "url")]
    #[serde(default)]
    pub(crate) endpoint: Option<String>,
    /// SQLite file recording each completed layer.
    #[arg(long = ARG_RUN_LOG, value_name = "path")]
    #[serde(default)]
    pub(crate) run_log: Option<Utf8PathBuf>,
    /// JSON file listing layer names and paths for the tiling step.
    #[arg(long = ARG_MANIFEST, value_name = "path")]
    #[serde(default)]
    pub(crate) manifest: Option<Utf8PathBuf>,
}

impl IngestArgs {
    pub(crate) fn into_config(self) -> Result<IngestConfig, CliError> {
        let merged = self.load_and_merge().map_err(CliError::Configuration)?;
        IngestConfig::try_from(merged)
    }
}

/// Resolved `ingest` command configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct IngestConfig {
    /// Layers in the order they run.
    pub(crate) jobs: Vec<LayerJob>,
    /// Output, scratch and media locations.
    pub(crate) settings: PipelineSettings,
    /// Converter program.
    pub(crate) converter: String,
    /// Export endpoint override.
    pub(crate) endpoint: Option<String>,
    /// Optional run log location.
    pub(crate) run_log: Option<Utf8PathBuf>,
    /// Optional tiling manifest location.
    pub(crate) manifest: Option<Utf8PathBuf>,
}

impl IngestConfig {
    pub(crate) fn validate_output_dir(&self) -> Result<(), CliError> {
        let path = &self.settings.output_dir;
        match trailmap_fs::path_is_file(path) {
            Ok(false) => Ok(()),
            Ok(true) => Err(CliError::OutputDirectoryNotDirectory {
                path: path.clone(),
            }),
            Err(source) => Err(CliError::InspectOutputDirectory {
                path: path.clone(),
                source,
            }),
        }
    }
}

impl TryFrom<IngestArgs> for IngestConfig {
    type Error = CliError;

    fn try_from(args: IngestArgs) -> Result<Self, Self::Error> {
        if args.layers.is_empty() {
            return Err(CliError::MissingArgument {
                field: ARG_LAYER,
                env: ENV_LAYERS,
            });
        }
        let jobs = args
            .layers
            .iter()
            .map(|value| {
                value
                    .parse::<LayerJob>()
                    .map_err(|source| CliError::InvalidLayer {
                        value: value.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut media = MediaSettings::default();
        if let Some(property) = args.media_property {
            media = media.with_property(property);
        }
        if let Some(media_dir) = args.media_dir {
            media = media.with_media_dir(media_dir);
        }
        match args.media_workers {
            Some(0) => return Err(CliError::ZeroMediaWorkers),
            Some(workers) => media = media.with_workers(workers),
            None => {}
        }

        let output_dir = args
            .output_dir
            .unwrap_or_else(|| Utf8PathBuf::from(DEFAULT_OUTPUT_DIR));
        let mut settings = PipelineSettings::new(output_dir).with_media(media);
        if let Some(scratch_dir) = args.scratch_dir {
            settings = settings.with_scratch_dir(scratch_dir);
        }

        Ok(Self {
            jobs,
            settings,
            converter: args
                .converter
                .unwrap_or_else(|| DEFAULT_CONVERTER_PROGRAM.to_owned()),
            endpoint: args.endpoint,
            run_log: args.run_log,
            manifest: args.manifest,
        })
    }
}

/// Network and subprocess collaborators for one run.
pub(crate) struct Collaborators {
    pub(crate) source: Box<dyn DatasetSource>,
    pub(crate) converter: Box<dyn Converter>,
    pub(crate) media: Box<dyn MediaTransport>,
}

/// Builds the collaborators for a resolved configuration.
pub(crate) trait CollaboratorBuilder {
    fn build(&self, config: &IngestConfig) -> Result<Collaborators, CliError>;
}

/// Builds HTTP transports and the external converter.
struct DefaultCollaboratorBuilder;

impl CollaboratorBuilder for DefaultCollaboratorBuilder {
    fn build(&self, config: &IngestConfig) -> Result<Collaborators, CliError> {
        let source_config = config
            .endpoint
            .as_ref()
            .map_or_else(HttpSourceConfig::default, HttpSourceConfig::new);
        Ok(Collaborators {
            source: Box::new(HttpDatasetSource::with_config(source_config)?),
            converter: Box::new(CommandConverter::new(config.converter.as_str())),
            media: Box::new(HttpMediaTransport::new()?),
        })
    }
}

pub(crate) fn run_ingest(args: IngestArgs) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    run_ingest_with(args, &DefaultCollaboratorBuilder, &mut stdout)
}

pub(crate) fn run_ingest_with(
    args: IngestArgs,
    builder: &dyn CollaboratorBuilder,
    writer: &mut dyn Write,
) -> Result<(), CliError> {
    let config = args.into_config()?;
    let report = execute_ingest(&config, builder)?;
    write_summary(writer, &report)?;
    if let Some(manifest) = &config.manifest {
        report.write_manifest(manifest)?;
        info!("wrote tiling manifest to {manifest}");
    }
    Ok(())
}

pub(crate) fn execute_ingest(
    config: &IngestConfig,
    builder: &dyn CollaboratorBuilder,
) -> Result<RunReport, CliError> {
    config.validate_output_dir()?;
    let collaborators = builder.build(config)?;
    let run_log = config
        .run_log
        .as_deref()
        .map(RunLog::initialise)
        .transpose()?;

    let mut pipeline = Pipeline::new(
        collaborators.source.as_ref(),
        collaborators.converter.as_ref(),
        collaborators.media.as_ref(),
        config.settings.clone(),
    );
    if let Some(log) = &run_log {
        pipeline = pipeline.with_run_log(log);
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let report = runtime.block_on(pipeline.run_layers(&config.jobs))?;
    Ok(report)
}

fn write_summary(writer: &mut dyn Write, report: &RunReport) -> Result<(), CliError> {
    for layer in &report.layers {
        writeln!(writer, "{layer}").map_err(CliError::WriteSummary)?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) fn config_from_layers_for_test(
    layers: Vec<ortho_config::MergeLayer<'static>>,
) -> Result<IngestConfig, CliError> {
    let merged = IngestArgs::merge_from_layers(layers).map_err(CliError::from)?;
    IngestConfig::try_from(merged)
}
