use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ardpro::api::{process_directory_with, process_scene_with};
use ardpro::core::dataset::Collaborators;
use ardpro::io::{BoundingBox, OtbCliEngine};
use ardpro::{ArdProduct, RunConfig};

use super::args::CliArgs;
use super::errors::AppError;

/// Layer command-line overrides on top of the config file (or defaults).
fn resolve_config(args: &CliArgs) -> Result<RunConfig, AppError> {
    let mut config = match &args.config {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(dem) = &args.dem {
        config.dem_path = Some(dem.clone());
    }
    if let Some(geoid) = &args.geoid {
        config.geoid_path = Some(geoid.clone());
    }
    if let Some(method) = args.pan_method {
        config.pan_method = Some(method);
    }
    if let Some(roi) = &args.roi {
        let mut bbox =
            BoundingBox::parse(roi).ok_or_else(|| AppError::InvalidRoi { roi: roi.clone() })?;
        bbox.crs = args.roi_crs.clone();
        config.roi = Some(bbox);
    } else if let (Some(crs), Some(bbox)) = (&args.roi_crs, config.roi.as_mut()) {
        bbox.crs = Some(crs.clone());
    }
    if let Some(policy) = args.roi_miss {
        config.roi_miss = policy;
    }
    if let Some(ram) = args.ram {
        config.ram_mb = ram;
    }
    if config.ram_mb == 0 {
        return Err(AppError::ZeroRam);
    }
    if let Some(log_dir) = &args.log_dir {
        config.log_dir = log_dir.clone();
    }
    if let Some(ard_dir) = &args.ard_dir {
        config.ard_dir = Some(ard_dir.clone());
    }
    if let Some(level) = args.level {
        config.calibration_level = level;
    }
    if let Some(encoding) = args.encoding {
        config.encoding = encoding;
    }
    if let Some(fusion) = args.fusion {
        config.pleiades_fusion = fusion;
    }

    if config.dem_path.is_some() != config.geoid_path.is_some() {
        warn!("Elevation needs both a DEM directory and a geoid; resampling without elevation");
    }
    Ok(config)
}

fn collaborators(args: &CliArgs) -> Collaborators {
    let engine = match &args.otb_bin_dir {
        Some(dir) => OtbCliEngine::with_bin_dir(dir),
        None => OtbCliEngine::new(),
    };
    Collaborators {
        engine: Box::new(engine),
        ..Collaborators::default()
    }
}

fn report_product(product: &ArdProduct) {
    info!("Pansharpened: {:?}", product.pansharpened);
    info!("MS mosaic: {:?}", product.ms_mosaic);
    if let Some(published) = &product.published {
        info!("Published: {:?}", published);
    }
    let cached = product.lineage.iter().filter(|r| r.cached).count();
    info!("Stages: {} run, {} reused", product.lineage.len() - cached, cached);
}

pub fn run(args: CliArgs) -> Result<(), Box<dyn std::error::Error>> {
    let default_level = if args.log { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = resolve_config(&args)?;
    let batch_mode = args.batch || args.input_dir.is_some();

    if batch_mode {
        let input_dir = args.input_dir.clone().ok_or(AppError::MissingArgument {
            arg: "--input-dir".to_string(),
        })?;

        info!("Starting batch processing from directory: {:?}", input_dir);

        let report =
            process_directory_with(&input_dir, &config, args.batch, || collaborators(&args))?;
        for product in &report.products {
            report_product(product);
        }

        info!("Batch processing complete!");
        info!("Processed: {}", report.processed);
        info!("Skipped: {}", report.skipped);
        info!("Errors: {}", report.errors);
    } else {
        let input = args.input.clone().ok_or(AppError::MissingArgument {
            arg: "--input".to_string(),
        })?;

        let product = process_scene_with(&input, &config, collaborators(&args))?;
        info!("Successfully processed: {:?}", input);
        report_product(&product);
    }

    Ok(())
}
