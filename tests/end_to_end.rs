mod common;

use std::fs;

use ardpro::io::BoundingBox;
use ardpro::{Band, Error, PanMethod, PlatformProfile, RoiMissPolicy, RunConfig, StageKind};
use common::*;

#[test]
fn pleiades_scene_to_ard() {
    let root = tempfile::tempdir().unwrap();
    let archive = scene_archive(root.path(), "phr", PHR_SCENE);
    let engine = RecordingEngine::default();
    let cfg = RunConfig {
        pan_method: Some(PanMethod::Bayes),
        ..config(root.path())
    };

    let mut profile = PlatformProfile::new(
        &archive,
        cfg,
        collaborators(&engine, MockExtractor::single_tile("PHR1A"), overlap()),
    )
    .unwrap();
    assert_eq!(profile.platform(), ardpro::Platform::Pleiades);
    assert_eq!(profile.dataset().scene().norad_id(), 38012);
    let product = profile.process_to_ard().unwrap();

    // single tiles are their own mosaics
    assert!(!engine.apps().iter().any(|a| a == "TileFusion"));
    assert!(
        product
            .ms_mosaic
            .ends_with("tmp/cal/MS/IMG_PHR1A_MS_0001_R1C1_CAL.TIF")
    );
    assert!(
        product
            .pansharpened
            .ends_with("tmp/pan/IMG_PHR1A_PAN_0001_R1C1_CAL.TIF")
    );
    assert_ne!(product.pansharpened, product.ms_mosaic);
    assert!(product.pansharpened.is_file());
    assert!(product.published.is_none());

    let pxs = engine.call("Pansharpening");
    assert_eq!(pxs.str_param("method"), Some("bayes"));
    assert_eq!(
        pxs.str_param("out").map(|o| o.split_once('?').map(|(_, opts)| opts.to_string())),
        Some(Some("&gdal:co:TILED=YES&gdal:co:COMPRESS=DEFLATE&gdal:co:BIGTIFF=YES".to_string()))
    );
    // no DEM configured, no elevation fetch
    assert!(!engine.apps().iter().any(|a| a == "DownloadSRTMTiles"));
}

#[test]
fn spot_incomplete_grid_produces_nothing() {
    let root = tempfile::tempdir().unwrap();
    let archive = scene_archive(root.path(), "spot", SPOT_SCENE);
    let engine = RecordingEngine::default();
    let three_of_four = [(1, 1), (1, 2), (2, 1)];
    let extractor = MockExtractor::new("SPOT6", &three_of_four, &[(1, 1), (1, 2), (2, 1), (2, 2)]);

    let err = PlatformProfile::new(
        &archive,
        config(root.path()),
        collaborators(&engine, extractor, overlap()),
    )
    .unwrap()
    .process_to_ard()
    .unwrap_err();

    match err {
        Error::IncompleteTileGrid {
            band,
            tiles,
            rows,
            cols,
        } => {
            assert_eq!(band, Band::Ms);
            assert_eq!((tiles, rows, cols), (3, 2, 2));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!engine.apps().iter().any(|a| a == "TileFusion" || a == "Pansharpening"));
    assert!(file_names(&root.path().join("spot/tmp/pan")).is_empty());
}

#[test]
fn archive_failure_aborts_before_any_stage() {
    let root = tempfile::tempdir().unwrap();
    let archive = scene_archive(root.path(), "phr", PHR_SCENE);
    let engine = RecordingEngine::default();

    let err = PlatformProfile::new(
        &archive,
        config(root.path()),
        collaborators(&engine, MockExtractor::broken("PHR1A"), overlap()),
    )
    .unwrap()
    .process_to_ard()
    .unwrap_err();

    assert!(matches!(err, Error::Archive { code: 9, .. }));
    assert!(engine.calls().is_empty());
}

#[test]
fn scene_names_are_validated_up_front() {
    let root = tempfile::tempdir().unwrap();
    let engine = RecordingEngine::default();
    let open = |name: &str| {
        PlatformProfile::new(
            root.path().join(name),
            config(root.path()),
            collaborators(&engine, MockExtractor::single_tile("PHR1A"), overlap()),
        )
        .err()
    };

    assert!(matches!(
        open("DS_PHR2A_202001011230451_x.zip"),
        Some(Error::UnknownPlatform { code }) if code == "PHR2A"
    ));
    assert!(matches!(
        open("DS_SPOT9_202001011230451_x.zip"),
        Some(Error::UnknownPlatform { .. })
    ));
    assert!(matches!(
        open("S2A_MSIL1C_20200101T103021_x.zip"),
        Some(Error::UnsupportedScene { .. })
    ));
    assert!(matches!(
        open("DS_PHR1A_FR1_x.zip"),
        Some(Error::MetadataParse { .. })
    ));
    assert!(matches!(
        open("DS_PHR1A_123\u{0660}56789012345_x.zip"),
        Some(Error::MetadataParse { .. })
    ));
}

#[test]
fn roi_clips_every_band() {
    let root = tempfile::tempdir().unwrap();
    let archive = scene_archive(root.path(), "spot", SPOT_SCENE);
    let engine = RecordingEngine::default();
    let cfg = RunConfig {
        roi: Some(BoundingBox::new(1.0, 43.0, 1.1, 43.1)),
        ..config(root.path())
    };

    let product = PlatformProfile::new(
        &archive,
        cfg,
        collaborators(&engine, MockExtractor::single_tile("SPOT6"), overlap()),
    )
    .unwrap()
    .process_to_ard()
    .unwrap();

    let clips: Vec<_> = engine
        .calls()
        .into_iter()
        .filter(|c| c.app == "ExtractROI")
        .collect();
    assert_eq!(clips.len(), 2);
    assert_eq!(clips[0].str_param("mode"), Some("extent"));
    assert_eq!(clips[0].str_param("mode.extent.unit"), Some("phy"));
    assert!(product.ms_mosaic.ends_with("tmp/roi/MS/IMG_SPOT6_MS_0001_R1C1_CAL_ROI.TIF"));
    assert!(product.pan_mosaic.ends_with("tmp/roi/P/IMG_SPOT6_P_0001_R1C1_CAL_ROI.TIF"));
    assert!(
        product
            .pansharpened
            .ends_with("tmp/pan/IMG_SPOT6_PAN_0001_R1C1_CAL_ROI.TIF")
    );
}

#[test]
fn roi_miss_follows_policy() {
    let run = |policy: RoiMissPolicy| {
        let root = tempfile::tempdir().unwrap();
        let archive = scene_archive(root.path(), "spot", SPOT_SCENE);
        let engine = RecordingEngine::default();
        let cfg = RunConfig {
            roi: Some(BoundingBox::new(100.0, 10.0, 100.1, 10.1)),
            roi_miss: policy,
            ..config(root.path())
        };
        let result = PlatformProfile::new(
            &archive,
            cfg,
            collaborators(&engine, MockExtractor::single_tile("SPOT6"), FixedRoiResolver(None)),
        )
        .unwrap()
        .process_to_ard();
        (result, engine.apps())
    };

    let (aborted, apps) = run(RoiMissPolicy::Abort);
    assert!(matches!(aborted, Err(Error::RoiMiss { band: Band::Ms, .. })));
    assert!(!apps.iter().any(|a| a == "Pansharpening"));

    let (unclipped, apps) = run(RoiMissPolicy::Unclipped);
    let product = unclipped.unwrap();
    assert!(!apps.iter().any(|a| a == "ExtractROI"));
    assert!(product.ms_mosaic.ends_with("tmp/cal/MS/IMG_SPOT6_MS_0001_R1C1_CAL.TIF"));
}

#[test]
fn elevation_tiles_follow_the_pan_footprint() {
    let root = tempfile::tempdir().unwrap();
    let archive = scene_archive(root.path(), "phr", PHR_SCENE);
    let engine = RecordingEngine::default();
    let dem = root.path().join("srtm");
    let cfg = RunConfig {
        dem_path: Some(dem.clone()),
        ..config(root.path())
    };

    let product = PlatformProfile::new(
        &archive,
        cfg,
        collaborators(&engine, MockExtractor::new("PHR1A", &[(1, 1)], &[(1, 1), (1, 2)]), overlap()),
    )
    .unwrap()
    .process_to_ard()
    .unwrap();

    let fetch = engine.call("DownloadSRTMTiles");
    assert_eq!(fetch.str_param("tiledir"), dem.to_str());
    match fetch.param("il") {
        Some(ardpro::io::ParamValue::List(images)) => {
            assert_eq!(images.len(), 2);
            assert!(images.iter().all(|i| i.contains("IMG_PHR1A_P_0001_")));
        }
        other => panic!("unexpected il: {other:?}"),
    }
    assert!(dem.is_dir());
    // no geoid, so resampling runs without elevation
    assert!(engine.call("Superimpose").param("elev.dem").is_none());
    assert_eq!(product.lineage[0].kind, StageKind::FetchElevationTiles);
}

#[test]
fn missing_pan_tiles_report_the_empty_grid() {
    let root = tempfile::tempdir().unwrap();
    let archive = scene_archive(root.path(), "phr", PHR_SCENE);
    let engine = RecordingEngine::default();
    let cfg = RunConfig {
        dem_path: Some(root.path().join("srtm")),
        ..config(root.path())
    };

    let err = PlatformProfile::new(
        &archive,
        cfg,
        collaborators(&engine, MockExtractor::new("PHR1A", &[(1, 1)], &[]), overlap()),
    )
    .unwrap()
    .process_to_ard()
    .unwrap_err();

    assert!(matches!(
        err,
        Error::IncompleteTileGrid {
            band: Band::P,
            tiles: 0,
            ..
        }
    ));
    assert!(!engine.apps().iter().any(|a| a == "DownloadSRTMTiles"));
}

#[test]
fn publishes_under_norad_and_datetime() {
    let root = tempfile::tempdir().unwrap();
    let archive = scene_archive(root.path(), "phr", PHR_SCENE);
    let ard = root.path().join("ard");
    let cfg = RunConfig {
        ard_dir: Some(ard.clone()),
        ..config(root.path())
    };

    let run = || {
        let engine = RecordingEngine::default();
        PlatformProfile::new(
            &archive,
            cfg.clone(),
            collaborators(&engine, MockExtractor::single_tile("PHR1A"), overlap()),
        )
        .unwrap()
        .process_to_ard()
        .unwrap()
    };

    let product = run();
    let expected = ard.join("38012/20200101_123045/IMG_PHR1A_PAN_0001_R1C1_CAL.TIF");
    assert_eq!(product.published.as_deref(), Some(expected.as_path()));
    assert_eq!(fs::read(&expected).unwrap(), b"Pansharpening");

    // publishing again keeps the existing copy
    let again = run();
    assert_eq!(again.published, product.published);
    assert_eq!(
        file_names(&ard.join("38012/20200101_123045")),
        ["IMG_PHR1A_PAN_0001_R1C1_CAL.TIF"]
    );
}
