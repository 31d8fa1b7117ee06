//! End-to-end run of the tour on a reduced frame.

use skyframe::{
    run_tour, BoxI, ExtentI, Gotcha, ImageOrigin, PointI, Random, RecordingDisplay, TourConfig,
    TourReport,
};

fn reduced_config() -> TourConfig {
    TourConfig {
        extent: ExtentI::new(400, 400),
        n_objects: 20,
        edge_margin: 20,
        psf_size: 31,
        background_cells: (4, 4),
        seed: 7,
        ..Default::default()
    }
}

fn run(config: &TourConfig) -> (TourReport, RecordingDisplay) {
    common::log_setup::init_test_logging();
    let mut display = RecordingDisplay::new();
    let report = run_tour(config, &mut Random::new(config.seed), &mut display)
        .expect("tour should recover from every gotcha");
    (report, display)
}

#[test]
fn test_detection_before_and_after_background_subtraction() {
    let config = reduced_config();
    let (report, _) = run(&config);

    let before = report.before_subtraction;
    assert!(
        before.coverage > 0.9,
        "sky should be detected everywhere, coverage = {}",
        before.coverage
    );

    let after = report.after_subtraction;
    assert!(
        after.coverage < 0.1,
        "only sources should remain, coverage = {}",
        after.coverage
    );
    let n = config.n_objects;
    assert!(
        (n / 2..=n + 3).contains(&after.footprints),
        "{} footprints for {} sources",
        after.footprints,
        n
    );

    // the threshold is absolute: about 5 sigma of a 1000-count Poisson sky
    let level = after.threshold_level.unwrap();
    assert!((120.0..200.0).contains(&level), "level = {level}");
    assert!(
        report.residual_sky.median_clip.abs() < 5.0,
        "residual sky median = {}",
        report.residual_sky.median_clip
    );
}

#[test]
fn test_gotchas_in_order() {
    let (report, display) = run(&reduced_config());
    assert_eq!(
        report.gotchas,
        [
            Gotcha::ParentVsLocal,
            Gotcha::PrecisionMismatch,
            Gotcha::BackgroundNotSubtracted,
            Gotcha::InPlaceShift,
        ]
    );
    assert_eq!(display.shown.len(), 5);
    assert!(display.shown[1].summary.detected.unwrap() > 0.9);
    assert!(display.shown[2].summary.detected.unwrap() < 0.1);
}

#[test]
fn test_sources_stay_inside_margin() {
    let config = reduced_config();
    let (report, _) = run(&config);
    let margin = config.edge_margin as i32;
    for p in &report.sources {
        assert!(p.x >= margin && p.x < 400 - margin, "{p}");
        assert!(p.y >= margin && p.y < 400 - margin, "{p}");
    }
}

#[test]
fn test_views_alias_their_parent() {
    let config = reduced_config();
    let (report, display) = run(&config);

    assert!(report.fill_visible);
    assert_eq!(
        report.fill_box,
        BoxI::new(PointI::new(400, 620), ExtentI::new(100, 100))
    );

    // the fill landed on the frame shown after it, at the same PARENT pixels
    let filled = &display.shown[3].pixels;
    let view = filled.view(report.fill_box, ImageOrigin::Parent).unwrap();
    assert!(view.iter().all(|v| v == report.fill_value));
    assert_eq!(report.fill_value, display.shown[2].summary.max);
}

#[test]
fn test_halves_combine_to_left_negated_frame() {
    let config = reduced_config();
    let (report, display) = run(&config);
    assert!(report.halves_match);

    let before = &display.shown[3].pixels;
    let combined = &report.combined;
    assert_eq!(combined.bbox(), before.bbox());
    for y in 0..combined.height() {
        for x in 0..combined.width() {
            let expected = if x < 200 {
                -before.get(x, y)
            } else {
                before.get(x, y)
            };
            assert_eq!(combined.get(x, y).to_bits(), expected.to_bits(), "({x}, {y})");
        }
    }
    // the negation went through a view, so the frame itself changed too
    assert_eq!(report.masked.image().array().pixels(), combined.array().pixels());
}

#[test]
fn test_same_seed_same_tour() {
    let config = reduced_config();
    let (a, _) = run(&config);
    let (b, _) = run(&config);
    assert_eq!(a.sources, b.sources);
    assert_eq!(a.after_subtraction, b.after_subtraction);
}

/// Full-size frame with every default. Slow in debug builds.
#[test]
#[ignore] // Full 2000x2048 frame, run with --release -- --ignored
fn test_default_config_tour() {
    let config = TourConfig::default();
    let (report, display) = run(&config);

    assert_eq!(report.gotchas.len(), 4);
    assert_eq!(report.sources.len(), 1000);
    assert!(report.before_subtraction.coverage > 0.99);

    let after = report.after_subtraction;
    assert!(
        (0.03..0.1).contains(&after.coverage),
        "coverage = {}",
        after.coverage
    );
    // blended neighbours merge, so fewer footprints than sources
    assert!(
        (780..=930).contains(&after.footprints),
        "{} footprints",
        after.footprints
    );
    assert!(report.fill_visible);
    assert!(report.halves_match);
    assert_eq!(display.shown.len(), 5);
    assert_eq!(display.transparency, Some(config.mask_transparency));
}
