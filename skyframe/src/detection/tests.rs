use super::*;
use crate::geom::ExtentI;
use crate::image::Image;
use crate::mask::{DETECTED, DETECTED_NEGATIVE};
use crate::random::{random_gaussian_image, Random};

fn masked_from(image: Image<f32>) -> MaskedImage {
    let bbox = image.bbox();
    MaskedImage::new(image.clone(), Mask::new(bbox), image).unwrap()
}

fn blank(width: i32, height: i32) -> Image<f32> {
    Image::new(BoxI::new(PointI::new(10, 20), ExtentI::new(width, height)))
}

#[test]
fn test_threshold_type_parsing() {
    assert_eq!(
        Threshold::create(5.0, "stdev").unwrap().kind(),
        ThresholdType::Stdev
    );
    assert_eq!(
        Threshold::create(5.0, "STDEV").unwrap().kind(),
        ThresholdType::Stdev
    );
    assert_eq!(
        Threshold::create(2.0, "pixel_stdev").unwrap().kind(),
        ThresholdType::PixelStdev
    );
    assert_eq!(ThresholdType::PixelStdev.to_string(), "pixel_stdev");
    assert_eq!(
        Threshold::create(5.0, "sigma"),
        Err(DetectionError::UnknownThresholdType("sigma".to_string()))
    );
    assert!(matches!(
        Threshold::create(f64::NAN, "value"),
        Err(DetectionError::NonFiniteThreshold(_))
    ));
}

#[test]
fn test_spans_are_parent_coordinates() {
    let mut image = blank(12, 8);
    // 3x2 block at LOCAL (4..7, 2..4)
    for y in 2..4 {
        for x in 4..7 {
            image.set(x, y, 10.0);
        }
    }
    image.set(5, 3, 20.0);
    let mut masked = masked_from(image);

    let threshold = Threshold::create(5.0, "value").unwrap();
    let set = FootprintSet::new(&mut masked, &threshold, DETECTED).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.threshold_level(), Some(5.0));
    assert_eq!(set.region(), masked.bbox());

    let fp = &set.footprints()[0];
    assert_eq!(fp.spans(), &[Span::new(22, 14, 16), Span::new(23, 14, 16)]);
    assert_eq!(fp.area(), 6);
    assert_eq!(fp.spans()[0].pixel_count(), 3);
    assert_eq!(fp.spans()[1].to_string(), "23: 14..16");
    assert_eq!(
        fp.bbox(),
        BoxI::new(PointI::new(14, 22), ExtentI::new(3, 2))
    );
    assert_eq!(fp.peak().position, PointI::new(15, 23));
    assert_eq!(fp.peak().value, 20.0);
    assert!(fp.contains(PointI::new(16, 23)));
    assert!(!fp.contains(PointI::new(17, 23)));

    let bit = masked.mask().plane_bit_mask(DETECTED).unwrap();
    assert_eq!(masked.mask().count(bit), 6);
    assert_eq!(masked.mask().get(4, 2), bit);
    assert_eq!(masked.mask().get(3, 2), 0);
}

#[test]
fn test_connectivity_diagonal() {
    let mut image = blank(6, 6);
    image.set(1, 1, 1.0);
    image.set(2, 2, 1.0);
    image.set(3, 3, 1.0);
    let masked = masked_from(image);
    let threshold = Threshold::create(0.5, "value").unwrap();

    let four = FootprintSet::detect(&masked, &threshold, &DetectionConfig::default());
    assert_eq!(four.len(), 3);

    let eight = FootprintSet::detect(
        &masked,
        &threshold,
        &DetectionConfig {
            connectivity: Connectivity::Eight,
            ..Default::default()
        },
    );
    assert_eq!(eight.len(), 1);
    assert_eq!(eight.footprints()[0].area(), 3);
}

#[test]
fn test_u_shape_merges_into_one_footprint() {
    // two arms that only meet on the bottom row
    let mut image = blank(7, 5);
    for y in 0..4 {
        image.set(1, y, 1.0);
        image.set(5, y, 1.0);
    }
    for x in 1..6 {
        image.set(x, 4, 1.0);
    }
    // a separate blob to the right of the top rows
    image.set(3, 0, 1.0);
    let masked = masked_from(image);
    let threshold = Threshold::create(0.5, "value").unwrap();

    let set = FootprintSet::detect(&masked, &threshold, &DetectionConfig::default());
    assert_eq!(set.len(), 2);
    assert_eq!(set.footprints()[0].area(), 13);
    assert_eq!(set.footprints()[1].area(), 1);
    assert_eq!(set.total_area(), 14);
}

#[test]
fn test_negative_polarity() {
    let mut image = blank(8, 8);
    image.set(2, 2, -9.0);
    image.set(3, 2, -7.0);
    image.set(6, 6, 9.0);
    let mut masked = masked_from(image);

    let threshold = Threshold::create(5.0, "value")
        .unwrap()
        .with_polarity(Polarity::Negative);
    let set = FootprintSet::new(&mut masked, &threshold, DETECTED_NEGATIVE).unwrap();
    assert_eq!(set.len(), 1);
    let fp = &set.footprints()[0];
    assert_eq!(fp.area(), 2);
    assert_eq!(fp.peak().position, PointI::new(12, 22));
    assert_eq!(fp.peak().value, -9.0);

    let negative = masked.mask().plane_bit_mask(DETECTED_NEGATIVE).unwrap();
    let positive = masked.mask().plane_bit_mask(DETECTED).unwrap();
    assert_eq!(masked.mask().count(negative), 2);
    assert_eq!(masked.mask().count(positive), 0);
}

#[test]
fn test_npix_min_drops_small_footprints() {
    let mut image = blank(10, 4);
    image.set(0, 0, 1.0);
    for x in 4..8 {
        image.set(x, 2, 1.0);
    }
    let masked = masked_from(image);
    let threshold = Threshold::create(0.5, "value").unwrap();
    let config = DetectionConfig {
        npix_min: 2,
        ..Default::default()
    };
    let set = FootprintSet::detect(&masked, &threshold, &config);
    assert_eq!(set.len(), 1);
    assert_eq!(set.footprints()[0].area(), 4);
}

#[test]
fn test_stdev_threshold_scales_with_noise() {
    let mut image = blank(100, 100);
    random_gaussian_image(&mut image, &mut Random::new(4), 0.0, 5.0).unwrap();
    for y in 40..44 {
        for x in 60..64 {
            image.set(x, y, 100.0);
        }
    }
    let masked = masked_from(image);
    let threshold = Threshold::create(5.0, "stdev").unwrap();
    let set = FootprintSet::detect(&masked, &threshold, &DetectionConfig::default());

    let level = set.threshold_level().unwrap();
    assert!((level - 25.0).abs() < 2.0, "level = {level}");
    let blobs: Vec<_> = set
        .footprints()
        .iter()
        .filter(|fp| fp.area() > 1)
        .collect();
    assert_eq!(blobs.len(), 1);
    assert_eq!(blobs[0].area(), 16);
    assert_eq!(
        blobs[0].bbox(),
        BoxI::new(PointI::new(70, 60), ExtentI::new(4, 4))
    );
}

#[test]
fn test_pixel_stdev_uses_variance_plane() {
    let mut image = blank(5, 1);
    image.set(1, 0, 7.0);
    image.set(3, 0, 5.0);
    let bbox = image.bbox();
    let variance = Image::filled(bbox, 4.0);
    let masked = MaskedImage::new(image, Mask::new(bbox), variance).unwrap();

    let threshold = Threshold::create(3.0, "pixel_stdev").unwrap();
    let set = FootprintSet::detect(&masked, &threshold, &DetectionConfig::default());
    assert_eq!(set.threshold_level(), None);
    assert_eq!(set.len(), 1);
    assert_eq!(set.footprints()[0].peak().position, PointI::new(11, 20));
}

#[test]
fn test_include_multiplier_raises_the_level() {
    let mut image = blank(5, 1);
    image.set(1, 0, 7.0);
    image.set(3, 0, 12.0);
    let bbox = image.bbox();
    let masked = MaskedImage::new(image, Mask::new(bbox), Image::filled(bbox, 4.0)).unwrap();
    let config = DetectionConfig::default();

    let threshold = Threshold::create(5.0, "value").unwrap();
    assert_eq!(threshold.include_multiplier(), 1.0);
    assert_eq!(FootprintSet::detect(&masked, &threshold, &config).len(), 2);

    let threshold = threshold.with_include_multiplier(2.0);
    let set = FootprintSet::detect(&masked, &threshold, &config);
    assert_eq!(set.threshold_level(), Some(10.0));
    assert_eq!(set.len(), 1);
    assert_eq!(set.footprints()[0].peak().position, PointI::new(13, 20));

    // 3 * 1.5 * sqrt(4) = 9 leaves only the brighter pixel
    let threshold = Threshold::create(3.0, "pixel_stdev")
        .unwrap()
        .with_include_multiplier(1.5);
    let set = FootprintSet::detect(&masked, &threshold, &config);
    assert_eq!(set.len(), 1);
    assert_eq!(set.footprints()[0].area(), 1);
}

#[test]
fn test_unknown_plane_is_an_error() {
    let mut masked = masked_from(blank(4, 4));
    let threshold = Threshold::create(1.0, "value").unwrap();
    assert_eq!(
        FootprintSet::new(&mut masked, &threshold, "NOT_A_PLANE"),
        Err(DetectionError::Mask(MaskError::UnknownPlane(
            "NOT_A_PLANE".to_string()
        )))
    );
}

#[test]
fn test_everything_above_threshold_is_one_footprint() {
    let image = Image::filled(
        BoxI::new(PointI::new(0, 0), ExtentI::new(30, 20)),
        1000.0f32,
    );
    let mut masked = masked_from(image);
    let threshold = Threshold::create(10.0, "value").unwrap();
    let set = FootprintSet::new(&mut masked, &threshold, DETECTED).unwrap();
    assert_eq!(set.len(), 1);
    assert_eq!(set.total_area(), 600);
    let bit = masked.mask().plane_bit_mask(DETECTED).unwrap();
    assert_eq!(masked.mask().coverage(bit), 1.0);
}
