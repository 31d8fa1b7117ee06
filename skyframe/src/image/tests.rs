//! Tests for images and views.

use super::*;

fn frame_box() -> BoxI {
    BoxI::new(PointI::new(300, 500), ExtentI::new(200, 120))
}

/// Image whose pixel value encodes its LOCAL position.
fn ramp(bbox: BoxI) -> Image<f32> {
    let mut image = Image::<f32>::new(bbox);
    for y in 0..image.height() {
        for x in 0..image.width() {
            image.set(x, y, (y * 1000 + x) as f32);
        }
    }
    image
}

#[test]
fn test_allocation_preserves_extent_and_origin() {
    let cases = [
        (1, 1, PointI::new(0, 0)),
        (2000, 2048, PointI::new(300, 500)),
        (7, 3, PointI::new(-60, -60)),
        (64, 32, PointI::new(5, -9)),
    ];
    for (w, h, xy0) in cases {
        let image = Image::<f32>::from_dimensions(w, h, xy0);
        assert_eq!(image.width(), w);
        assert_eq!(image.height(), h);
        assert_eq!(image.xy0(), xy0);
        assert_eq!(image.bbox().min(), xy0);
        assert_eq!(image.dimensions(), ExtentI::new(w as i32, h as i32));

        let from_box = Image::<f64>::new(BoxI::new(xy0, ExtentI::new(w as i32, h as i32)));
        assert_eq!(from_box.bbox(), image.bbox());
    }
}

#[test]
fn test_parent_box_outside_frame_is_length_error() {
    let image = Image::<f32>::new(frame_box());
    let subbox = BoxI::new(PointI::new(10, 10), ExtentI::new(100, 100));

    let err = image.view(subbox, ImageOrigin::Parent).unwrap_err();
    assert_eq!(
        err,
        ImageError::Length {
            bbox: subbox,
            parent: frame_box(),
            origin: ImageOrigin::Parent,
        }
    );

    let view = image
        .view(subbox, ImageOrigin::Local)
        .expect("LOCAL box inside the frame");
    assert_eq!(view.xy0(), PointI::new(310, 510));
    assert_eq!(view.dimensions(), ExtentI::new(100, 100));
}

#[test]
fn test_local_box_outside_frame_is_length_error() {
    let mut image = Image::<f32>::new(frame_box());
    // Valid as PARENT, but far outside [0, extent) as LOCAL.
    let parent_box = BoxI::new(PointI::new(350, 550), ExtentI::new(10, 10));
    assert!(image.view(parent_box, ImageOrigin::Parent).is_ok());
    assert!(matches!(
        image.view_mut(parent_box, ImageOrigin::Local),
        Err(ImageError::Length { .. })
    ));
}

#[test]
fn test_far_away_box_is_length_error() {
    let mut image = Image::<f32>::new(BoxI::new(PointI::new(300, 500), ExtentI::new(20, 20)));
    let far = BoxI::new(PointI::new(i32::MAX - 10, 0), ExtentI::new(100, 100));
    for origin in [ImageOrigin::Parent, ImageOrigin::Local] {
        assert!(matches!(
            image.view(far, origin),
            Err(ImageError::Length { .. })
        ));
    }
    // shifting into LOCAL coordinates would underflow
    let below = BoxI::new(PointI::new(i32::MIN, i32::MIN), ExtentI::new(5, 5));
    assert!(matches!(
        image.view_mut(below, ImageOrigin::Parent),
        Err(ImageError::Length { .. })
    ));
    let err = image.view(far, ImageOrigin::Parent).unwrap_err();
    assert!(err.to_string().contains("PARENT"), "{err}");
}

#[test]
fn test_origin_at_i32_min() {
    let image = Image::<f32>::new(BoxI::new(PointI::new(i32::MIN, 0), ExtentI::new(4, 4)));
    let bbox = BoxI::new(PointI::new(i32::MIN + 1, 1), ExtentI::new(2, 2));
    let view = image.view(bbox, ImageOrigin::Parent).unwrap();
    assert_eq!(view.dimensions(), ExtentI::new(2, 2));
    assert!(matches!(
        image.view(bbox, ImageOrigin::Local),
        Err(ImageError::Length { .. })
    ));
    // LOCAL (1, 1) is PARENT (MIN + 1, 1), not a huge positive offset
    let far = BoxI::new(PointI::new(i32::MAX - 1, 1), ExtentI::new(2, 2));
    assert!(image.view(far, ImageOrigin::Parent).is_err());
}

#[test]
fn test_box_straddling_edge_is_rejected() {
    let image = Image::<f32>::new(frame_box());
    let straddle = BoxI::new(PointI::new(190, 0), ExtentI::new(20, 5));
    assert!(image.view(straddle, ImageOrigin::Local).is_err());
    assert!(image.view(BoxI::empty(), ImageOrigin::Local).is_err());
}

#[test]
fn test_view_write_aliases_parent() {
    let mut image = ramp(frame_box());
    let sub = BoxI::new(PointI::new(400, 560), ExtentI::new(10, 12));
    {
        let mut view = image.view_mut(sub, ImageOrigin::Parent).unwrap();
        view.fill(-7.5);
        view.set(0, 0, 99.0);
    }
    assert_eq!(image.get_parent(PointI::new(400, 560)), Some(99.0));
    assert_eq!(image.get_parent(PointI::new(409, 571)), Some(-7.5));
    // just outside the view is untouched
    assert_eq!(image.get(110, 60), (60 * 1000 + 110) as f32);
    assert_eq!(image.get(99, 60), (60 * 1000 + 99) as f32);
}

#[test]
fn test_array_mut_aliases_image() {
    let mut image = Image::<f32>::new(frame_box());
    image.array_mut().row_mut(3)[4] = 12.0;
    assert_eq!(image.get(4, 3), 12.0);
    assert_eq!(image.get_parent(PointI::new(304, 503)), Some(12.0));
}

#[test]
fn test_add_views_sums_overlaps() {
    let mut image = Image::<f32>::new(frame_box());
    let stamp = Image::<f32>::filled(
        BoxI::new(PointI::new(-1, -1), ExtentI::new(3, 3)),
        2.0,
    );
    for corner in [PointI::new(10, 10), PointI::new(11, 10)] {
        let bbox = BoxI::new(corner, ExtentI::new(3, 3));
        image
            .view_mut(bbox, ImageOrigin::Local)
            .unwrap()
            .add_assign(&stamp.as_view())
            .unwrap();
    }
    assert_eq!(image.get(10, 10), 2.0);
    assert_eq!(image.get(11, 11), 4.0);
    assert_eq!(image.get(13, 12), 2.0);
    assert_eq!(image.get(14, 12), 0.0);
}

#[test]
fn test_mixed_precision_add_fails_until_converted() {
    let mut image = Image::<f32>::new(frame_box());
    let bbox = BoxI::new(PointI::new(0, 0), ExtentI::new(5, 5));
    let kernel = DynImage::from(Image::<f64>::filled(bbox, 1.5));

    let mut view = image.view_mut(bbox, ImageOrigin::Local).unwrap();
    assert_eq!(
        view.try_add_dyn(&kernel),
        Err(ImageError::PrecisionMismatch {
            lhs: Precision::F32,
            rhs: Precision::F64,
        })
    );

    let kernel = kernel.into_f32();
    assert_eq!(kernel.precision(), Precision::F32);
    view.try_add_dyn(&kernel).unwrap();
    assert_eq!(image.get(4, 4), 1.5);
    assert_eq!(image.get(5, 5), 0.0);
}

#[test]
fn test_extent_mismatch() {
    let mut image = Image::<f32>::new(frame_box());
    let other = Image::<f32>::new(BoxI::new(PointI::new(0, 0), ExtentI::new(4, 4)));
    assert!(matches!(
        image.add_assign_image(&other),
        Err(ImageError::ExtentMismatch { .. })
    ));
}

#[test]
fn test_assign_copies_not_adds() {
    let src = ramp(frame_box());
    let mut dst = Image::<f32>::filled(frame_box(), 5.0);
    let half = BoxI::new(PointI::new(0, 0), ExtentI::new(100, 120));
    dst.view_mut(half, ImageOrigin::Local)
        .unwrap()
        .assign(&src.view(half, ImageOrigin::Local).unwrap())
        .unwrap();
    assert_eq!(dst.get(99, 119), src.get(99, 119));
    assert_eq!(dst.get(100, 0), 5.0);
}

#[test]
fn test_negate_half_in_place() {
    let original = ramp(frame_box());
    let mut image = original.clone();
    let left = BoxI::new(PointI::new(0, 0), ExtentI::new(100, 120));
    image.view_mut(left, ImageOrigin::Local).unwrap().negate();
    assert_eq!(image.get(1, 1), -original.get(1, 1));
    assert_eq!(image.get(150, 1), original.get(150, 1));
}

#[test]
fn test_scale_and_divide() {
    let mut image = Image::<f64>::filled(frame_box(), 4.0);
    image /= 2.0;
    image *= 3.0;
    assert_eq!(image.max(), Some(6.0));
    assert_eq!(image.min(), Some(6.0));
}

#[test]
fn test_crop_keeps_parent_origin() {
    let image = ramp(frame_box());
    let sub = BoxI::new(PointI::new(5, 6), ExtentI::new(3, 2));
    let crop = image.crop(sub, ImageOrigin::Local).unwrap();
    assert_eq!(crop.xy0(), PointI::new(305, 506));
    assert_eq!(crop.get(0, 0), image.get(5, 6));
    assert_eq!(crop.get(2, 1), image.get(7, 7));
}

#[test]
fn test_convert_precision() {
    let image = Image::<f64>::filled(frame_box(), 2.25);
    let converted: Image<f32> = image.convert();
    assert_eq!(converted.bbox(), image.bbox());
    assert_eq!(converted.get(3, 3), 2.25f32);
}

#[test]
fn test_max_skips_nan() {
    let mut image = Image::<f32>::new(BoxI::new(PointI::new(0, 0), ExtentI::new(3, 1)));
    image.set(0, 0, f32::NAN);
    image.set(1, 0, 3.0);
    image.set(2, 0, -1.0);
    assert_eq!(image.max(), Some(3.0));
    assert_eq!(image.min(), Some(-1.0));
}
