use super::*;

fn ramp(n: usize) -> Vec<Rgb> {
    (0..n).map(|i| Rgb::grey(i as u8)).collect()
}

fn values(px: &[Rgb]) -> Vec<u8> {
    px.iter().map(|p| p.r).collect()
}

#[test]
fn shifts_wrap_around() {
    let s = GridShape::new(3, 2);
    let src = ramp(6);
    assert_eq!(values(&shift_wrap(s, &src, -1, 0)), vec![1, 2, 0, 4, 5, 3]);
    assert_eq!(values(&shift_wrap(s, &src, 1, 0)), vec![2, 0, 1, 5, 3, 4]);
    assert_eq!(values(&shift_wrap(s, &src, 0, 1)), vec![3, 4, 5, 0, 1, 2]);
    assert_eq!(values(&shift_wrap(s, &src, 0, -1)), vec![3, 4, 5, 0, 1, 2]);
}

#[test]
fn rotate_square_clockwise() {
    // 0 1 2      6 3 0
    // 3 4 5  ->  7 4 1
    // 6 7 8      8 5 2
    let s = GridShape::new(3, 3);
    let src = ramp(9);
    assert_eq!(
        values(&rotate_quarter(s, &src, 1)),
        vec![6, 3, 0, 7, 4, 1, 8, 5, 2]
    );
    assert_eq!(
        values(&rotate_quarter(s, &src, 2)),
        vec![8, 7, 6, 5, 4, 3, 2, 1, 0]
    );
    assert_eq!(
        values(&rotate_quarter(s, &src, 3)),
        vec![2, 5, 8, 1, 4, 7, 0, 3, 6]
    );
    let four = (0..4).fold(src.clone(), |acc, _| rotate_quarter(s, &acc, 1));
    assert_eq!(four, src);
}

#[test]
fn rotate_non_square_crops_into_same_canvas() {
    // 3x1 strip: the centre pixel survives a quarter turn, the ends leave the canvas.
    let s = GridShape::new(3, 1);
    let src = vec![Rgb::grey(10), Rgb::grey(20), Rgb::grey(30)];
    let out = rotate_quarter(s, &src, 1);
    assert_eq!(out, vec![Rgb::BLACK, Rgb::grey(20), Rgb::BLACK]);
    assert_eq!(values(&rotate_quarter(s, &src, 2)), vec![30, 20, 10]);
}

#[test]
fn mirrors_and_invert() {
    let s = GridShape::new(3, 2);
    let src = ramp(6);
    assert_eq!(values(&mirror_h(s, &src)), vec![2, 1, 0, 5, 4, 3]);
    assert_eq!(values(&mirror_v(s, &src)), vec![3, 4, 5, 0, 1, 2]);
    assert_eq!(invert(&[Rgb::new(0, 10, 255)]), vec![Rgb::new(255, 245, 0)]);
}

#[test]
fn brightness_scales_and_clamps() {
    let src = [Rgb::new(100, 200, 0)];
    assert_eq!(scale_brightness(&src, 50), vec![Rgb::new(150, 255, 0)]);
    assert_eq!(scale_brightness(&src, -50), vec![Rgb::new(50, 100, 0)]);
    assert_eq!(scale_brightness(&src, -200), vec![Rgb::BLACK]);
    assert_eq!(scale_brightness(&src, 0), src.to_vec());
}

#[test]
fn blend_darken_and_mask() {
    let a = [Rgb::WHITE];
    let b = [Rgb::BLACK];
    assert_eq!(blend(&a, &b, 0), vec![Rgb::WHITE]);
    assert_eq!(blend(&a, &b, 255), vec![Rgb::BLACK]);
    assert_eq!(darken(&a, 255), vec![Rgb::BLACK]);
    assert_eq!(darken(&a, 0), vec![Rgb::WHITE]);

    let before = vec![Rgb::grey(1), Rgb::grey(2)];
    let after = vec![Rgb::grey(9), Rgb::grey(9)];
    let mask = [Rgb::BLACK, Rgb::new(0, 0, 1)];
    assert_eq!(
        apply_mask(&before, after, &mask),
        vec![Rgb::grey(1), Rgb::grey(9)]
    );
}
