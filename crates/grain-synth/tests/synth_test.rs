//! Frame-level synthesis tests for grain-synth.

use grain_core::{AomFilmGrain, FilmGrainParams, Frame, FramePlanes, MatrixCoefficients, PixelFormat};
use grain_synth::{SynthOptions, apply_film_grain, apply_film_grain_with};

/// Frame filled with a diagonal ramp so every sample value is exercised.
fn ramp_frame(format: PixelFormat, w: u32, h: u32) -> Frame {
    let mut frame = Frame::new(format, w, h).unwrap();
    let max = (1u32 << format.descriptor().bit_depth) - 1;
    match frame.planes_mut() {
        FramePlanes::U8(planes) => {
            for (i, p) in planes.iter_mut().enumerate() {
                for y in 0..p.height() {
                    for (x, v) in p.row_mut(y).iter_mut().enumerate() {
                        *v = ((x * 3 + y * 5 + i * 40) as u32 % (max + 1)) as u8;
                    }
                }
            }
        }
        FramePlanes::U16(planes) => {
            for (i, p) in planes.iter_mut().enumerate() {
                for y in 0..p.height() {
                    for (x, v) in p.row_mut(y).iter_mut().enumerate() {
                        *v = ((x * 13 + y * 29 + i * 160) as u32 % (max + 1)) as u16;
                    }
                }
            }
        }
    }
    frame
}

fn strong_grain() -> AomFilmGrain {
    let mut g = AomFilmGrain {
        num_y_points: 2,
        num_uv_points: [2, 2],
        scaling_shift: 8,
        ar_coeff_lag: 3,
        ar_coeff_shift: 7,
        overlap_flag: true,
        uv_mult: [-64, 32],
        uv_mult_luma: [96, 128],
        uv_offset: [64, -100],
        ..AomFilmGrain::default()
    };
    g.y_points[0] = [0, 255];
    g.y_points[1] = [255, 255];
    g.uv_points[0][0] = [0, 200];
    g.uv_points[0][1] = [255, 255];
    g.uv_points[1][0] = [0, 255];
    g.uv_points[1][1] = [128, 100];
    for (i, c) in g.ar_coeffs_y.iter_mut().enumerate() {
        *c = (i as i8 * 5) - 60;
    }
    for uv in 0..2 {
        for (i, c) in g.ar_coeffs_uv[uv].iter_mut().enumerate() {
            *c = 40 - (i as i8 * 3) + uv as i8;
        }
    }
    g
}

fn grained(input: &Frame, params: &FilmGrainParams, parallel: bool) -> Frame {
    let mut out = Frame::new_like(input).unwrap();
    let options = SynthOptions {
        parallel,
        ..SynthOptions::default()
    };
    apply_film_grain_with(&mut out, input, params, &options).unwrap();
    out
}

/// Every sample of every plane, widened.
fn samples(frame: &Frame) -> Vec<Vec<u32>> {
    match frame.planes() {
        FramePlanes::U8(p) => p
            .iter()
            .map(|p| p.rows().flatten().map(|&v| u32::from(v)).collect())
            .collect(),
        FramePlanes::U16(p) => p
            .iter()
            .map(|p| p.rows().flatten().map(|&v| u32::from(v)).collect())
            .collect(),
    }
}

#[test]
fn test_zero_strength_is_identity() {
    let input = ramp_frame(PixelFormat::Yuv420p, 64, 64);
    let mut grain = AomFilmGrain::default();
    grain.num_y_points = 2;
    grain.y_points[0] = [0, 0];
    grain.y_points[1] = [255, 0];

    let out = grained(&input, &FilmGrainParams::aom(grain, 0), true);
    assert_eq!(out.planes(), input.planes());
}

#[test]
fn test_deterministic() {
    for format in [PixelFormat::Yuv420p, PixelFormat::Yuv422p10, PixelFormat::Yuv444p12] {
        let input = ramp_frame(format, 70, 45);
        let params = FilmGrainParams::aom(strong_grain(), 0x1234);
        let a = grained(&input, &params, true);
        let b = grained(&input, &params, true);
        assert_eq!(a.planes(), b.planes(), "{}", format);
        assert_ne!(a.planes(), input.planes(), "{}", format);

        let other = grained(&input, &FilmGrainParams::aom(strong_grain(), 0x1235), true);
        assert_ne!(a.planes(), other.planes(), "{}", format);
    }
}

#[test]
fn test_parallel_matches_sequential() {
    for format in [PixelFormat::Yuv420p, PixelFormat::Yuv420p10, PixelFormat::Gray10] {
        let input = ramp_frame(format, 97, 130);
        let params = FilmGrainParams::aom(strong_grain(), 4321);
        let par = grained(&input, &params, true);
        let seq = grained(&input, &params, false);
        assert_eq!(par.planes(), seq.planes(), "{}", format);
    }
}

#[test]
fn test_limited_output_range() {
    let mut grain = strong_grain();
    grain.limit_output_range = true;
    for (format, shift) in [(PixelFormat::Yuv420p, 0), (PixelFormat::Yuv444p10, 2)] {
        let input = ramp_frame(format, 64, 64);
        let out = grained(&input, &FilmGrainParams::aom(grain.clone(), 99), true);
        let planes = samples(&out);
        assert!(planes[0].iter().all(|&v| (16 << shift..=235 << shift).contains(&v)));
        for chroma in &planes[1..] {
            assert!(chroma.iter().all(|&v| (16 << shift..=240 << shift).contains(&v)));
        }
    }
}

#[test]
fn test_limited_range_identity_matrix() {
    let mut grain = strong_grain();
    grain.limit_output_range = true;
    let mut input = ramp_frame(PixelFormat::Yuv444p, 40, 40);
    let mut color = *input.color();
    color.matrix = MatrixCoefficients::RGB;
    input.set_color(color);

    let out = grained(&input, &FilmGrainParams::aom(grain, 5), true);
    for plane in samples(&out) {
        assert!(plane.iter().all(|&v| (16..=235).contains(&v)));
    }
}

#[test]
fn test_max_strength_stays_in_sample_range() {
    let mut grain = strong_grain();
    grain.scaling_shift = 8;
    grain.grain_scale_shift = 0;
    grain.ar_coeff_shift = 6;
    for format in [PixelFormat::Yuv420p, PixelFormat::Yuv420p12] {
        let max = (1u32 << format.descriptor().bit_depth) - 1;
        let input = ramp_frame(format, 66, 66);
        let out = grained(&input, &FilmGrainParams::aom(grain.clone(), 0xffff), true);
        assert!(samples(&out).iter().flatten().all(|&v| v <= max), "{}", format);
    }
}

/// With the strongest scaling the added noise never exceeds
/// `round2(255 * (128 << (bd - 8)), scaling_shift)` in magnitude.
#[test]
fn test_max_strength_delta_bound() {
    let grain = strong_grain();
    let shift = u32::from(grain.scaling_shift);
    for format in [PixelFormat::Yuv420p, PixelFormat::Yuv420p10] {
        let bd = format.descriptor().bit_depth;
        let bound = (255 * (128u32 << (bd - 8)) + (1 << (shift - 1))) >> shift;
        let input = ramp_frame(format, 97, 65);
        let out = grained(&input, &FilmGrainParams::aom(grain.clone(), 1234), false);

        for (plane, (o, i)) in samples(&out).iter().zip(samples(&input)).enumerate() {
            let max_delta = o.iter().zip(&i).map(|(&a, &b)| a.abs_diff(b)).max().unwrap();
            assert!(max_delta <= bound, "{} plane {}: {} > {}", format, plane, max_delta, bound);
            // Full-scale luma grain comes within one code value of the bound.
            if plane == 0 {
                assert!(max_delta + 1 >= bound, "{}: {}", format, max_delta);
            }
        }
    }
}

#[test]
fn test_odd_width_420() {
    let input = ramp_frame(PixelFormat::Yuv420p, 33, 17);
    let out = grained(&input, &FilmGrainParams::aom(strong_grain(), 77), true);
    let (o, i) = (samples(&out), samples(&input));
    assert_eq!(o[1].len(), 17 * 9);
    assert_ne!(o[1], i[1]);
    assert_ne!(o[2], i[2]);
}

#[test]
fn test_chroma_scaling_from_luma() {
    let mut grain = strong_grain();
    grain.chroma_scaling_from_luma = true;
    grain.num_uv_points = [0, 0];
    let input = ramp_frame(PixelFormat::Yuv420p10, 64, 48);
    let out = grained(&input, &FilmGrainParams::aom(grain, 11), true);
    let (o, i) = (samples(&out), samples(&input));
    assert_ne!(o[1], i[1]);
    assert_ne!(o[2], i[2]);
}

#[test]
fn test_chroma_only() {
    let mut grain = strong_grain();
    grain.num_y_points = 0;
    let input = ramp_frame(PixelFormat::Yuv420p, 64, 64);
    let out = grained(&input, &FilmGrainParams::aom(grain, 11), true);
    let (o, i) = (samples(&out), samples(&input));
    assert_eq!(o[0], i[0]);
    assert_ne!(o[1], i[1]);
}

#[test]
fn test_default_entry_point() {
    let input = ramp_frame(PixelFormat::Gray8, 20, 20);
    let mut out = Frame::new_like(&input).unwrap();
    apply_film_grain(&mut out, &input, &FilmGrainParams::aom(strong_grain(), 3)).unwrap();
    assert_ne!(out.planes(), input.planes());
}
