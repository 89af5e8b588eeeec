//! End-to-end tests for the film grain crates.
//!
//! These tests verify the interaction between the payload parsers in
//! grain-bitstream, the frame model in grain-core and the synthesis engine in
//! grain-synth.

#[cfg(test)]
mod fixtures;

#[cfg(test)]
mod digest;

#[cfg(test)]
mod tests {
    use crate::fixtures::*;
    use grain_bitstream::av1::{FrameInfo, FrameType, GrainReferenceSlots, RawFilmGrainParams, SequenceInfo};
    use grain_bitstream::{FilmGrainSets, attach_film_grain_sets, attach_t35, parse_film_grain_sets};
    use grain_core::io::{frame_size_bytes, read_raw_frame, write_raw_frame};
    use grain_core::{FilmGrainParams, Frame, FramePlanes, PixelFormat, SideData};
    use grain_synth::{FilmGrainSynthesizer, SynthOptions, apply_film_grain};
    use tempfile::tempdir;

    fn expected(input: &Frame, params: &FilmGrainParams) -> Frame {
        let mut out = Frame::new_like(input).unwrap();
        apply_film_grain(&mut out, input, params).unwrap();
        out
    }

    /// AFGS1 payload -> parse -> attach -> select -> synthesize
    #[test]
    fn test_afgs1_pipeline() {
        let params = set_420(moderate_grain(), 4242, 64, 64, 10);
        let payload = encode_afgs1(&[(0, &params)]);
        let sets = parse_film_grain_sets(&payload).unwrap();
        assert!(sets.enable);
        assert_eq!(sets.sets[0], params);

        let mut frame = ramp_frame(PixelFormat::Yuv420p10, 64, 64);
        attach_film_grain_sets(&sets, &mut frame).unwrap();

        let synth = FilmGrainSynthesizer::default();
        let out = synth.synthesize(&frame).unwrap();
        assert_eq!(out.film_grain_params().count(), 0);
        assert_ne!(out.planes(), frame.planes());
        assert_eq!(out.planes(), expected(&frame, &params).planes());
    }

    /// Stream state carried across T.35 messages: the second message only
    /// changes the seed.
    #[test]
    fn test_t35_seed_update_across_frames() {
        let params = set_420(moderate_grain(), 1, 0, 0, 8);
        let mut sets = FilmGrainSets::default();

        let mut first = ramp_frame(PixelFormat::Yuv420p, 48, 32);
        attach_t35(&wrap_t35(&encode_afgs1(&[(2, &params)])), &mut sets, &mut first).unwrap();
        let mut second = ramp_frame(PixelFormat::Yuv420p, 48, 32);
        attach_t35(&wrap_t35(&encode_afgs1_seed_update(2, 2)), &mut sets, &mut second).unwrap();

        let synth = FilmGrainSynthesizer::default();
        let a = synth.synthesize(&first).unwrap();
        let b = synth.synthesize(&second).unwrap();
        assert_ne!(a.planes(), b.planes());

        let mut reseeded = params.clone();
        reseeded.seed = 2;
        assert_eq!(b.planes(), expected(&second, &reseeded).planes());
    }

    /// Inter frames reuse the key frame's model through the reference slots.
    #[test]
    fn test_av1_reference_model_reuse() {
        let seq = SequenceInfo::default();
        let key = FrameInfo {
            width: 64,
            height: 32,
            refresh_frame_flags: 0b0001_0000,
            ..FrameInfo::default()
        };
        let mut coded = RawFilmGrainParams {
            apply_grain: true,
            grain_seed: 100,
            update_grain: true,
            num_y_points: 2,
            grain_scaling_minus_8: 1,
            ar_coeff_lag: 1,
            overlap_flag: true,
            ..RawFilmGrainParams::default()
        };
        coded.point_y_value[..2].copy_from_slice(&[0, 255]);
        coded.point_y_scaling[..2].copy_from_slice(&[60, 90]);
        coded.ar_coeffs_y_plus_128[..4].copy_from_slice(&[120, 140, 110, 150]);

        let mut slots = GrainReferenceSlots::default();
        let key_params = slots.load(&coded).unwrap();
        slots.store(key.refresh_frame_flags, &key_params);

        let inter = FrameInfo {
            frame_type: FrameType::Inter,
            refresh_frame_flags: 0,
            ..key
        };
        let reuse = RawFilmGrainParams {
            apply_grain: true,
            grain_seed: 101,
            update_grain: false,
            film_grain_params_ref_idx: 4,
            ..RawFilmGrainParams::default()
        };
        let inter_params = slots.load(&reuse).unwrap().to_film_grain_params(&seq, &inter).unwrap();

        let mut expected_params = key_params.to_film_grain_params(&seq, &key).unwrap();
        expected_params.seed = 101;
        assert_eq!(inter_params, expected_params);

        let input = ramp_frame(PixelFormat::Yuv420p, 64, 32);
        let mut frame = input.clone();
        frame.add_film_grain_params(inter_params).unwrap();
        let out = FilmGrainSynthesizer::default().synthesize(&frame).unwrap();
        assert_eq!(out.planes(), expected(&input, &expected_params).planes());
    }

    /// The largest set that fits the frame wins.
    #[test]
    fn test_selection_drives_synthesis() {
        let input = ramp_frame(PixelFormat::Yuv420p, 64, 48);
        let small = set_420(moderate_grain(), 1, 32, 32, 0);
        let fitting = set_420(moderate_grain(), 2, 64, 48, 0);
        let oversized = set_420(moderate_grain(), 3, 128, 128, 0);

        let mut frame = input.clone();
        for set in [&small, &fitting, &oversized] {
            frame.add_film_grain_params(set.clone()).unwrap();
        }
        let out = FilmGrainSynthesizer::default().synthesize(&frame).unwrap();
        assert_eq!(out.planes(), expected(&input, &fitting).planes());
    }

    /// Other side data survives synthesis.
    #[test]
    fn test_hdr_plus_side_data_kept() {
        let mut frame = ramp_frame(PixelFormat::Yuv420p10, 32, 32);
        frame.add_side_data(SideData::DynamicHdrPlus(vec![1, 0x40])).unwrap();
        frame
            .add_film_grain_params(set_420(moderate_grain(), 9, 0, 0, 10))
            .unwrap();

        let out = FilmGrainSynthesizer::default().synthesize(&frame).unwrap();
        assert_eq!(out.side_data(), &[SideData::DynamicHdrPlus(vec![1, 0x40])]);
        assert_eq!(out.color(), frame.color());
    }

    /// Grained frames survive a raw file round trip.
    #[test]
    fn test_raw_file_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("grained.yuv");
        let format = PixelFormat::Yuv422p10;
        let params = {
            let mut p = set_420(moderate_grain(), 0, 0, 0, 0);
            p.subsampling_y = 0;
            p
        };

        let mut written = Vec::new();
        {
            let mut file = std::fs::File::create(&path).unwrap();
            for seed in 0..3u16 {
                let input = ramp_frame(format, 40, 24);
                let mut set = params.clone();
                set.seed = seed;
                let out = expected(&input, &set);
                write_raw_frame(&mut file, &out).unwrap();
                written.push(out);
            }
        }

        let len = std::fs::metadata(&path).unwrap().len() as usize;
        assert_eq!(len, 3 * frame_size_bytes(format, 40, 24));

        let mut file = std::io::BufReader::new(std::fs::File::open(&path).unwrap());
        for frame in &written {
            let back = read_raw_frame(&mut file, format, 40, 24).unwrap().unwrap();
            assert_eq!(back.planes(), frame.planes());
        }
        assert!(read_raw_frame(&mut file, format, 40, 24).unwrap().is_none());
    }

    /// YAML configuration drives a 12-bit 4:4:4 frame.
    #[test]
    fn test_yaml_params_pipeline() {
        let yaml = "
seed: 77
subsampling_x: 0
subsampling_y: 0
codec:
  aom:
    y_points: [[0, 80], [255, 80]]
    cb_points: [[0, 40], [255, 60]]
    cr_points: [[64, 50]]
    scaling_shift: 9
    ar_coeff_lag: 1
    ar_coeffs_y: [5, -3, 10, 20]
    ar_coeffs_cb: [1, 2, 3, 4, 30]
    ar_coeffs_cr: [0, 0, 0, 0, -20]
    cb_mult: 10
    cb_mult_luma: 64
    cr_offset: -12
    limit_output_range: true
";
        let params: FilmGrainParams = serde_yaml::from_str(yaml).unwrap();
        params.aom_params().unwrap().validate().unwrap();

        let input = ramp_frame(PixelFormat::Yuv444p12, 40, 40);
        let mut frame = input.clone();
        frame.add_film_grain_params(params).unwrap();
        let out = FilmGrainSynthesizer::default().synthesize(&frame).unwrap();
        assert_ne!(out.planes(), input.planes());

        // Limited range at 12 bits.
        let FramePlanes::U16(planes) = out.planes() else {
            panic!("12-bit frame stored as u8");
        };
        let (luma, chroma) = planes.split_at(1);
        assert!(luma[0].rows().flatten().all(|&v| (256..=3760).contains(&v)));
        assert!(chroma.iter().flat_map(|p| p.rows()).flatten().all(|&v| (256..=3840).contains(&v)));
    }

    /// Unsupported frames pass through, or fail in strict mode.
    #[test]
    fn test_passthrough_policy() {
        let mut frame = ramp_frame(PixelFormat::Yuv420p16, 16, 16);
        frame
            .add_film_grain_params(set_420(moderate_grain(), 1, 0, 0, 0))
            .unwrap();

        let lenient = FilmGrainSynthesizer::new(SynthOptions {
            passthrough_on_unsupported: true,
            ..SynthOptions::default()
        });
        let out = lenient.synthesize(&frame).unwrap();
        assert_eq!(out.planes(), frame.planes());
        assert_eq!(out.film_grain_params().count(), 1);

        let strict = FilmGrainSynthesizer::new(SynthOptions {
            passthrough_on_unsupported: false,
            ..SynthOptions::default()
        });
        assert!(strict.synthesize(&frame).is_err());
    }

    /// Parsed sets dump to JSON for inspection.
    #[test]
    fn test_sets_json_dump() {
        let params = set_420(moderate_grain(), 5, 1920, 1080, 8);
        let sets = parse_film_grain_sets(&encode_afgs1(&[(3, &params)])).unwrap();
        let json = serde_json::to_value(&sets).unwrap();
        assert_eq!(json["sets"][3]["seed"], 5);
        assert_eq!(json["sets"][3]["codec"]["aom"]["y_points"][1][0], 128);
        assert_eq!(json["sets"][0]["codec"], "none");
    }
}
