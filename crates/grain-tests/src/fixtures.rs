//! Test inputs and payload encoders shared by the end-to-end tests.

use std::io;

use bitstream_io::{BigEndian, BitRecorder, BitWrite, BitWriter};
use grain_core::{AomFilmGrain, FilmGrainParams, Frame, FramePlanes, PixelFormat};
use sha2::{Digest, Sha256};

/// T.35 header of an AOM film grain message.
pub const T35_AFGS1_HEADER: [u8; 5] = [0xB5, 0x58, 0x90, 0x00, 0x01];

// ---------------------------------------------------------------------------
// Frames
// ---------------------------------------------------------------------------

/// Frame filled with a diagonal ramp that covers the whole sample range.
pub fn ramp_frame(format: PixelFormat, w: u32, h: u32) -> Frame {
    let mut frame = Frame::new(format, w, h).unwrap();
    let max = (1u32 << format.descriptor().bit_depth) - 1;
    match frame.planes_mut() {
        FramePlanes::U8(planes) => {
            for (i, p) in planes.iter_mut().enumerate() {
                for y in 0..p.height() {
                    for (x, v) in p.row_mut(y).iter_mut().enumerate() {
                        *v = ((x * 7 + y * 3 + i * 50) as u32 % (max + 1)) as u8;
                    }
                }
            }
        }
        FramePlanes::U16(planes) => {
            for (i, p) in planes.iter_mut().enumerate() {
                for y in 0..p.height() {
                    for (x, v) in p.row_mut(y).iter_mut().enumerate() {
                        *v = ((x * 31 + y * 17 + i * 300) as u32 % (max + 1)) as u16;
                    }
                }
            }
        }
    }
    frame
}

/// Lag-2 model with luma and both chroma planes.
pub fn moderate_grain() -> AomFilmGrain {
    let mut g = AomFilmGrain {
        num_y_points: 3,
        num_uv_points: [2, 2],
        scaling_shift: 10,
        ar_coeff_lag: 2,
        ar_coeff_shift: 7,
        grain_scale_shift: 0,
        uv_mult: [-40, 20],
        uv_mult_luma: [100, 80],
        uv_offset: [10, -30],
        overlap_flag: true,
        limit_output_range: false,
        ..AomFilmGrain::default()
    };
    g.y_points[..3].copy_from_slice(&[[0, 40], [128, 90], [255, 60]]);
    g.uv_points[0][..2].copy_from_slice(&[[16, 50], [240, 70]]);
    g.uv_points[1][..2].copy_from_slice(&[[0, 80], [200, 30]]);
    for (i, c) in g.ar_coeffs_y.iter_mut().take(12).enumerate() {
        *c = (i as i8 - 6) * 4;
    }
    for (i, c) in g.ar_coeffs_uv[0].iter_mut().take(13).enumerate() {
        *c = 12 - i as i8 * 2;
    }
    for (i, c) in g.ar_coeffs_uv[1].iter_mut().take(13).enumerate() {
        *c = i as i8 * 3 - 20;
    }
    g
}

/// 4:2:0 set restricted to `w` x `h` at `bit_depth`.
pub fn set_420(grain: AomFilmGrain, seed: u16, w: u32, h: u32, bit_depth: u8) -> FilmGrainParams {
    let mut p = FilmGrainParams::aom(grain, seed);
    p.width = w;
    p.height = h;
    p.subsampling_x = 1;
    p.subsampling_y = 1;
    p.bit_depth_luma = bit_depth;
    p.bit_depth_chroma = bit_depth;
    p
}

// ---------------------------------------------------------------------------
// Digests
// ---------------------------------------------------------------------------

/// SHA-256 over every sample of every plane, little endian.
pub fn frame_digest(frame: &Frame) -> String {
    let mut hasher = Sha256::new();
    match frame.planes() {
        FramePlanes::U8(planes) => {
            for row in planes.iter().flat_map(|p| p.rows()) {
                hasher.update(row);
            }
        }
        FramePlanes::U16(planes) => {
            for row in planes.iter().flat_map(|p| p.rows()) {
                for v in row {
                    hasher.update(v.to_le_bytes());
                }
            }
        }
    }
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

// ---------------------------------------------------------------------------
// AFGS1 encoder
// ---------------------------------------------------------------------------

type Recorder = BitRecorder<u32, BigEndian>;

/// Points as 8-bit increments and 8-bit strengths.
fn write_points(w: &mut Recorder, points: &[[u8; 2]]) -> io::Result<()> {
    w.write(3, 7u32)?;
    w.write(2, 3u32)?;
    let mut prev = 0u8;
    for p in points {
        w.write(8, u32::from(p[0] - prev))?;
        w.write(8, u32::from(p[1]))?;
        prev = p[0];
    }
    Ok(())
}

fn write_coeffs(w: &mut Recorder, coeffs: &[i8]) -> io::Result<()> {
    w.write(2, 3u32)?;
    for &c in coeffs {
        w.write(8, (i32::from(c) + 128) as u32)?;
    }
    Ok(())
}

/// Fully transmitted set: explicit points, 8-bit AR coefficients, 4:2:0 or
/// the set's subsampling, bit depth when the set names one.
fn encode_set(params: &FilmGrainParams) -> io::Result<Recorder> {
    let aom = params.aom_params().cloned().unwrap_or_default();
    let mut w = Recorder::new();
    w.write_bit(true)?;
    w.write(16, u32::from(params.seed))?;
    w.write_bit(true)?;

    w.write(4, 0u32)?;
    w.write(12, params.width)?;
    w.write(12, params.height)?;
    w.write_bit(false)?;
    w.write(
        2,
        u32::from(params.subsampling_x) | u32::from(params.subsampling_y) << 1,
    )?;
    if params.bit_depth_luma >= 8 {
        w.write_bit(true)?;
        w.write(3, u32::from(params.bit_depth_luma - 8))?;
        w.write_bit(false)?;
    } else {
        w.write_bit(false)?;
    }
    w.write_bit(false)?; // predict_scaling

    w.write(4, u32::from(aom.num_y_points))?;
    if aom.num_y_points > 0 {
        write_points(&mut w, aom.y_points())?;
    }
    w.write_bit(aom.chroma_scaling_from_luma)?;
    if !aom.chroma_scaling_from_luma {
        for uv in 0..2 {
            w.write(4, u32::from(aom.num_uv_points[uv]))?;
            write_points_with_offset(&mut w, aom.uv_points(uv))?;
        }
    }

    w.write(2, u32::from(aom.scaling_shift - 8))?;
    w.write(2, u32::from(aom.ar_coeff_lag))?;
    let taps = aom.num_pos_luma();
    if aom.num_y_points > 0 {
        write_coeffs(&mut w, &aom.ar_coeffs_y[..taps])?;
    }
    let uv_taps = taps + usize::from(aom.num_y_points > 0);
    for uv in 0..2 {
        if aom.chroma_scaling_from_luma || aom.num_uv_points[uv] > 0 {
            write_coeffs(&mut w, &aom.ar_coeffs_uv[uv][..uv_taps])?;
        }
    }
    w.write(2, u32::from(aom.ar_coeff_shift - 6))?;
    w.write(2, u32::from(aom.grain_scale_shift))?;
    for uv in 0..2 {
        if aom.num_uv_points[uv] > 0 {
            w.write(8, (aom.uv_mult[uv] + 128) as u32)?;
            w.write(8, (aom.uv_mult_luma[uv] + 128) as u32)?;
            w.write(9, (aom.uv_offset[uv] + 256) as u32)?;
        }
    }
    w.write_bit(aom.overlap_flag)?;
    w.write_bit(aom.limit_output_range)?;
    Ok(w)
}

/// Chroma point list: same as luma plus a zero strength offset.
fn write_points_with_offset(w: &mut Recorder, points: &[[u8; 2]]) -> io::Result<()> {
    w.write(3, 7u32)?;
    w.write(2, 3u32)?;
    w.write(8, 0u32)?;
    let mut prev = 0u8;
    for p in points {
        w.write(8, u32::from(p[0] - prev))?;
        w.write(8, u32::from(p[1]))?;
        prev = p[0];
    }
    Ok(())
}

/// Set that keeps its stored model and only changes the seed.
fn encode_seed_update(seed: u16) -> io::Result<Recorder> {
    let mut w = Recorder::new();
    w.write_bit(true)?;
    w.write(16, u32::from(seed))?;
    w.write_bit(false)?;
    Ok(w)
}

fn encode_payload(sets: &[(u8, Recorder)]) -> io::Result<Vec<u8>> {
    let mut w = BitWriter::endian(Vec::new(), BigEndian);
    w.write_bit(true)?;
    w.write(4, 0u32)?;
    w.write(3, sets.len() as u32 - 1)?;
    for (idx, body) in sets {
        let bits = 1 + 8 + 3 + body.written();
        let size = bits.div_ceil(8);
        w.write_bit(false)?;
        w.write(8, size)?;
        w.write(3, u32::from(*idx))?;
        body.playback(&mut w)?;
        for _ in bits..size * 8 {
            w.write_bit(false)?;
        }
    }
    w.byte_align()?;
    Ok(w.into_writer())
}

/// AFGS1 payload transmitting every `(index, set)` in full.
pub fn encode_afgs1(sets: &[(u8, &FilmGrainParams)]) -> Vec<u8> {
    let bodies = sets
        .iter()
        .map(|&(idx, params)| Ok((idx, encode_set(params)?)))
        .collect::<io::Result<Vec<_>>>()
        .unwrap();
    encode_payload(&bodies).unwrap()
}

/// AFGS1 payload giving set `idx` a new seed.
pub fn encode_afgs1_seed_update(idx: u8, seed: u16) -> Vec<u8> {
    encode_payload(&[(idx, encode_seed_update(seed).unwrap())]).unwrap()
}

/// Wraps an AFGS1 payload in a T.35 message.
pub fn wrap_t35(afgs1: &[u8]) -> Vec<u8> {
    let mut msg = T35_AFGS1_HEADER.to_vec();
    msg.extend_from_slice(afgs1);
    msg
}
