//! Apply command
//!
//! Reads raw frames, attaches the grain parameter sets to each one, lets the
//! synthesizer pick the best fitting set and writes the grained frames.

use crate::ApplyArgs;
use tracing::{debug, info, trace, warn};
use anyhow::{Context, Result, bail};
use grain_bitstream::parse_film_grain_sets;
use grain_core::io::{read_raw_frame, write_raw_frame};
use grain_core::{ColorProperties, ColorRange, FilmGrainParams, MatrixCoefficients, PixelFormat};
use grain_synth::{FilmGrainSynthesizer, SynthOptions};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Loads and validates parameter sets from YAML: one set or a list of sets.
pub fn load_yaml_sets(path: &Path) -> Result<Vec<FilmGrainParams>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read: {}", path.display()))?;
    let sets = match serde_yaml::from_str::<Vec<FilmGrainParams>>(&text) {
        Ok(sets) => sets,
        Err(_) => vec![
            serde_yaml::from_str::<FilmGrainParams>(&text)
                .with_context(|| format!("Invalid grain parameters: {}", path.display()))?,
        ],
    };
    for (i, set) in sets.iter().enumerate() {
        if let Some(aom) = set.aom_params() {
            aom.validate()
                .with_context(|| format!("Invalid grain parameter set {} in {}", i, path.display()))?;
        }
    }
    Ok(sets)
}

/// Gives AOM sets left at 4:4:4 the chroma subsampling of `format`.
///
/// Every frame of a run shares one format, so a 4:4:4 set would never be
/// selected for subsampled input.
fn fit_subsampling(sets: &mut [FilmGrainParams], format: PixelFormat) {
    let desc = format.descriptor();
    if desc.log2_chroma_w == 0 && desc.log2_chroma_h == 0 {
        return;
    }
    for (i, set) in sets.iter_mut().enumerate() {
        if set.aom_params().is_some() && set.subsampling_x == 0 && set.subsampling_y == 0 {
            set.subsampling_x = desc.log2_chroma_w as u8;
            set.subsampling_y = desc.log2_chroma_h as u8;
            debug!(set = i, %format, "set subsampling taken from input format");
        }
    }
}

/// Loads the active sets of an AFGS1 payload.
fn load_afgs1_sets(path: &Path, t35: bool) -> Result<Vec<FilmGrainParams>> {
    let data = super::read_payload(path)?;
    let payload = if t35 { super::afgs1_body(&data)? } else { &data[..] };
    let sets = parse_film_grain_sets(payload)
        .with_context(|| format!("Invalid AFGS1 payload: {}", path.display()))?;
    if !sets.enable {
        warn!(path = %path.display(), "AFGS1 payload disables film grain");
        return Ok(Vec::new());
    }
    Ok(sets.active_sets().map(|(_, set)| set.clone()).collect())
}

pub fn run(args: ApplyArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), format = %args.format, width = args.width, height = args.height, "apply::run");

    let format: PixelFormat = args
        .format
        .parse()
        .with_context(|| format!("Unknown pixel format: {}", args.format))?;

    let sets = match (&args.params, &args.afgs1) {
        (Some(path), _) => {
            let mut sets = load_yaml_sets(path)?;
            fit_subsampling(&mut sets, format);
            sets
        }
        (None, Some(path)) => load_afgs1_sets(path, args.t35)?,
        (None, None) => bail!("Either --params or --afgs1 is required"),
    };
    info!(sets = sets.len(), %format, "Loaded grain parameters");

    let color = ColorProperties {
        range: if args.full_range || format.is_full_range() {
            ColorRange::Full
        } else {
            ColorRange::Limited
        },
        matrix: if args.rgb {
            MatrixCoefficients::RGB
        } else {
            MatrixCoefficients::UNSPECIFIED
        },
        ..ColorProperties::default()
    };

    let synth = FilmGrainSynthesizer::new(SynthOptions {
        parallel: !args.no_parallel,
        passthrough_on_unsupported: !args.strict,
    });

    let input = File::open(&args.input)
        .with_context(|| format!("Failed to open: {}", args.input.display()))?;
    let output = File::create(&args.output)
        .with_context(|| format!("Failed to create: {}", args.output.display()))?;
    let mut reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);

    let mut count = 0usize;
    while args.frames.is_none_or(|n| count < n) {
        let Some(mut frame) = read_raw_frame(&mut reader, format, args.width, args.height)
            .with_context(|| format!("Failed to read frame {}", count))?
        else {
            break;
        };
        frame.set_color(color);
        for set in &sets {
            let mut set = set.clone();
            if args.animate {
                set.seed = set.seed.wrapping_add(count as u16);
            }
            frame.add_film_grain_params(set)?;
        }

        let grained = synth
            .synthesize(&frame)
            .with_context(|| format!("Failed to apply grain to frame {}", count))?;
        write_raw_frame(&mut writer, &grained)
            .with_context(|| format!("Failed to write frame {}", count))?;
        count += 1;
        debug!(frame = count, "frame done");
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write: {}", args.output.display()))?;

    info!(frames = count, output = %args.output.display(), "Applied film grain");
    if verbose > 0 {
        println!("Wrote {} frame(s) to {}", count, args.output.display());
    }
    Ok(())
}
