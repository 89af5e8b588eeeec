//! AFGS1 dump command
//!
//! Prints the film grain sets of one payload as YAML or JSON.

use crate::ParseArgs;
use tracing::{info, trace};
use anyhow::{Context, Result};
use grain_bitstream::parse_film_grain_sets;
use grain_core::FilmGrainParams;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Serialize)]
struct SetsDoc<'a> {
    enable: bool,
    sets: BTreeMap<usize, &'a FilmGrainParams>,
}

pub fn run(args: ParseArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), t35 = args.t35, "parse::run");

    let data = super::read_payload(&args.input)?;
    let payload = if args.t35 {
        super::afgs1_body(&data)?
    } else {
        &data[..]
    };
    let sets = parse_film_grain_sets(payload)
        .with_context(|| format!("Invalid AFGS1 payload: {}", args.input.display()))?;

    info!(enable = sets.enable, active = sets.active_sets().count(), "Parsed film grain sets");

    if verbose > 0 {
        for (idx, set) in sets.active_sets() {
            eprintln!(
                "set {}: seed {} max {}x{} subsampling {}x{}",
                idx, set.seed, set.width, set.height, set.subsampling_x, set.subsampling_y
            );
        }
    }

    let doc = SetsDoc {
        enable: sets.enable,
        sets: if args.all {
            sets.sets.iter().enumerate().collect()
        } else {
            sets.active_sets().collect()
        },
    };
    print!("{}", super::render(&doc, args.json)?);
    Ok(())
}
