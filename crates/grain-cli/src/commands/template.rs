//! Parameter template command
//!
//! Prints a moderate 4:2:0 grain model that `apply --params` accepts.

use crate::TemplateArgs;
use tracing::trace;
use anyhow::{Context, Result};
use grain_core::{AomFilmGrain, FilmGrainParams};

/// Medium-strength grain with a lag-2 AR model.
pub fn template_params() -> FilmGrainParams {
    let mut aom = AomFilmGrain {
        num_y_points: 4,
        num_uv_points: [2, 2],
        scaling_shift: 11,
        ar_coeff_lag: 2,
        ar_coeff_shift: 7,
        uv_mult: [-64, -64],
        uv_mult_luma: [96, 96],
        uv_offset: [0, 0],
        overlap_flag: true,
        limit_output_range: true,
        ..AomFilmGrain::default()
    };
    aom.y_points[..4].copy_from_slice(&[[0, 20], [64, 36], [160, 44], [255, 24]]);
    aom.uv_points[0][..2].copy_from_slice(&[[0, 16], [255, 24]]);
    aom.uv_points[1][..2].copy_from_slice(&[[0, 16], [255, 24]]);
    aom.ar_coeffs_y[..12].copy_from_slice(&[4, -2, 6, -3, 2, -8, 12, -10, 5, 14, 30, 18]);
    aom.ar_coeffs_uv[0][..13].copy_from_slice(&[0, 1, 2, -1, 0, 2, 4, 1, 3, 2, 10, 4, 6]);
    aom.ar_coeffs_uv[1][..13].copy_from_slice(&[0, 1, 2, -1, 0, 2, 4, 1, 3, 2, 10, 4, -6]);

    let mut params = FilmGrainParams::aom(aom, 7391);
    params.subsampling_x = 1;
    params.subsampling_y = 1;
    params
}

pub fn run(args: TemplateArgs) -> Result<()> {
    trace!(json = args.json, "template::run");

    let text = super::render(&template_params(), args.json)?;
    match &args.output {
        Some(path) => std::fs::write(path, text)
            .with_context(|| format!("Failed to write: {}", path.display()))?,
        None => print!("{}", text),
    }
    Ok(())
}
