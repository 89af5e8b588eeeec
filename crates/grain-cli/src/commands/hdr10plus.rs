//! HDR10+ dump command

use crate::Hdr10PlusArgs;
use tracing::trace;
use anyhow::{Context, Result, bail};
use grain_bitstream::hdr10plus::DynamicHdrPlus;
use grain_bitstream::{T35Payload, split_t35};

pub fn run(args: Hdr10PlusArgs, verbose: u8) -> Result<()> {
    trace!(input = %args.input.display(), t35 = args.t35, "hdr10plus::run");

    let data = super::read_payload(&args.input)?;
    let body = if args.t35 {
        match split_t35(&data).context("Invalid T.35 header")? {
            T35Payload::HdrPlus(body) => body,
            _ => bail!("Not an HDR10+ T.35 payload: {}", args.input.display()),
        }
    } else {
        &data[..]
    };

    let meta = DynamicHdrPlus::parse(body)
        .with_context(|| format!("Invalid HDR10+ metadata: {}", args.input.display()))?;

    if verbose > 0 {
        eprintln!(
            "{} window(s), targeted max luminance {} nits",
            meta.windows.len(),
            meta.targeted_system_display_maximum_luminance
        );
    }

    print!("{}", super::render(&meta, args.json)?);
    Ok(())
}
