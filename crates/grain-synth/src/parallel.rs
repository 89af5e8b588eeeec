//! Block row dispatch.
//!
//! Block rows of a plane only read shared, immutable inputs (grain grids,
//! scaling tables, the source frame) and write disjoint output lines, so they
//! can run in any order. When the `parallel` feature is enabled, rows are
//! spread over the rayon pool.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Calls `f(row, lines)` for every `chunk`-sample slice of `data`.
///
/// Uses rayon when `parallel` is set and the feature is enabled.
#[cfg(feature = "parallel")]
pub fn for_each_block_row<P, F>(data: &mut [P], chunk: usize, parallel: bool, f: F)
where
    P: Send,
    F: Fn(usize, &mut [P]) + Sync + Send,
{
    if chunk == 0 {
        return;
    }
    if parallel {
        data.par_chunks_mut(chunk)
            .enumerate()
            .for_each(|(row, lines)| f(row, lines));
    } else {
        data.chunks_mut(chunk)
            .enumerate()
            .for_each(|(row, lines)| f(row, lines));
    }
}

/// Calls `f(row, lines)` for every `chunk`-sample slice of `data` (single-threaded fallback).
#[cfg(not(feature = "parallel"))]
pub fn for_each_block_row<P, F>(data: &mut [P], chunk: usize, _parallel: bool, f: F)
where
    F: Fn(usize, &mut [P]),
{
    if chunk == 0 {
        return;
    }
    data.chunks_mut(chunk)
        .enumerate()
        .for_each(|(row, lines)| f(row, lines));
}
