use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};

use canny_image::{Image, ImageError};

use crate::parallel::{self, ExecutionStrategy};
use crate::threshold::EdgeClass;

/// Value written into the final edge map for edge pixels.
pub const EDGE: u8 = 255;

/// Value written into the final edge map for everything else.
pub const NON_EDGE: u8 = 0;

/// The algorithm used to link weak pixels to strong ones.
///
/// Both modes give the same edge map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HysteresisMode {
    /// Repeated data-parallel passes over the whole image until no pixel changes.
    #[default]
    Relaxation,
    /// Sequential propagation from a stack seeded with every strong pixel.
    Worklist,
}

const NEIGHBORS_8: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Iterate over the in-bounds 8-neighbors of `(x, y)` as flat indices.
fn neighbors(x: usize, y: usize, cols: usize, rows: usize) -> impl Iterator<Item = usize> {
    NEIGHBORS_8.iter().filter_map(move |&(dx, dy)| {
        let nx = x.checked_add_signed(dx).filter(|&nx| nx < cols)?;
        let ny = y.checked_add_signed(dy).filter(|&ny| ny < rows)?;
        Some(ny * cols + nx)
    })
}

fn check_same_size(src: &Image<u8, 1>, dst: &Image<u8, 1>) -> Result<(), ImageError> {
    if src.size() != dst.size() {
        return Err(ImageError::InvalidImageSize(
            src.cols(),
            src.rows(),
            dst.cols(),
            dst.rows(),
        ));
    }
    Ok(())
}

/// Resolve a classified map into the final edge map.
///
/// Every strong pixel becomes an edge, and so does every weak pixel that is
/// 8-connected to a strong pixel through weak pixels. Everything else is
/// written as [`NON_EDGE`].
///
/// # Arguments
///
/// * `classified` - The map produced by [`crate::threshold::classify`].
/// * `dst` - The edge map, holding [`EDGE`] or [`NON_EDGE`].
/// * `mode` - The linking algorithm.
/// * `strategy` - The execution strategy, used by [`HysteresisMode::Relaxation`].
pub fn hysteresis(
    classified: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    mode: HysteresisMode,
    strategy: ExecutionStrategy,
) -> Result<(), ImageError> {
    match mode {
        HysteresisMode::Relaxation => hysteresis_relaxation(classified, dst, strategy).map(|_| ()),
        HysteresisMode::Worklist => hysteresis_worklist(classified, dst),
    }
}

/// Link weak pixels by fixpoint relaxation.
///
/// Each pass reads the current labels and writes the next labels into a
/// separate buffer, promoting a weak pixel to strong when any of its
/// 8-neighbors is strong. Passes stop when one promotes nothing. Labels only
/// ever go from weak to strong, so the number of passes is bounded by the
/// number of weak pixels plus one.
///
/// Returns the number of passes performed, including the final pass that found
/// nothing to promote.
pub fn hysteresis_relaxation(
    classified: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
    strategy: ExecutionStrategy,
) -> Result<usize, ImageError> {
    check_same_size(classified, dst)?;

    let cols = classified.cols();
    let rows = classified.rows();

    let mut current = Image::from_size_val(classified.size(), NON_EDGE)?;
    current.as_slice_mut().copy_from_slice(classified.as_slice());
    let mut next = Image::from_size_val(classified.size(), NON_EDGE)?;

    let weak = EdgeClass::Weak.value();
    let strong = EdgeClass::Strong.value();
    let max_passes = classified.as_slice().iter().filter(|&&v| v == weak).count() + 1;

    let mut passes = 0;
    while passes < max_passes {
        passes += 1;
        let changed = AtomicBool::new(false);
        let labels = current.as_slice();

        parallel::iter_rows_indexed(next.as_slice_mut(), cols, strategy, |y, row| {
            for (x, out) in row.iter_mut().enumerate() {
                let label = labels[y * cols + x];
                *out = if label == weak && neighbors(x, y, cols, rows).any(|n| labels[n] == strong)
                {
                    changed.store(true, Ordering::Relaxed);
                    strong
                } else {
                    label
                };
            }
        });

        std::mem::swap(&mut current, &mut next);

        if !changed.load(Ordering::Relaxed) {
            break;
        }
    }

    log::debug!("hysteresis relaxation converged after {passes} passes");

    parallel::iter_rows_val(&current, dst, strategy, |&label, edge| {
        *edge = if label == strong { EDGE } else { NON_EDGE };
    });

    Ok(passes)
}

/// Link weak pixels with an explicit stack.
///
/// The stack starts with every strong pixel and each popped pixel pushes its
/// weak 8-neighbors that are not yet edges. Each pixel is pushed at most once.
pub fn hysteresis_worklist(
    classified: &Image<u8, 1>,
    dst: &mut Image<u8, 1>,
) -> Result<(), ImageError> {
    check_same_size(classified, dst)?;

    let cols = classified.cols();
    let rows = classified.rows();
    let labels = classified.as_slice();
    let edges = dst.as_slice_mut();

    let mut stack = Vec::new();
    for (idx, (&label, edge)) in labels.iter().zip(edges.iter_mut()).enumerate() {
        if EdgeClass::from_value(label) == EdgeClass::Strong {
            *edge = EDGE;
            stack.push(idx);
        } else {
            *edge = NON_EDGE;
        }
    }

    while let Some(idx) = stack.pop() {
        for n in neighbors(idx % cols, idx / cols, cols, rows) {
            if edges[n] == NON_EDGE && EdgeClass::from_value(labels[n]) == EdgeClass::Weak {
                edges[n] = EDGE;
                stack.push(n);
            }
        }
    }

    Ok(())
}
