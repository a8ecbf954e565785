//! Per-camera orientation correction
//!
//! Steps run in a fixed order: transpose, counter-clockwise rotation, mirror
//! horizontal, mirror vertical. Each step acts on the axes left by the
//! previous one. The spatial axes are always the last two, so the same code
//! orients a single `(rows, cols)` frame or a `(frames, rows, cols)` stack.

use ndarray::{Array, ArrayBase, ArrayView, Axis, Data, Dimension};

use crate::types::camera::Orientation;

/// Reorients a view without copying; only strides change.
pub fn orient_view<'a, A, D: Dimension>(
    mut view: ArrayView<'a, A, D>,
    orientation: &Orientation,
) -> ArrayView<'a, A, D> {
    let ndim = view.ndim();
    if ndim < 2 {
        return view;
    }
    let (rows, cols) = (ndim - 2, ndim - 1);

    if orientation.transpose {
        view.swap_axes(rows, cols);
    }

    match orientation.quarter_turns() {
        1 => {
            view.invert_axis(Axis(cols));
            view.swap_axes(rows, cols);
        }
        2 => {
            view.invert_axis(Axis(rows));
            view.invert_axis(Axis(cols));
        }
        3 => {
            view.swap_axes(rows, cols);
            view.invert_axis(Axis(cols));
        }
        _ => {}
    }

    if orientation.mirror_horizontal {
        view.invert_axis(Axis(cols));
    }
    if orientation.mirror_vertical {
        view.invert_axis(Axis(rows));
    }

    view
}

/// Returns a reoriented, standard-layout copy. The input is left untouched.
pub fn orient<A, S, D>(frames: &ArrayBase<S, D>, orientation: &Orientation) -> Array<A, D>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension,
{
    orient_view(frames.view(), orientation)
        .as_standard_layout()
        .into_owned()
}

/// Shape of a `(rows, cols)` frame after orientation.
pub fn oriented_shape(shape: (usize, usize), orientation: &Orientation) -> (usize, usize) {
    let swaps = orientation.transpose as u8 + orientation.quarter_turns() % 2;
    if swaps % 2 == 1 {
        (shape.1, shape.0)
    } else {
        shape
    }
}
