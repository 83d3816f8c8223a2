//! Load colours shared by the 2D and 3D renderers.

/// Round-robin palette, keyed by load index
pub const LOAD_PALETTE: [&str; 12] = [
    "#e6194b", "#3cb44b", "#4363d8", "#f58231", "#911eb4", "#42d4f4",
    "#f032e6", "#bfef45", "#469990", "#9a6324", "#800000", "#000075",
];

/// Colour for the `index`-th load (wraps after 12)
pub fn color_for(index: usize) -> &'static str {
    LOAD_PALETTE[index % LOAD_PALETTE.len()]
}
