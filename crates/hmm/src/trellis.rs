//! Dense storage for forward variables.

/// Row-major `rows x nr_states` matrix that grows one row per block.
#[derive(Debug, Clone, Default)]
pub(crate) struct Trellis {
    values: Vec<f64>,
    nr_states: usize,
}

impl Trellis {
    /// Empties the trellis and sets the row width.
    pub(crate) fn reset(&mut self, nr_states: usize) {
        self.values.clear();
        self.nr_states = nr_states;
    }

    pub(crate) fn clear(&mut self) {
        self.values.clear();
    }

    pub(crate) fn nr_rows(&self) -> usize {
        if self.nr_states == 0 {
            0
        } else {
            self.values.len() / self.nr_states
        }
    }

    /// Appends a row; `row.len()` must equal the row width.
    pub(crate) fn push_row(&mut self, row: &[f64]) {
        debug_assert_eq!(row.len(), self.nr_states);
        self.values.extend_from_slice(row);
    }

    pub(crate) fn row(&self, t: usize) -> &[f64] {
        &self.values[t * self.nr_states..(t + 1) * self.nr_states]
    }

    pub(crate) fn row_mut(&mut self, t: usize) -> &mut [f64] {
        &mut self.values[t * self.nr_states..(t + 1) * self.nr_states]
    }
}
