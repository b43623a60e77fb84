//! Mapping from hidden states to emission components.

use crate::error::HmmError;

/// Assigns each hidden state one emission component per data dimension.
///
/// Under the "combinations" scheme there are `P^D` states for `P` components
/// and `D` dimensions, and state `x` uses component `d`-th base-`P` digit of
/// `x` (least significant first) for dimension `d`. Components are shared
/// across dimensions.
///
/// ```rust
/// use wavehmm_hmm::Mapping;
///
/// let m = Mapping::combinations(2, 2).unwrap();
/// assert_eq!(m.nr_states(), 4);
/// assert_eq!(m.components(1), &[1, 0]);
/// assert_eq!(m.components(2), &[0, 1]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    nr_components: usize,
    nr_dim: usize,
    // nr_states * nr_dim, row-major by state
    table: Vec<usize>,
}

impl Mapping {
    /// Builds the "combinations" mapping.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`HmmError::InvalidParameter`] | `nr_components == 0` or `nr_dim == 0` |
    /// | [`HmmError::TooManyStates`] | `nr_components^nr_dim` overflows |
    /// | [`HmmError::TooFewStates`] | fewer than two states |
    pub fn combinations(nr_components: usize, nr_dim: usize) -> Result<Self, HmmError> {
        if nr_components == 0 {
            return Err(HmmError::InvalidParameter {
                name: "components",
                value: 0.0,
                reason: "must be positive",
            });
        }
        if nr_dim == 0 {
            return Err(HmmError::InvalidParameter {
                name: "dimensions",
                value: 0.0,
                reason: "must be positive",
            });
        }
        let too_many = HmmError::TooManyStates {
            components: nr_components,
            nr_dim,
        };
        let exp = u32::try_from(nr_dim).map_err(|_| too_many.clone())?;
        let nr_states = nr_components.checked_pow(exp).ok_or(too_many)?;
        if nr_states < 2 {
            return Err(HmmError::TooFewStates {
                components: nr_components,
                nr_dim,
                states: nr_states,
            });
        }

        let mut table = Vec::with_capacity(nr_states * nr_dim);
        for state in 0..nr_states {
            let mut n = state;
            for _ in 0..nr_dim {
                table.push(n % nr_components);
                n /= nr_components;
            }
        }
        Ok(Self {
            nr_components,
            nr_dim,
            table,
        })
    }

    /// Number of hidden states.
    pub fn nr_states(&self) -> usize {
        self.table.len() / self.nr_dim
    }

    /// Number of emission components.
    pub fn nr_components(&self) -> usize {
        self.nr_components
    }

    /// Number of data dimensions.
    pub fn nr_dim(&self) -> usize {
        self.nr_dim
    }

    /// Emission component per dimension for `state`.
    ///
    /// # Panics
    ///
    /// Panics if `state >= nr_states()`.
    pub fn components(&self, state: usize) -> &[usize] {
        &self.table[state * self.nr_dim..(state + 1) * self.nr_dim]
    }
}
