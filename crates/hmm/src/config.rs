//! Model configuration.

use crate::error::HmmError;

/// Structural and prior settings of the hidden Markov model.
///
/// # Example
///
/// ```
/// use wavehmm_hmm::HmmConfig;
///
/// let config = HmmConfig::new()
///     .with_components(4)
///     .with_self_transitions(false);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct HmmConfig {
    components: usize,
    transition_alpha: f64,
    self_transition_alpha: f64,
    initial_alpha: f64,
    use_self_transitions: bool,
    min_block_size: usize,
}

impl HmmConfig {
    /// Creates a configuration with defaults.
    ///
    /// Defaults: 3 emission components, Jeffreys priors (0.5) for all
    /// Dirichlet concentrations, self-transitions enabled, no minimum block
    /// size for emission updates.
    pub fn new() -> Self {
        Self {
            components: 3,
            transition_alpha: 0.5,
            self_transition_alpha: 0.5,
            initial_alpha: 0.5,
            use_self_transitions: true,
            min_block_size: 0,
        }
    }

    /// Sets the number of emission components per dimension.
    pub fn with_components(mut self, components: usize) -> Self {
        self.components = components;
        self
    }

    /// Sets the off-diagonal transition concentration.
    pub fn with_transition_alpha(mut self, alpha: f64) -> Self {
        self.transition_alpha = alpha;
        self
    }

    /// Sets the diagonal (self-transition) concentration.
    pub fn with_self_transition_alpha(mut self, alpha: f64) -> Self {
        self.self_transition_alpha = alpha;
        self
    }

    /// Sets the initial-distribution concentration.
    pub fn with_initial_alpha(mut self, alpha: f64) -> Self {
        self.initial_alpha = alpha;
        self
    }

    /// Whether forward-backward sampling accounts for the self-transitions
    /// inside each block.
    pub fn with_self_transitions(mut self, enabled: bool) -> Self {
        self.use_self_transitions = enabled;
        self
    }

    /// Blocks of at most this size do not update the emission posteriors.
    pub fn with_min_block_size(mut self, size: usize) -> Self {
        self.min_block_size = size;
        self
    }

    // --- Accessors ---

    /// Number of emission components per dimension.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Off-diagonal transition concentration.
    pub fn transition_alpha(&self) -> f64 {
        self.transition_alpha
    }

    /// Diagonal transition concentration.
    pub fn self_transition_alpha(&self) -> f64 {
        self.self_transition_alpha
    }

    /// Initial-distribution concentration.
    pub fn initial_alpha(&self) -> f64 {
        self.initial_alpha
    }

    /// Whether in-block self-transitions are used.
    pub fn use_self_transitions(&self) -> bool {
        self.use_self_transitions
    }

    /// Minimum block size for emission updates.
    pub fn min_block_size(&self) -> usize {
        self.min_block_size
    }

    /// Validates this configuration.
    ///
    /// Checks that there is at least one component and that every
    /// concentration is finite and positive. Whether the components yield at
    /// least two states depends on the data dimensions and is checked when
    /// the model is built.
    pub fn validate(&self) -> Result<(), HmmError> {
        if self.components == 0 {
            return Err(HmmError::InvalidParameter {
                name: "components",
                value: 0.0,
                reason: "must be positive",
            });
        }
        for (name, value) in [
            ("transition_alpha", self.transition_alpha),
            ("self_transition_alpha", self.self_transition_alpha),
            ("initial_alpha", self.initial_alpha),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(HmmError::InvalidParameter {
                    name,
                    value,
                    reason: "must be finite and positive",
                });
            }
        }
        Ok(())
    }
}

impl Default for HmmConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = HmmConfig::new();
        assert_eq!(cfg.components(), 3);
        assert!((cfg.transition_alpha() - 0.5).abs() < f64::EPSILON);
        assert!((cfg.self_transition_alpha() - 0.5).abs() < f64::EPSILON);
        assert!((cfg.initial_alpha() - 0.5).abs() < f64::EPSILON);
        assert!(cfg.use_self_transitions());
        assert_eq!(cfg.min_block_size(), 0);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg, HmmConfig::default());
    }

    #[test]
    fn builder_chain() {
        let cfg = HmmConfig::new()
            .with_components(2)
            .with_transition_alpha(1.0)
            .with_self_transition_alpha(10.0)
            .with_initial_alpha(2.0)
            .with_self_transitions(false)
            .with_min_block_size(4);
        assert_eq!(cfg.components(), 2);
        assert!((cfg.self_transition_alpha() - 10.0).abs() < f64::EPSILON);
        assert!(!cfg.use_self_transitions());
        assert_eq!(cfg.min_block_size(), 4);
    }

    #[test]
    fn invalid_values() {
        assert!(HmmConfig::new().with_components(0).validate().is_err());
        assert!(HmmConfig::new().with_transition_alpha(0.0).validate().is_err());
        assert!(HmmConfig::new().with_initial_alpha(f64::NAN).validate().is_err());
        let err = HmmConfig::new()
            .with_self_transition_alpha(-1.0)
            .validate()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid self_transition_alpha: -1 (must be finite and positive)"
        );
    }
}
