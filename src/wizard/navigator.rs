use super::validation::ValidationErrors;

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepMove {
    /// Now on the given 1-indexed step.
    Moved(usize),
    /// Last step validated; the caller should ask for submit confirmation.
    ReadyToSubmit,
    /// The current step has this many failing keys.
    Blocked(usize),
    /// Already on the first step.
    AtFirstStep,
}

/// Tracks the current step and gates forward moves on validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepNavigator {
    current: usize,
    total: usize,
}

impl StepNavigator {
    pub fn new(total: usize) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_last(&self) -> bool {
        self.current == self.total
    }

    /// Moves forward only when `step_errors` (a fresh validation of the
    /// current step) is empty.
    pub fn go_next(&mut self, step_errors: &ValidationErrors) -> StepMove {
        if !step_errors.is_empty() {
            return StepMove::Blocked(step_errors.len());
        }
        if self.is_last() {
            return StepMove::ReadyToSubmit;
        }
        self.current += 1;
        StepMove::Moved(self.current)
    }

    /// Moving backward is always allowed and never validates.
    pub fn go_back(&mut self) -> StepMove {
        if self.current <= 1 {
            return StepMove::AtFirstStep;
        }
        self.current -= 1;
        StepMove::Moved(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_is_gated_by_errors() {
        let mut nav = StepNavigator::new(2);
        let mut errors = ValidationErrors::new();
        errors.insert("fullName", "Full name is required");

        assert_eq!(nav.go_next(&errors), StepMove::Blocked(1));
        assert_eq!(nav.current(), 1);

        assert_eq!(nav.go_next(&ValidationErrors::new()), StepMove::Moved(2));
        assert_eq!(nav.go_next(&ValidationErrors::new()), StepMove::ReadyToSubmit);
        assert_eq!(nav.current(), 2);
    }

    #[test]
    fn back_is_floored_at_first_step() {
        let mut nav = StepNavigator::new(3);
        assert_eq!(nav.go_back(), StepMove::AtFirstStep);
        nav.go_next(&ValidationErrors::new());
        nav.go_next(&ValidationErrors::new());
        assert_eq!(nav.go_back(), StepMove::Moved(2));
        assert_eq!(nav.go_back(), StepMove::Moved(1));
        assert_eq!(nav.go_back(), StepMove::AtFirstStep);
    }

    #[test]
    fn zero_steps_still_has_one_page() {
        let nav = StepNavigator::new(0);
        assert_eq!(nav.total(), 1);
        assert!(nav.is_last());
    }
}
