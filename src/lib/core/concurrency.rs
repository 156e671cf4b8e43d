use crate::core::error::{DartError, Result};
use log::{error, warn};

/// Validate and normalize a requested CPU count.
pub fn determine_allowed_cpus(desired: usize) -> Result<usize> {
    if desired == 0 {
        error!("Must select > 0 threads");
        Err(DartError::Config("Too few threads selected. Min 1".to_string()))
    } else if desired > num_cpus::get() {
        warn!(
            "Specified more threads ({}) than are available ({})",
            desired,
            num_cpus::get()
        );
        Ok(desired)
    } else {
        Ok(desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_threads_rejected() {
        assert!(matches!(
            determine_allowed_cpus(0),
            Err(DartError::Config(_))
        ));
    }

    #[test]
    fn oversubscription_is_allowed() {
        let many = num_cpus::get() + 4;
        assert_eq!(determine_allowed_cpus(many).unwrap(), many);
    }
}
