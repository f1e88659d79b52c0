use crate::error::{BloomError, Result};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Parameters for [`optimize`](crate::optimize) and
/// [`Filter::optimized`](crate::Filter::optimized).
#[derive(Clone, Debug, PartialEq, Builder, Serialize, Deserialize)]
#[builder(pattern = "owned", build_fn(validate = "Self::validate"))]
pub struct FilterConfig {
    /// Expected number of distinct keys
    #[builder(default = "1_000_000")]
    pub capacity: u64,

    /// Desired upper bound on the false positive rate once `capacity`
    /// distinct keys are in, in (0, 1]
    #[builder(default = "0.01")]
    pub false_positive_rate: f64,

    /// Upper bound on the filter size in bits. `None` means no limit
    /// beyond [`MAX_BITS`](crate::MAX_BITS).
    #[builder(default = "None", setter(strip_option))]
    pub max_bits: Option<u64>,
}

fn check_rate(rate: f64) -> std::result::Result<(), String> {
    if rate > 0.0 && rate <= 1.0 {
        Ok(())
    } else {
        Err(format!(
            "False positive rate must be > 0 and <= 1, got {rate}"
        ))
    }
}

impl FilterConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        match self.false_positive_rate {
            Some(rate) => check_rate(rate),
            None => Ok(()),
        }
    }
}

impl FilterConfig {
    pub fn validate(&self) -> Result<()> {
        check_rate(self.false_positive_rate).map_err(BloomError::InvalidConfig)
    }
}
