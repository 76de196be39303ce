//! Weight ratio reduction.
//!
//! Raw bandwidth figures (say 100, 50 and 25 Mbps) are reduced to the
//! smallest integer ratio before they drive discrete partitioning, so a
//! weighted classifier emits 4+2+1 rules instead of 175.
//!
//! # Example
//!
//! ```
//! use roswan::weights::normalize;
//!
//! assert_eq!(normalize(&[100, 50, 25]).unwrap(), vec![4, 2, 1]);
//! ```

use crate::error::{Error, Result};

/// Reduce a weight list to its smallest integer ratio.
///
/// Divides every entry by the greatest common divisor of the whole list.
/// Individual zeros are allowed and stay zero; an empty list or an
/// all-zero list is a configuration error, never a division by zero.
pub fn normalize(weights: &[u32]) -> Result<Vec<u32>> {
    if weights.is_empty() {
        return Err(Error::EmptyWeights);
    }
    let divisor = weights.iter().copied().fold(0, gcd);
    if divisor == 0 {
        return Err(Error::AllZeroWeights);
    }
    Ok(weights.iter().map(|w| w / divisor).collect())
}

const fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}
