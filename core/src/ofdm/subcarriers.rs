use crate::prelude::{DspError, DspResult};

/// Role of a single subcarrier within an OFDM symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubcarrierType {
    Null,
    Pilot,
    Data,
}

/// Number of enabled subcarriers between pilots in the default allocation.
const PILOT_SPACING: usize = 8;

/// Centered frequency index for FFT bin `i` of an `m`-point symbol
/// (bin 0 is DC, the upper half holds negative frequencies).
fn centered_index(i: usize, m: usize) -> isize {
    if i < m / 2 {
        i as isize
    } else {
        i as isize - m as isize
    }
}

/// Builds the default subcarrier allocation: DC nulled, roughly ten percent
/// of the band nulled as a guard on each edge, every eighth enabled
/// subcarrier a pilot and the rest data.
pub fn default_allocation(m: usize) -> DspResult<Vec<SubcarrierType>> {
    validate_size(m)?;
    let guard = m / 10;
    let limit = (m / 2 - guard) as isize;

    let mut enabled_seen = 0usize;
    let mut allocation = Vec::with_capacity(m);
    for i in 0..m {
        let k = centered_index(i, m);
        if k == 0 || k.abs() >= limit {
            allocation.push(SubcarrierType::Null);
        } else if enabled_seen % PILOT_SPACING == 0 {
            allocation.push(SubcarrierType::Pilot);
            enabled_seen += 1;
        } else {
            allocation.push(SubcarrierType::Data);
            enabled_seen += 1;
        }
    }
    validate_allocation(&allocation)?;
    Ok(allocation)
}

/// Counts (null, pilot, data) subcarriers in an allocation.
pub fn count_types(allocation: &[SubcarrierType]) -> (usize, usize, usize) {
    let mut counts = (0, 0, 0);
    for sc in allocation {
        match sc {
            SubcarrierType::Null => counts.0 += 1,
            SubcarrierType::Pilot => counts.1 += 1,
            SubcarrierType::Data => counts.2 += 1,
        }
    }
    counts
}

pub fn validate_size(m: usize) -> DspResult<()> {
    if m < 8 || !m.is_power_of_two() {
        return Err(DspError::InvalidParameter(format!(
            "subcarrier count {m} must be a power of two of at least 8"
        )));
    }
    Ok(())
}

pub fn validate_allocation(allocation: &[SubcarrierType]) -> DspResult<()> {
    validate_size(allocation.len())?;
    let (_, _, data) = count_types(allocation);
    if data == 0 {
        return Err(DspError::InvalidParameter(
            "subcarrier allocation carries no data subcarriers".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_allocation_covers_all_roles() {
        let allocation = default_allocation(64).unwrap();
        let (null, pilot, data) = count_types(&allocation);
        assert_eq!(null + pilot + data, 64);
        assert!(null >= 1, "DC must be nulled");
        assert!(pilot >= 2);
        assert!(data > pilot);
        assert_eq!(allocation[0], SubcarrierType::Null);
    }

    #[test]
    fn default_allocation_is_guarded_at_band_edges() {
        let allocation = default_allocation(64).unwrap();
        // bins nearest the Nyquist edge sit in the guard band
        assert_eq!(allocation[31], SubcarrierType::Null);
        assert_eq!(allocation[32], SubcarrierType::Null);
        assert_eq!(allocation[33], SubcarrierType::Null);
    }

    #[test]
    fn sixty_four_point_split_is_stable() {
        // 6-bin guards plus DC leave 50 enabled carriers; every eighth
        // is a pilot
        let allocation = default_allocation(64).unwrap();
        let (null, pilot, data) = count_types(&allocation);
        assert_eq!(null, 14);
        assert_eq!(pilot, 7);
        assert_eq!(data, 43);
    }

    #[test]
    fn smallest_size_still_yields_data() {
        let allocation = default_allocation(8).unwrap();
        let (_, _, data) = count_types(&allocation);
        assert!(data >= 1);
    }

    #[test]
    fn rejects_non_power_of_two_sizes() {
        assert!(default_allocation(48).is_err());
        assert!(default_allocation(4).is_err());
    }
}
