//! Slot counts for the probe tables.
//!
//! Tables are sized to primes roughly doubling from one another, which keeps
//! `hash % capacity` from clustering on hashes that share low bits.

const PRIMES: [u64; 60] = [
    53,
    97,
    191,
    383,
    769,
    1531,
    3067,
    6143,
    12289,
    24571,
    49157,
    98299,
    196613,
    393209,
    786431,
    1572869,
    3145721,
    6291449,
    12582917,
    25165813,
    50331653,
    100663291,
    201326611,
    402653189,
    805306357,
    1610612741,
    3221225473,
    6442450939,
    12884901893,
    25769803799,
    51539607551,
    103079215111,
    206158430209,
    412316860441,
    824633720831,
    1649267441651,
    3298534883309,
    6597069766657,
    13194139533299,
    26388279066623,
    52776558133303,
    105553116266489,
    211106232532969,
    422212465066001,
    844424930131963,
    1688849860263953,
    3377699720527861,
    6755399441055731,
    13510798882111483,
    27021597764222939,
    54043195528445957,
    108086391056891903,
    216172782113783773,
    432345564227567621,
    864691128455135207,
    1729382256910270481,
    3458764513820540933,
    6917529027641081903,
    13835058055282163729,
    18446744073709551557,
];

/// Smallest table prime `>= required`, or `required` itself once past the
/// end of the table (or past what `usize` can hold on this target).
pub(crate) fn round_up(required: usize) -> usize {
    PRIMES
        .iter()
        .find(|&&p| p >= required as u64)
        .and_then(|&p| usize::try_from(p).ok())
        .unwrap_or(required)
}

/// Slot count needed to hold `elements` under `load`.
pub(crate) fn slots_for(elements: usize, load: f64) -> usize {
    round_up((elements as f64 / load).ceil() as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_up_picks_next_prime() {
        assert_eq!(round_up(0), 53);
        assert_eq!(round_up(53), 53);
        assert_eq!(round_up(54), 97);
        assert_eq!(round_up(1000), 1531);
    }

    #[test]
    fn slots_for_divides_by_load() {
        // 40 / 0.5 = 80 -> 97
        assert_eq!(slots_for(40, 0.5), 97);
        // 54 / 0.75 = 72 -> 97
        assert_eq!(slots_for(54, 0.75), 97);
    }

    #[test]
    fn primes_are_increasing() {
        assert!(PRIMES.windows(2).all(|w| w[0] < w[1]));
    }
}
