//! Modular arithmetic over the XEP-0198 sequence space [0, 2^32).
//!
//! Counters are plain `u32`, so the modulus is the type's own overflow
//! point and every operation here is a wrapping one.

/// Advances a counter by one, wrapping `u32::MAX` back to `0`.
///
/// # Examples
/// ```
/// # use xmpp_sm_core::increment;
/// assert_eq!(increment(41), 42);
/// assert_eq!(increment(u32::MAX), 0);
/// ```
#[inline]
pub const fn increment(n: u32) -> u32 {
    n.wrapping_add(1)
}

/// How many units `a` is ahead of `b`, moving forward through the wrap point.
///
/// The result is always in [0, 2^32). A peer reporting `handled = a` when
/// we last saw `b` has confirmed `distance(a, b)` new stanzas.
///
/// # Examples
/// ```
/// # use xmpp_sm_core::distance;
/// assert_eq!(distance(7, 3), 4);
/// assert_eq!(distance(3, 3), 0);
/// assert_eq!(distance(3, 4_294_967_290), 9);
/// ```
#[inline]
pub const fn distance(a: u32, b: u32) -> u32 {
    a.wrapping_sub(b)
}
