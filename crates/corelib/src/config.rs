//! Runtime configuration for a ring: successor-list size and maintenance
//! timing. `m` (the bit-width of the identifier space) is deliberately not
//! here: it is a compile-time constant (see [`crate::ident::M`]) because
//! the finger table length and the wire handle encoding both depend on it.

use std::time::Duration;

/// Tunable knobs for a [`crate::ring::Ring`].
///
/// Deserializable so an operator can load it from a config file; the CLI
/// falls back to [`RingConfig::default`] otherwise.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RingConfig {
    /// `r`: number of cached successors kept per node for failure
    /// resilience. Default 3, matching the reference design.
    pub successor_list_len: usize,
    /// How often `stabilize` runs on each live node.
    #[serde(with = "humantime_serde_compat")]
    pub stabilize_period: Duration,
    /// How often `fix_fingers` runs on each live node.
    #[serde(with = "humantime_serde_compat")]
    pub fix_fingers_period: Duration,
    /// How often `check_predecessor` runs on each live node.
    #[serde(with = "humantime_serde_compat")]
    pub check_predecessor_period: Duration,
    /// Deadline applied to every outbound RPC.
    #[serde(with = "humantime_serde_compat")]
    pub rpc_timeout: Duration,
}

impl Default for RingConfig {
    fn default() -> Self {
        Self {
            successor_list_len: 3,
            stabilize_period: Duration::from_millis(500),
            fix_fingers_period: Duration::from_millis(750),
            check_predecessor_period: Duration::from_millis(1000),
            rpc_timeout: Duration::from_millis(200),
        }
    }
}

/// Minimal millisecond (de)serialization for `Duration`, avoiding a pull on
/// an external humantime crate for a single field shape.
mod humantime_serde_compat {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        d.as_millis().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}
