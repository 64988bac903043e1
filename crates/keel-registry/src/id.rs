//! Package identities.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name under which the host runtime shows up in registries and compat tables.
pub const RUNTIME_NAME: &str = "julia";

/// Stable identity of a package, a 128-bit UUID.
///
/// One value is reserved: [`PackageId::RUNTIME`] identifies the host runtime itself.
/// The runtime is not a real package of any registry. It appears in compat tables by
/// name, and when a deps table names it the entry resolves to this sentinel rather
/// than to whatever UUID token was written next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(Uuid);

impl PackageId {
    /// The host runtime's well-known identity.
    pub const RUNTIME: PackageId =
        PackageId(Uuid::from_u128(0x1222c4b2_2114_5bfd_aeef_88e4692bbb3e));

    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    pub fn is_runtime(&self) -> bool {
        *self == Self::RUNTIME
    }
}

impl From<Uuid> for PackageId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl FromStr for PackageId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let id: PackageId = "7876AF07-990D-54B4-AB0E-23690620F79A".parse().unwrap();
        assert_eq!(id.to_string(), "7876af07-990d-54b4-ab0e-23690620f79a");
        assert!(!id.is_runtime());
        assert!("not-a-uuid".parse::<PackageId>().is_err());
    }

    #[test]
    fn test_runtime_sentinel() {
        let id: PackageId = "1222c4b2-2114-5bfd-aeef-88e4692bbb3e".parse().unwrap();
        assert!(id.is_runtime());
        assert_eq!(id, PackageId::RUNTIME);
    }
}
