use serde::{Deserialize, Serialize};

/// Progress of the one-shot protocol bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u64)]
pub enum BootstrapState {
    /// Nothing built yet. Seeds not chosen.
    Idle = 0,
    /// Bootstrap transaction accepted; protocol-params, origin-node and
    /// issuance-template singletons minted.
    ParamsMinted = 1,
    /// Custody base/global reference-script outputs visible on the ledger.
    CustodyDeployed = 2,
    /// Deployment parameters fixed.
    Sealed = 3,
}

impl BootstrapState {
    pub fn from_u64(v: u64) -> Option<Self> {
        match v {
            0 => Some(Self::Idle),
            1 => Some(Self::ParamsMinted),
            2 => Some(Self::CustodyDeployed),
            3 => Some(Self::Sealed),
            _ => None,
        }
    }

    pub fn as_u64(self) -> u64 {
        self as u64
    }

    /// The only state this one may advance to.
    pub fn successor(self) -> Option<Self> {
        Self::from_u64(self.as_u64() + 1)
    }

    pub fn is_sealed(self) -> bool {
        matches!(self, Self::Sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        for v in 0..=3 {
            let state = BootstrapState::from_u64(v).unwrap();
            assert_eq!(state.as_u64(), v);
        }
        assert!(BootstrapState::from_u64(4).is_none());
    }

    #[test]
    fn successors_are_linear() {
        assert_eq!(
            BootstrapState::Idle.successor(),
            Some(BootstrapState::ParamsMinted)
        );
        assert_eq!(
            BootstrapState::ParamsMinted.successor(),
            Some(BootstrapState::CustodyDeployed)
        );
        assert_eq!(
            BootstrapState::CustodyDeployed.successor(),
            Some(BootstrapState::Sealed)
        );
        assert_eq!(BootstrapState::Sealed.successor(), None);
        assert!(BootstrapState::Sealed.is_sealed());
    }
}
