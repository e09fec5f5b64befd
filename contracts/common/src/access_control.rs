//! Access Control Module
//!
//! Capability table for the ETHPool ledger. The ledger itself never compares
//! identities; it asks an authorizer whether a caller holds a capability.
//! `RoleTable` is the default answer to that question.
//!
//! ## Roles
//!
//! - **Admin**: grants and revokes the other capabilities
//! - **RewardAuthority**: may inject rewards
//! - **Operator**: may fund and sweep protocol-owned balance

use crate::types::Identity;
use crate::{PoolError, PoolResult, Vec};
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

// ============================================================================
// Types
// ============================================================================

/// Capabilities the ledger checks before privileged mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum Capability {
    /// Manage grants
    Admin,
    /// Inject rewards
    RewardAuthority,
    /// Fund and sweep the protocol-owned balance
    Operator,
}

/// Capability assignment for an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleAssignment {
    /// Identity holding the capability
    pub identity: Identity,
    /// Granted capability
    pub capability: Capability,
    /// Time the grant was made
    pub granted_at: u64,
    /// Identity that made the grant
    pub granted_by: Identity,
    /// Whether the grant is still in force
    pub is_active: bool,
}

impl RoleAssignment {
    /// Create new active assignment
    pub fn new(identity: Identity, capability: Capability, granted_by: Identity, now: u64) -> Self {
        Self {
            identity,
            capability,
            granted_at: now,
            granted_by,
            is_active: true,
        }
    }
}

/// Capability table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub struct RoleTable {
    /// Identity that deployed the pool
    pub admin: Identity,
    /// All assignments ever made
    pub roles: Vec<RoleAssignment>,
}

impl RoleTable {
    /// Table where the deployer holds every capability
    pub fn new(deployer: Identity, now: u64) -> Self {
        let roles = [Capability::Admin, Capability::RewardAuthority, Capability::Operator]
            .into_iter()
            .map(|cap| RoleAssignment::new(deployer, cap, deployer, now))
            .collect();

        Self { admin: deployer, roles }
    }

    /// Check if identity holds a capability
    pub fn has_capability(&self, identity: &Identity, capability: Capability) -> bool {
        self.roles
            .iter()
            .any(|r| r.identity == *identity && r.capability == capability && r.is_active)
    }

    /// Grant a capability; only an admin may grant
    pub fn grant(
        &mut self,
        granter: Identity,
        grantee: Identity,
        capability: Capability,
        now: u64,
    ) -> PoolResult<()> {
        if !self.has_capability(&granter, Capability::Admin) {
            return Err(PoolError::AdminOnly);
        }

        if grantee == crate::constants::identity::ZERO {
            return Err(PoolError::InvalidIdentity {
                reason: "cannot grant to the zero identity",
            });
        }

        if self.has_capability(&grantee, capability) {
            return Ok(());
        }

        self.roles.push(RoleAssignment::new(grantee, capability, granter, now));
        Ok(())
    }

    /// Revoke a capability; the deployer keeps `Admin`
    pub fn revoke(
        &mut self,
        revoker: Identity,
        target: Identity,
        capability: Capability,
    ) -> PoolResult<()> {
        if !self.has_capability(&revoker, Capability::Admin) {
            return Err(PoolError::AdminOnly);
        }

        if target == self.admin && capability == Capability::Admin {
            return Err(PoolError::InvalidIdentity {
                reason: "deployer admin cannot be revoked",
            });
        }

        for r in self.roles.iter_mut() {
            if r.identity == target && r.capability == capability {
                r.is_active = false;
            }
        }

        Ok(())
    }

    /// Active capabilities of an identity
    pub fn capabilities_of(&self, identity: &Identity) -> Vec<Capability> {
        self.roles
            .iter()
            .filter(|r| r.identity == *identity && r.is_active)
            .map(|r| r.capability)
            .collect()
    }
}
