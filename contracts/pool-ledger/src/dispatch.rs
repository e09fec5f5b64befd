//! Call Envelope Decoding
//!
//! Raw calls arrive as an [`Envelope`]: caller identity, attached value and an
//! opaque payload. Decoding turns an envelope into a [`PoolAction`] or rejects
//! it; it never touches ledger state.
//!
//! ```text
//! data empty, value > 0   -> FundOperator { amount: value }
//! data empty, value == 0  -> MalformedCall
//! data = CBOR(PoolCall)   -> action selected by `op`
//! ```
//!
//! `DEPOSIT` and `INJECT_REWARD` are payable: their amount is the attached
//! value. Every other operation must arrive with zero value.
//!
//! A payload holds exactly one call. Bytes after it, or a `to`/`from` field
//! the operation does not take, reject the whole envelope.

use ethpool_common::{Identity, PoolAction, PoolError, PoolResult, WithdrawAmount};
use serde::{Deserialize, Serialize};

// ============ Operation Codes ============

/// Operation codes carried in `PoolCall::op`
pub mod op {
    /// Deposit the attached value
    pub const DEPOSIT: u8 = 0x10;
    /// Withdraw an amount, or everything when no amount is given
    pub const WITHDRAW: u8 = 0x11;
    /// Inject the attached value as a reward
    pub const INJECT_REWARD: u8 = 0x12;
    /// Sweep protocol-owned funds
    pub const WITHDRAW_OPERATOR: u8 = 0x13;
    /// Move shares to another identity
    pub const TRANSFER: u8 = 0x14;
    /// Set a spender's allowance
    pub const APPROVE: u8 = 0x15;
    /// Move shares out of an account that approved the caller
    pub const TRANSFER_FROM: u8 = 0x16;
}

// ============ Wire Structures ============

/// Raw inbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub caller: Identity,
    pub value: u64,
    pub data: Vec<u8>,
}

impl Envelope {
    /// Plain value transfer with no payload
    pub fn plain(caller: Identity, value: u64) -> Self {
        Self {
            caller,
            value,
            data: Vec::new(),
        }
    }

    /// Envelope carrying an encoded call
    pub fn call(caller: Identity, value: u64, call: &PoolCall) -> PoolResult<Self> {
        Ok(Self {
            caller,
            value,
            data: call.encode()?,
        })
    }
}

/// CBOR payload of a call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolCall {
    /// Operation type (see `op` module)
    pub op: u8,
    /// Amount for non-payable operations
    #[serde(default)]
    pub amount: Option<u64>,
    /// Recipient for share transfers, spender for approvals
    #[serde(default)]
    pub to: Option<Identity>,
    /// Share owner for delegated transfers
    #[serde(default)]
    pub from: Option<Identity>,
}

impl PoolCall {
    /// Create call for deposit (value carries the amount)
    pub fn deposit() -> Self {
        Self { op: op::DEPOSIT, amount: None, to: None, from: None }
    }

    /// Create call for a partial withdrawal
    pub fn withdraw(amount: u64) -> Self {
        Self { op: op::WITHDRAW, amount: Some(amount), to: None, from: None }
    }

    /// Create call withdrawing the whole entitlement
    pub fn withdraw_all() -> Self {
        Self { op: op::WITHDRAW, amount: None, to: None, from: None }
    }

    /// Create call for reward injection (value carries the amount)
    pub fn inject_reward() -> Self {
        Self { op: op::INJECT_REWARD, amount: None, to: None, from: None }
    }

    /// Create call sweeping protocol-owned funds
    pub fn withdraw_operator(amount: u64) -> Self {
        Self { op: op::WITHDRAW_OPERATOR, amount: Some(amount), to: None, from: None }
    }

    /// Create call moving shares
    pub fn transfer(to: Identity, amount: u64) -> Self {
        Self { op: op::TRANSFER, amount: Some(amount), to: Some(to), from: None }
    }

    /// Create call setting `spender`'s allowance
    pub fn approve(spender: Identity, amount: u64) -> Self {
        Self { op: op::APPROVE, amount: Some(amount), to: Some(spender), from: None }
    }

    /// Create call moving shares on `from`'s behalf
    pub fn transfer_from(from: Identity, to: Identity, amount: u64) -> Self {
        Self { op: op::TRANSFER_FROM, amount: Some(amount), to: Some(to), from: Some(from) }
    }

    /// CBOR encoding
    pub fn encode(&self) -> PoolResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(self, &mut buf).map_err(|_| PoolError::MalformedCall {
            reason: "call could not be encoded",
        })?;
        Ok(buf)
    }

    /// Decode a CBOR payload; the payload must hold exactly one call
    pub fn decode(data: &[u8]) -> PoolResult<Self> {
        let mut reader = data;
        let call = ciborium::from_reader(&mut reader).map_err(|_| PoolError::MalformedCall {
            reason: "payload is not a pool call",
        })?;
        if !reader.is_empty() {
            return Err(PoolError::MalformedCall {
                reason: "trailing bytes after call",
            });
        }
        Ok(call)
    }

    /// Convert to a ledger action given the attached value
    pub fn to_action(&self, value: u64) -> PoolResult<PoolAction> {
        match self.op {
            op::DEPOSIT => {
                self.shape(false, false)?;
                Ok(PoolAction::Deposit {
                    amount: self.payable(value)?,
                })
            }
            op::INJECT_REWARD => {
                self.shape(false, false)?;
                Ok(PoolAction::InjectReward {
                    amount: self.payable(value)?,
                })
            }
            op::WITHDRAW => {
                self.non_payable(value, false, false)?;
                let amount = self.amount.map_or(WithdrawAmount::All, WithdrawAmount::Exact);
                Ok(PoolAction::Withdraw { amount })
            }
            op::WITHDRAW_OPERATOR => {
                self.non_payable(value, false, false)?;
                Ok(PoolAction::WithdrawOperatorFunds {
                    amount: self.required_amount()?,
                })
            }
            op::TRANSFER => {
                self.non_payable(value, true, false)?;
                Ok(PoolAction::TransferShares {
                    to: self.required_to()?,
                    amount: self.required_amount()?,
                })
            }
            op::APPROVE => {
                self.non_payable(value, true, false)?;
                Ok(PoolAction::Approve {
                    spender: self.required_to()?,
                    amount: self.required_amount()?,
                })
            }
            op::TRANSFER_FROM => {
                self.non_payable(value, true, true)?;
                let from = self.from.ok_or(PoolError::MalformedCall {
                    reason: "delegated transfer without owner",
                })?;
                Ok(PoolAction::TransferSharesFrom {
                    from,
                    to: self.required_to()?,
                    amount: self.required_amount()?,
                })
            }
            _ => Err(PoolError::MalformedCall {
                reason: "unknown operation",
            }),
        }
    }

    /// Reject identity fields the operation does not take
    fn shape(&self, takes_to: bool, takes_from: bool) -> PoolResult<()> {
        if !takes_to && self.to.is_some() {
            return Err(PoolError::MalformedCall {
                reason: "unexpected recipient",
            });
        }
        if !takes_from && self.from.is_some() {
            return Err(PoolError::MalformedCall {
                reason: "unexpected owner",
            });
        }
        Ok(())
    }

    fn non_payable(&self, value: u64, takes_to: bool, takes_from: bool) -> PoolResult<()> {
        require_no_value(value)?;
        self.shape(takes_to, takes_from)
    }

    fn required_to(&self) -> PoolResult<Identity> {
        self.to.ok_or(PoolError::MalformedCall {
            reason: "missing recipient",
        })
    }

    fn payable(&self, value: u64) -> PoolResult<u64> {
        if self.amount.is_some() {
            return Err(PoolError::MalformedCall {
                reason: "payable call carries an explicit amount",
            });
        }
        if value == 0 {
            return Err(PoolError::MalformedCall {
                reason: "payable call without value",
            });
        }
        Ok(value)
    }

    fn required_amount(&self) -> PoolResult<u64> {
        self.amount.ok_or(PoolError::MalformedCall {
            reason: "missing amount",
        })
    }
}

fn require_no_value(value: u64) -> PoolResult<()> {
    if value != 0 {
        return Err(PoolError::MalformedCall {
            reason: "value attached to non-payable call",
        });
    }
    Ok(())
}

// ============ Decoding ============

/// Decode an envelope into the action it requests
pub fn decode_envelope(envelope: &Envelope) -> PoolResult<PoolAction> {
    if envelope.data.is_empty() {
        if envelope.value == 0 {
            return Err(PoolError::MalformedCall {
                reason: "empty call",
            });
        }
        return Ok(PoolAction::FundOperator {
            amount: envelope.value,
        });
    }

    PoolCall::decode(&envelope.data)?.to_action(envelope.value)
}
