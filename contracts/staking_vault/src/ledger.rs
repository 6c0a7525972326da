//! Pure accounting engine for the staking vault.
//!
//! Everything in this module is deterministic state-in/state-out: no clock, no
//! caller, no token. The contract layer feeds in the current block number and
//! performs the actual token movements; the engine owns the numbers.
//!
//! The reward model is the accumulator-snapshot technique: a global
//! `acc_reward_per_share` counter (scaled by [`PRECISION`]) grows as blocks
//! pass, and each user's entitlement is the delta between the counter and
//! their last-settled snapshot (`reward_debt`), weighted by their shares.
//! No per-user iteration ever happens on accrual.

use ink::primitives::AccountId;

pub type Balance = u128;
pub type BlockNumber = u32;

/// Scaling factor for the reward-per-share accumulator.
pub const PRECISION: u128 = 1_000_000_000_000;

/// Denominator for all basis-point calculations.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Early-withdrawal fee applied until an admin overrides it (7%).
pub const DEFAULT_WITHDRAW_FEE_BPS: u128 = 700;

/// Hard ceiling for the admin-settable early-withdrawal fee (50%).
pub const MAX_WITHDRAW_FEE_BPS: u128 = 5_000;

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
pub enum Error {
    AlreadyInitialized,
    VaultNotActive,
    InvalidAmount,
    InsufficientShares,
    TransferFailed,
    Unauthorized,
    Overflow,
    NothingToClaim,
    InvalidFee,
    ZeroAddress,
}

// =============================================================================
// TYPES
// =============================================================================

/// Vault lifecycle. `Active` is entered exactly once, `Exhausted` when the
/// funded reward pool has been fully accrued.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub enum VaultStatus {
    #[default]
    Uninitialized,
    Active,
    Exhausted,
}

/// Global vault accounting state. Deposits may only arrive while `Active`;
/// principal stays withdrawable in every post-initialization state.
#[derive(Debug, Default, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct VaultState {
    pub status: VaultStatus,
    /// Reward emission per elapsed block.
    pub rewards_per_block: Balance,
    /// Rewards funded at initialization; fixed afterwards.
    pub total_rewards: Balance,
    /// Rewards not yet folded into the accumulator. Never increases.
    pub rewards_remaining: Balance,
    /// Cumulative reward per share since genesis, scaled by `PRECISION`.
    /// Never decreases.
    pub acc_reward_per_share: u128,
    /// Block at which the accumulator was last brought up to date.
    pub last_reward_block: BlockNumber,
    /// Sum of all users' shares. Principal only; reward float is excluded.
    pub total_vault_shares: Balance,
}

/// Per-user position. Created lazily on first deposit, never deleted;
/// fully-withdrawn users simply hold zero shares.
#[derive(Debug, Clone, PartialEq, Eq, scale::Encode, scale::Decode)]
#[cfg_attr(
    feature = "std",
    derive(scale_info::TypeInfo, ink::storage::traits::StorageLayout)
)]
pub struct UserInfo {
    pub user: AccountId,
    pub tot_user_shares: Balance,
    /// Accumulator value last settled against this user.
    pub reward_debt: u128,
    /// Rewards settled but not yet paid out.
    pub pending_rewards: Balance,
}

impl UserInfo {
    pub fn new(user: AccountId) -> Self {
        Self {
            user,
            tot_user_shares: 0,
            reward_debt: 0,
            pending_rewards: 0,
        }
    }
}

/// Result of a withdrawal transition: what leaves the vault and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOutcome {
    /// Amount returned to the withdrawing user.
    pub net_amount: Balance,
    /// Penalty routed to the fee collector. Zero unless `early`.
    pub fee: Balance,
    pub early: bool,
}

// =============================================================================
// ENGINE
// =============================================================================

impl VaultState {
    /// One-time transition `Uninitialized -> Active`.
    ///
    /// The caller is responsible for actually pulling `total_rewards` token
    /// units into the vault in the same atomic call.
    pub fn initialize(
        &mut self,
        rewards_per_block: Balance,
        total_rewards: Balance,
        current_block: BlockNumber,
    ) -> Result<(), Error> {
        if self.status != VaultStatus::Uninitialized {
            return Err(Error::AlreadyInitialized);
        }
        if rewards_per_block == 0 || total_rewards == 0 {
            return Err(Error::InvalidAmount);
        }

        self.status = VaultStatus::Active;
        self.rewards_per_block = rewards_per_block;
        self.total_rewards = total_rewards;
        self.rewards_remaining = total_rewards;
        self.acc_reward_per_share = 0;
        self.last_reward_block = current_block;
        Ok(())
    }

    /// Folds the reward slice since `last_reward_block` into the accumulator.
    ///
    /// Idempotent per block. Must run before any read or mutation of shares.
    /// With zero shares outstanding the slice is neither distributed nor
    /// deducted: it stays in `rewards_remaining` until a depositor exists.
    pub fn accrue(&mut self, current_block: BlockNumber) -> Result<(), Error> {
        if self.status == VaultStatus::Uninitialized {
            return Ok(());
        }
        // Also clamps a regressing block index to a no-op.
        if current_block <= self.last_reward_block {
            return Ok(());
        }

        if self.total_vault_shares == 0 {
            self.last_reward_block = current_block;
            return Ok(());
        }

        let elapsed = current_block - self.last_reward_block;
        let emitted = (elapsed as u128)
            .checked_mul(self.rewards_per_block)
            .ok_or(Error::Overflow)?;
        // Emission is capped at the remaining funding: once the pool is dry
        // the accumulator stops growing.
        let reward = emitted.min(self.rewards_remaining);

        let per_share = reward
            .checked_mul(PRECISION)
            .ok_or(Error::Overflow)?
            / self.total_vault_shares;
        self.acc_reward_per_share = self
            .acc_reward_per_share
            .checked_add(per_share)
            .ok_or(Error::Overflow)?;

        self.rewards_remaining -= reward;
        self.last_reward_block = current_block;

        if self.rewards_remaining == 0 {
            self.status = VaultStatus::Exhausted;
        }
        Ok(())
    }

    /// Settles newly accrued reward into `user.pending_rewards` and refreshes
    /// the accumulator snapshot. Call only after [`Self::accrue`].
    pub fn settle(&mut self, user: &mut UserInfo) -> Result<Balance, Error> {
        if user.tot_user_shares > 0 {
            let delta = self
                .acc_reward_per_share
                .checked_sub(user.reward_debt)
                .ok_or(Error::Overflow)?;
            let newly_accrued = user
                .tot_user_shares
                .checked_mul(delta)
                .ok_or(Error::Overflow)?
                / PRECISION;
            user.pending_rewards = user
                .pending_rewards
                .checked_add(newly_accrued)
                .ok_or(Error::Overflow)?;
        }
        user.reward_debt = self.acc_reward_per_share;
        Ok(user.pending_rewards)
    }

    /// Deposit transition: accrual, settlement, then share increase on both
    /// the user and the vault total.
    pub fn deposit(
        &mut self,
        user: &mut UserInfo,
        amount: Balance,
        current_block: BlockNumber,
    ) -> Result<(), Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        if self.status != VaultStatus::Active {
            return Err(Error::VaultNotActive);
        }

        self.accrue(current_block)?;
        self.settle(user)?;

        user.tot_user_shares = user
            .tot_user_shares
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        self.total_vault_shares = self
            .total_vault_shares
            .checked_add(amount)
            .ok_or(Error::Overflow)?;
        Ok(())
    }

    /// Withdrawal transition. Computes the early/mature split but leaves the
    /// actual transfers to the caller.
    ///
    /// A withdrawal is early while the vault is still `Active` and the
    /// maturity block has not been reached; the penalty is `fee_bps` of the
    /// withdrawn amount and by construction never exceeds it.
    pub fn withdraw(
        &mut self,
        user: &mut UserInfo,
        amount: Balance,
        current_block: BlockNumber,
        fee_bps: u128,
        maturity_block: BlockNumber,
    ) -> Result<WithdrawOutcome, Error> {
        if amount == 0 {
            return Err(Error::InvalidAmount);
        }
        if self.status == VaultStatus::Uninitialized {
            return Err(Error::VaultNotActive);
        }
        if amount > user.tot_user_shares {
            return Err(Error::InsufficientShares);
        }

        self.accrue(current_block)?;
        self.settle(user)?;

        // Accrual above may have exhausted the vault; the early check uses
        // the post-accrual status so a withdrawal in the same call is mature.
        let early = self.status == VaultStatus::Active && current_block < maturity_block;
        let fee = if early {
            amount.checked_mul(fee_bps).ok_or(Error::Overflow)? / BPS_DENOMINATOR
        } else {
            0
        };

        user.tot_user_shares -= amount;
        self.total_vault_shares = self
            .total_vault_shares
            .checked_sub(amount)
            .ok_or(Error::Overflow)?;

        Ok(WithdrawOutcome {
            net_amount: amount - fee,
            fee,
            early,
        })
    }

    /// Accrues, settles, and drains the user's pending reward balance.
    pub fn claim(
        &mut self,
        user: &mut UserInfo,
        current_block: BlockNumber,
    ) -> Result<Balance, Error> {
        self.accrue(current_block)?;
        self.settle(user)?;
        let amount = Self::take_pending(user);
        if amount == 0 {
            return Err(Error::NothingToClaim);
        }
        Ok(amount)
    }

    /// Drains `pending_rewards`, returning the drained amount.
    pub fn take_pending(user: &mut UserInfo) -> Balance {
        let amount = user.pending_rewards;
        user.pending_rewards = 0;
        amount
    }

    /// Read-only projection of what `user` would hold pending after a
    /// settlement at `current_block`. Saturating on purpose: views never fail.
    pub fn pending_rewards(&self, user: &UserInfo, current_block: BlockNumber) -> Balance {
        let mut acc = self.acc_reward_per_share;

        if current_block > self.last_reward_block
            && self.total_vault_shares > 0
            && self.status != VaultStatus::Uninitialized
        {
            let elapsed = current_block - self.last_reward_block;
            let emitted = (elapsed as u128).saturating_mul(self.rewards_per_block);
            let reward = emitted.min(self.rewards_remaining);
            acc = acc.saturating_add(reward.saturating_mul(PRECISION) / self.total_vault_shares);
        }

        let delta = acc.saturating_sub(user.reward_debt);
        user.pending_rewards
            .saturating_add(user.tot_user_shares.saturating_mul(delta) / PRECISION)
    }
}

// =============================================================================
// UNIT TESTS
// =============================================================================
