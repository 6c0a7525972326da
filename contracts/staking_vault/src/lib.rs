#![cfg_attr(not(feature = "std"), no_std, no_main)]

pub mod ledger;

/// # Staking Vault
///
/// Users deposit the stake token into a shared pool and accrue rewards
/// proportional to their share of the pool over time. Rewards are funded once
/// at initialization and emitted per block; early withdrawals pay a
/// configurable penalty routed to a fee collector.
///
/// ## Lifecycle
///
/// ```text
/// Uninitialized ──initialize_vault──▶ Active ──rewards run dry──▶ Exhausted
///                                      │                            │
///                                      ├── deposit / withdraw        ├── withdraw only
///                                      └── early exits pay fee       └── exits are fee-free
/// ```
///
/// All accounting lives in [`ledger`] as plain state transitions; this
/// contract wires in the block clock, the caller and the token transfers.
/// Every message either completes fully or reverts — a failed token move
/// unwinds all prior state mutations of the call.
#[ink::contract]
mod staking_vault {
    use ink::env::{
        call::{build_call, ExecutionInput, Selector},
        DefaultEnvironment,
    };
    use ink::storage::Mapping;

    use crate::ledger::{
        Error, UserInfo, VaultState, VaultStatus, DEFAULT_WITHDRAW_FEE_BPS, MAX_WITHDRAW_FEE_BPS,
    };

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct StakingVault {
        owner: AccountId,
        admin: AccountId,
        /// Collector for early-withdrawal penalties.
        fee_address: AccountId,
        /// The staked (and reward) token contract.
        token: AccountId,
        /// Payout policy: `true` pays settled rewards out on every
        /// deposit/withdraw, `false` holds them until `claim`.
        auto_pay_rewards: bool,
        withdraw_fee_bps: u128,
        /// Block from which withdrawals stop being early. `u32::MAX` keeps
        /// the penalty in force until the vault is exhausted.
        maturity_block: BlockNumber,
        vault: VaultState,
        users: Mapping<AccountId, UserInfo>,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct VaultInitialized {
        rewards_per_block: Balance,
        total_rewards: Balance,
    }

    #[ink(event)]
    pub struct Deposit {
        amount: Balance,
        #[ink(topic)]
        user: AccountId,
    }

    #[ink(event)]
    pub struct Withdraw {
        amount: Balance,
        #[ink(topic)]
        user: AccountId,
    }

    #[ink(event)]
    pub struct EarlyWithdraw {
        amount: Balance,
        #[ink(topic)]
        user: AccountId,
    }

    #[ink(event)]
    pub struct RewardsClaimed {
        amount: Balance,
        #[ink(topic)]
        user: AccountId,
    }

    // =========================================================================
    // IMPLEMENTATION
    // =========================================================================

    impl StakingVault {
        #[ink(constructor)]
        pub fn new(
            token: AccountId,
            admin: AccountId,
            fee_address: AccountId,
            auto_pay_rewards: bool,
        ) -> Self {
            Self {
                owner: Self::env().caller(),
                admin,
                fee_address,
                token,
                auto_pay_rewards,
                withdraw_fee_bps: DEFAULT_WITHDRAW_FEE_BPS,
                maturity_block: BlockNumber::MAX,
                vault: VaultState::default(),
                users: Mapping::default(),
            }
        }

        // =================================================================
        // INITIALIZATION
        // =================================================================

        /// Funds the vault and starts reward emission. Owner/admin only,
        /// callable exactly once; the caller must have approved
        /// `total_rewards` on the token beforehand.
        #[ink(message)]
        pub fn initialize_vault(
            &mut self,
            rewards_per_block: Balance,
            total_rewards: Balance,
        ) -> Result<(), Error> {
            self.ensure_admin()?;

            let current_block = self.env().block_number();
            self.vault
                .initialize(rewards_per_block, total_rewards, current_block)?;

            // Funding lands in the same atomic call or the whole
            // initialization reverts.
            let caller = self.env().caller();
            let vault_account = self.env().account_id();
            self.token_transfer_from(caller, vault_account, total_rewards)?;

            self.env().emit_event(VaultInitialized {
                rewards_per_block,
                total_rewards,
            });
            Ok(())
        }

        // =================================================================
        // DEPOSIT / WITHDRAW
        // =================================================================

        /// Stakes `amount` token units. Requires a prior approval on the
        /// token contract and an `Active` vault.
        #[ink(message)]
        pub fn deposit(&mut self, amount: Balance) -> Result<(), Error> {
            let caller = self.env().caller();
            let current_block = self.env().block_number();
            let mut user = self.user_or_default(caller);

            self.vault.deposit(&mut user, amount, current_block)?;
            let payout = if self.auto_pay_rewards {
                VaultState::take_pending(&mut user)
            } else {
                0
            };
            self.users.insert(caller, &user);

            let vault_account = self.env().account_id();
            self.token_transfer_from(caller, vault_account, amount)?;
            self.pay_rewards(caller, payout)?;

            self.env().emit_event(Deposit {
                amount,
                user: caller,
            });
            Ok(())
        }

        /// Unstakes `amount` shares. Early exits (vault still `Active` and
        /// before the maturity block) pay the configured fee to the fee
        /// collector; the remainder is returned in the same call. Returns
        /// the net amount transferred back to the caller.
        #[ink(message)]
        pub fn withdraw(&mut self, amount: Balance) -> Result<Balance, Error> {
            let caller = self.env().caller();
            let current_block = self.env().block_number();
            let mut user = self.user_or_default(caller);

            let outcome = self.vault.withdraw(
                &mut user,
                amount,
                current_block,
                self.withdraw_fee_bps,
                self.maturity_block,
            )?;
            let payout = if self.auto_pay_rewards {
                VaultState::take_pending(&mut user)
            } else {
                0
            };
            self.users.insert(caller, &user);

            self.token_transfer(caller, outcome.net_amount)?;
            if outcome.fee > 0 {
                self.token_transfer(self.fee_address, outcome.fee)?;
            }
            self.pay_rewards(caller, payout)?;

            if outcome.early {
                self.env().emit_event(EarlyWithdraw {
                    amount,
                    user: caller,
                });
            } else {
                self.env().emit_event(Withdraw {
                    amount,
                    user: caller,
                });
            }
            Ok(outcome.net_amount)
        }

        /// Pays out all settled rewards held for the caller. Only useful in
        /// the settle-and-hold configuration; auto-pay vaults drain pending
        /// rewards on every interaction.
        #[ink(message)]
        pub fn claim(&mut self) -> Result<Balance, Error> {
            let caller = self.env().caller();
            let current_block = self.env().block_number();
            let mut user = self.user_or_default(caller);

            let amount = self.vault.claim(&mut user, current_block)?;
            self.users.insert(caller, &user);

            self.token_transfer(caller, amount)?;
            self.env().emit_event(RewardsClaimed {
                amount,
                user: caller,
            });
            Ok(amount)
        }

        // =================================================================
        // ADMIN
        // =================================================================

        #[ink(message)]
        pub fn set_admin(&mut self, new_admin: AccountId) -> Result<(), Error> {
            self.ensure_owner()?;
            Self::ensure_nonzero(new_admin)?;
            self.admin = new_admin;
            Ok(())
        }

        #[ink(message)]
        pub fn set_fee_address(&mut self, new_fee_address: AccountId) -> Result<(), Error> {
            self.ensure_admin()?;
            Self::ensure_nonzero(new_fee_address)?;
            self.fee_address = new_fee_address;
            Ok(())
        }

        #[ink(message)]
        pub fn set_withdraw_fee(&mut self, fee_bps: u128) -> Result<(), Error> {
            self.ensure_admin()?;
            if fee_bps > MAX_WITHDRAW_FEE_BPS {
                return Err(Error::InvalidFee);
            }
            self.withdraw_fee_bps = fee_bps;
            Ok(())
        }

        #[ink(message)]
        pub fn set_maturity_block(&mut self, block: BlockNumber) -> Result<(), Error> {
            self.ensure_admin()?;
            self.maturity_block = block;
            Ok(())
        }

        // =================================================================
        // VIEWS
        // =================================================================

        #[ink(message)]
        pub fn vault_info(&self) -> VaultState {
            self.vault.clone()
        }

        #[ink(message)]
        pub fn status(&self) -> VaultStatus {
            self.vault.status
        }

        #[ink(message)]
        pub fn total_vault_shares(&self) -> Balance {
            self.vault.total_vault_shares
        }

        #[ink(message)]
        pub fn rewards_remaining(&self) -> Balance {
            self.vault.rewards_remaining
        }

        #[ink(message)]
        pub fn user_info(&self, account: AccountId) -> UserInfo {
            self.user_or_default(account)
        }

        /// Rewards `account` would hold pending after settling at the
        /// current block. Non-mutating.
        #[ink(message)]
        pub fn pending_rewards(&self, account: AccountId) -> Balance {
            let user = self.user_or_default(account);
            self.vault
                .pending_rewards(&user, self.env().block_number())
        }

        #[ink(message)]
        pub fn owner(&self) -> AccountId {
            self.owner
        }

        #[ink(message)]
        pub fn admin(&self) -> AccountId {
            self.admin
        }

        #[ink(message)]
        pub fn fee_address(&self) -> AccountId {
            self.fee_address
        }

        #[ink(message)]
        pub fn token(&self) -> AccountId {
            self.token
        }

        #[ink(message)]
        pub fn withdraw_fee_bps(&self) -> u128 {
            self.withdraw_fee_bps
        }

        #[ink(message)]
        pub fn maturity_block(&self) -> BlockNumber {
            self.maturity_block
        }

        #[ink(message)]
        pub fn auto_pay_rewards(&self) -> bool {
            self.auto_pay_rewards
        }

        // =================================================================
        // INTERNALS
        // =================================================================

        fn user_or_default(&self, account: AccountId) -> UserInfo {
            self.users
                .get(account)
                .unwrap_or_else(|| UserInfo::new(account))
        }

        fn pay_rewards(&mut self, to: AccountId, amount: Balance) -> Result<(), Error> {
            if amount == 0 {
                return Ok(());
            }
            self.token_transfer(to, amount)?;
            self.env().emit_event(RewardsClaimed { amount, user: to });
            Ok(())
        }

        fn ensure_owner(&self) -> Result<(), Error> {
            if self.env().caller() != self.owner {
                return Err(Error::Unauthorized);
            }
            Ok(())
        }

        fn ensure_admin(&self) -> Result<(), Error> {
            let caller = self.env().caller();
            if caller != self.owner && caller != self.admin {
                return Err(Error::Unauthorized);
            }
            Ok(())
        }

        fn ensure_nonzero(account: AccountId) -> Result<(), Error> {
            if account == AccountId::from([0x0; 32]) {
                return Err(Error::ZeroAddress);
            }
            Ok(())
        }

        fn token_transfer(&self, to: AccountId, amount: Balance) -> Result<(), Error> {
            let result = build_call::<DefaultEnvironment>()
                .call(self.token)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer")))
                        .push_arg(&to)
                        .push_arg(amount),
                )
                .returns::<Result<(), Error>>()
                .try_invoke();

            match result {
                Ok(Ok(Ok(()))) => Ok(()),
                _ => Err(Error::TransferFailed),
            }
        }

        fn token_transfer_from(
            &self,
            from: AccountId,
            to: AccountId,
            amount: Balance,
        ) -> Result<(), Error> {
            let result = build_call::<DefaultEnvironment>()
                .call(self.token)
                .exec_input(
                    ExecutionInput::new(Selector::new(ink::selector_bytes!("transfer_from")))
                        .push_arg(&from)
                        .push_arg(&to)
                        .push_arg(amount),
                )
                .returns::<Result<(), Error>>()
                .try_invoke();

            match result {
                Ok(Ok(Ok(()))) => Ok(()),
                _ => Err(Error::TransferFailed),
            }
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================
    //
    // These cover construction, guards and configuration — everything that
    // resolves before a token call. The off-chain test environment cannot
    // dispatch cross-contract calls, so deposit/withdraw/claim accounting is
    // exercised exhaustively against the engine in `ledger`.

    #[cfg(test)]
    mod tests {
        use super::*;
        use ink::env::{test, DefaultEnvironment};

        type Env = DefaultEnvironment;

        fn accounts() -> test::DefaultAccounts<Env> {
            test::default_accounts::<Env>()
        }

        fn set_caller(account: AccountId) {
            test::set_caller::<Env>(account);
        }

        /// alice = owner, bob = admin, charlie = fee collector,
        /// django = the token contract address.
        fn deploy() -> StakingVault {
            let accs = accounts();
            set_caller(accs.alice);
            StakingVault::new(accs.django, accs.bob, accs.charlie, false)
        }

        // ── Construction & views ─────────────────────────────────────────

        #[ink::test]
        fn constructor_wires_roles_and_defaults() {
            let vault = deploy();
            let accs = accounts();
            assert_eq!(vault.owner(), accs.alice);
            assert_eq!(vault.admin(), accs.bob);
            assert_eq!(vault.fee_address(), accs.charlie);
            assert_eq!(vault.token(), accs.django);
            assert_eq!(vault.status(), VaultStatus::Uninitialized);
            assert_eq!(vault.withdraw_fee_bps(), DEFAULT_WITHDRAW_FEE_BPS);
            assert_eq!(vault.maturity_block(), u32::MAX);
            assert!(!vault.auto_pay_rewards());
        }

        #[ink::test]
        fn views_default_for_unknown_user() {
            let vault = deploy();
            let accs = accounts();
            let info = vault.user_info(accs.eve);
            assert_eq!(info.user, accs.eve);
            assert_eq!(info.tot_user_shares, 0);
            assert_eq!(info.pending_rewards, 0);
            assert_eq!(vault.pending_rewards(accs.eve), 0);
            assert_eq!(vault.total_vault_shares(), 0);
            assert_eq!(vault.rewards_remaining(), 0);
        }

        #[ink::test]
        fn vault_info_reflects_engine_state() {
            let vault = deploy();
            let info = vault.vault_info();
            assert_eq!(info, VaultState::default());
        }

        // ── Initialization guards ────────────────────────────────────────

        #[ink::test]
        fn initialize_rejects_strangers() {
            let mut vault = deploy();
            let accs = accounts();
            set_caller(accs.eve);
            assert_eq!(
                vault.initialize_vault(10, 1_000),
                Err(Error::Unauthorized)
            );
            assert_eq!(vault.status(), VaultStatus::Uninitialized);
        }

        #[ink::test]
        fn initialize_rejects_zero_parameters() {
            let mut vault = deploy();
            assert_eq!(vault.initialize_vault(0, 1_000), Err(Error::InvalidAmount));
            assert_eq!(vault.initialize_vault(10, 0), Err(Error::InvalidAmount));
            assert_eq!(vault.status(), VaultStatus::Uninitialized);
        }

        // ── Deposit / withdraw guards ────────────────────────────────────

        #[ink::test]
        fn deposit_rejects_zero_amount() {
            let mut vault = deploy();
            assert_eq!(vault.deposit(0), Err(Error::InvalidAmount));
        }

        #[ink::test]
        fn deposit_requires_active_vault() {
            let mut vault = deploy();
            assert_eq!(vault.deposit(100), Err(Error::VaultNotActive));
        }

        #[ink::test]
        fn withdraw_requires_initialized_vault() {
            let mut vault = deploy();
            assert_eq!(vault.withdraw(100), Err(Error::VaultNotActive));
        }

        #[ink::test]
        fn claim_with_nothing_pending_fails() {
            let mut vault = deploy();
            assert_eq!(vault.claim(), Err(Error::NothingToClaim));
        }

        // ── Admin configuration ──────────────────────────────────────────

        #[ink::test]
        fn admin_can_tune_withdraw_policy() {
            let mut vault = deploy();
            let accs = accounts();

            set_caller(accs.bob);
            vault.set_withdraw_fee(1_200).unwrap();
            vault.set_maturity_block(500_000).unwrap();
            assert_eq!(vault.withdraw_fee_bps(), 1_200);
            assert_eq!(vault.maturity_block(), 500_000);
        }

        #[ink::test]
        fn withdraw_fee_is_capped() {
            let mut vault = deploy();
            assert_eq!(
                vault.set_withdraw_fee(MAX_WITHDRAW_FEE_BPS + 1),
                Err(Error::InvalidFee)
            );
            assert_eq!(vault.withdraw_fee_bps(), DEFAULT_WITHDRAW_FEE_BPS);
        }

        #[ink::test]
        fn policy_setters_reject_strangers() {
            let mut vault = deploy();
            let accs = accounts();
            set_caller(accs.eve);
            assert_eq!(vault.set_withdraw_fee(100), Err(Error::Unauthorized));
            assert_eq!(vault.set_maturity_block(1), Err(Error::Unauthorized));
            assert_eq!(vault.set_fee_address(accs.eve), Err(Error::Unauthorized));
        }

        #[ink::test]
        fn set_admin_is_owner_only() {
            let mut vault = deploy();
            let accs = accounts();

            // The admin itself cannot hand over the role.
            set_caller(accs.bob);
            assert_eq!(vault.set_admin(accs.eve), Err(Error::Unauthorized));

            set_caller(accs.alice);
            vault.set_admin(accs.eve).unwrap();
            assert_eq!(vault.admin(), accs.eve);
        }

        #[ink::test]
        fn role_setters_reject_zero_address() {
            let mut vault = deploy();
            let zero = AccountId::from([0x0; 32]);
            assert_eq!(vault.set_admin(zero), Err(Error::ZeroAddress));
            assert_eq!(vault.set_fee_address(zero), Err(Error::ZeroAddress));
        }
    }
}
