#![cfg_attr(not(feature = "std"), no_std, no_main)]

/// # Spread
///
/// Stateless fan-out utility: one call distributes a payment to many
/// recipients, either in the native asset or in a fungible token. Recipient
/// and amount arrays must be non-empty and of equal length; the native
/// variant must be funded with exactly the sum of the amounts. Any failure
/// reverts the whole call, so partial distribution is never observable.
#[ink::contract]
mod spread {
    use ink::env::{
        call::{build_call, ExecutionInput, Selector},
        DefaultEnvironment,
    };
    use ink::prelude::vec::Vec;

    // =========================================================================
    // ERRORS
    // =========================================================================

    #[derive(Debug, PartialEq, Eq, scale::Encode, scale::Decode)]
    #[cfg_attr(feature = "std", derive(scale_info::TypeInfo))]
    pub enum Error {
        EmptyInput,
        LengthMismatch,
        /// Attached native value does not equal the sum of the amounts.
        ValueMismatch,
        Overflow,
        TransferFailed,
    }

    // =========================================================================
    // EVENTS
    // =========================================================================

    #[ink(event)]
    pub struct AssetSpread {
        #[ink(topic)]
        from: AccountId,
        total: Balance,
        recipients: u64,
    }

    #[ink(event)]
    pub struct TokenSpread {
        #[ink(topic)]
        from: AccountId,
        #[ink(topic)]
        token: AccountId,
        total: Balance,
        recipients: u64,
    }

    // =========================================================================
    // STORAGE
    // =========================================================================

    #[ink(storage)]
    pub struct Spread {}

    impl Spread {
        #[ink(constructor)]
        pub fn new() -> Self {
            Self {}
        }

        // =================================================================
        // NATIVE ASSET
        // =================================================================

        /// Fans the attached value out to `recipients`. The transferred
        /// value must equal the sum of `amounts` exactly.
        #[ink(message, payable)]
        pub fn spread_asset(
            &mut self,
            recipients: Vec<AccountId>,
            amounts: Vec<Balance>,
        ) -> Result<(), Error> {
            let total = Self::checked_total(&recipients, &amounts)?;
            if self.env().transferred_value() != total {
                return Err(Error::ValueMismatch);
            }

            for (recipient, amount) in recipients.iter().zip(amounts.iter()) {
                self.env()
                    .transfer(*recipient, *amount)
                    .map_err(|_| Error::TransferFailed)?;
            }

            self.env().emit_event(AssetSpread {
                from: self.env().caller(),
                total,
                recipients: recipients.len() as u64,
            });
            Ok(())
        }

        // =================================================================
        // TOKEN
        // =================================================================

        /// Fans token units out recipient by recipient, each moved straight
        /// from the caller via `transfer_from`. Requires an allowance of at
        /// least the total sum.
        #[ink(message)]
        pub fn spread_token(
            &mut self,
            token: AccountId,
            recipients: Vec<AccountId>,
            amounts: Vec<Balance>,
        ) -> Result<(), Error> {
            let caller = self.env().caller();
            let total = Self::checked_total(&recipients, &amounts)?;

            for (recipient, amount) in recipients.iter().zip(amounts.iter()) {
                self.token_transfer_from(token, caller, *recipient, *amount)?;
            }

            self.env().emit_event(TokenSpread {
                from: caller,
                token,
                total,
                recipients: recipients.len() as u64,
            });
            Ok(())
        }

        /// Like [`Self::spread_token`] but pulls the total once and fans out
        /// from the contract's own balance — one `transfer_from` instead of
        /// one per recipient.
        #[ink(message)]
        pub fn spread_token_simple(
            &mut self,
            token: AccountId,
            recipients: Vec<AccountId>,
            amounts: Vec<Balance>,
        ) -> Result<(), Error> {
            let caller = self.env().caller();
            let total = Self::checked_total(&recipients, &amounts)?;

            let own_account = self.env().account_id();
            self.token_transfer_from(token, caller, own_account, total)?;
            for (recipient, amount) in recipients.iter().zip(amounts.iter()) {
                self.token_transfer(token, *recipient, *amount)?;
            }

            self.env().emit_event(TokenSpread {
                from: caller,
                token,
                total,
                recipients: recipients.len() as u64,
            });
            Ok(())
        }

        // =================================================================
        // INTERNALS
        // =================================================================

        /// Validates the input arrays and returns the overflow-checked sum.
        fn checked_total(
            recipients: &[AccountId],
            amounts: &[Balance],
        ) -> Result<Balance, Error> {
            if recipients.is_empty() {
                return Err(Error::EmptyInput);
            }
            if recipients.len() != amounts.len() {
                return Err(Error::LengthMismatch);
            }
            amounts
                .iter()
                .try_fold(0u128, |acc, amount| acc.checked_add(*amount))
                .ok_or(Error::Overflow)
        }

        fn token_transfer(
            &self,
            token: AccountId,
            to: AccountId,
            amount: Balance,
        ) -> Result<(), Error> {
            let result = build_call::<DefaultEnvironment>()
                .call(token)
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
            token: AccountId,
            from: AccountId,
            to: AccountId,
            amount: Balance,
        ) -> Result<(), Error> {
            let result = build_call::<DefaultEnvironment>()
                .call(token)
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

    impl Default for Spread {
        fn default() -> Self {
            Self::new()
        }
    }

    // =========================================================================
    // UNIT TESTS
    // =========================================================================

    #[cfg(test)]
    mod tests {
        use super::*;
        use ink::env::{test, DefaultEnvironment};
        use ink::prelude::vec;

        type Env = DefaultEnvironment;

        fn accounts() -> test::DefaultAccounts<Env> {
            test::default_accounts::<Env>()
        }

        fn set_caller(account: AccountId) {
            test::set_caller::<Env>(account);
        }

        fn balance_of(account: AccountId) -> Balance {
            test::get_account_balance::<Env>(account).unwrap_or(0)
        }

        /// The off-chain env refuses balances below its existential minimum
        /// of 1_000_000, so the callee is funded with minimum + `funding`.
        const EXISTENTIAL_MINIMUM: Balance = 1_000_000;

        fn deploy_funded(funding: Balance) -> Spread {
            let accs = accounts();
            set_caller(accs.alice);
            let spread = Spread::new();
            // The off-chain env routes `env().transfer` out of the callee
            // account, so the contract itself holds the attached value.
            test::set_account_balance::<Env>(test::callee::<Env>(), EXISTENTIAL_MINIMUM + funding);
            spread
        }

        // ── Validation ───────────────────────────────────────────────────

        #[ink::test]
        fn rejects_empty_arrays() {
            let mut spread = deploy_funded(0);
            assert_eq!(
                spread.spread_asset(vec![], vec![]),
                Err(Error::EmptyInput)
            );
        }

        #[ink::test]
        fn rejects_mismatched_arrays() {
            let mut spread = deploy_funded(0);
            let accs = accounts();
            assert_eq!(
                spread.spread_asset(vec![accs.bob], vec![]),
                Err(Error::LengthMismatch)
            );
            assert_eq!(
                spread.spread_token(accs.frank, vec![], vec![500]),
                Err(Error::EmptyInput)
            );
            assert_eq!(
                spread.spread_token_simple(accs.frank, vec![accs.bob, accs.charlie], vec![500]),
                Err(Error::LengthMismatch)
            );
        }

        #[ink::test]
        fn rejects_underfunded_native_call() {
            let mut spread = deploy_funded(1_000);
            let accs = accounts();
            test::set_value_transferred::<Env>(500);
            assert_eq!(
                spread.spread_asset(vec![accs.bob], vec![600]),
                Err(Error::ValueMismatch)
            );
        }

        #[ink::test]
        fn rejects_overfunded_native_call() {
            let mut spread = deploy_funded(1_000);
            let accs = accounts();
            test::set_value_transferred::<Env>(700);
            assert_eq!(
                spread.spread_asset(vec![accs.bob], vec![600]),
                Err(Error::ValueMismatch)
            );
        }

        #[ink::test]
        fn rejects_overflowing_amounts() {
            let mut spread = deploy_funded(0);
            let accs = accounts();
            assert_eq!(
                spread.spread_asset(
                    vec![accs.bob, accs.charlie],
                    vec![Balance::MAX, 1]
                ),
                Err(Error::Overflow)
            );
        }

        // ── Native fan-out ───────────────────────────────────────────────

        #[ink::test]
        fn spreads_native_asset_exactly() {
            let mut spread = deploy_funded(1_000);
            let accs = accounts();

            let before_bob = balance_of(accs.bob);
            let before_charlie = balance_of(accs.charlie);
            let before_eve = balance_of(accs.eve);

            test::set_value_transferred::<Env>(600);
            spread
                .spread_asset(
                    vec![accs.bob, accs.charlie, accs.eve],
                    vec![100, 200, 300],
                )
                .unwrap();

            assert_eq!(balance_of(accs.bob), before_bob + 100);
            assert_eq!(balance_of(accs.charlie), before_charlie + 200);
            assert_eq!(balance_of(accs.eve), before_eve + 300);
        }
    }
}
