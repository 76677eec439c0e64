use gitledger_types::{
    Reward, RewardId,
    error::{AlreadyExistsSnafu, InvalidRequestSnafu, Result, UnauthorizedSnafu},
    messages::CreateReward,
};
use tracing::{info, instrument};

use super::Ledger;
use crate::{entity::EntityStore, keys::LedgerKeys, names::AddressIndex};

impl Ledger {
    /// Grants a reward to a recipient that has none yet.
    ///
    /// # Errors
    ///
    /// Returns `Unauthorized` unless the creator is the configured evaluator,
    /// `InvalidRequest` for a zero amount, and `AlreadyExists` if the
    /// recipient already holds a reward.
    #[instrument(skip(self, msg), fields(creator = %msg.creator, recipient = %msg.recipient))]
    pub fn create_reward(&self, msg: CreateReward) -> Result<RewardId> {
        if self.config.rewards.evaluator.as_ref() != Some(&msg.creator) {
            return UnauthorizedSnafu { message: format!("{} can't create rewards", msg.creator) }
                .fail();
        }
        if msg.amount == 0 {
            return InvalidRequestSnafu { message: "reward amount must be positive" }.fail();
        }
        let id = self.mutate("create_reward", |txn, _| {
            if AddressIndex::reward_id(&*txn, &msg.recipient)?.is_some() {
                return AlreadyExistsSnafu {
                    message: format!("reward for {} already exists", msg.recipient),
                }
                .fail();
            }
            let reward = Reward {
                creator: msg.creator.clone(),
                recipient: msg.recipient.clone(),
                amount: msg.amount,
                ..Reward::default()
            };
            let id = EntityStore::append(txn, reward)?;
            AddressIndex::set(txn, &LedgerKeys::reward_recipient_key(&msg.recipient), id.value())?;
            Ok(id)
        })?;
        info!(reward_id = id.value(), amount = msg.amount, "reward created");
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use gitledger_types::{Address, ErrorCode};

    use super::*;
    use crate::ledger::tests::ledger;

    fn reward(creator: &str, recipient: &str, amount: u64) -> CreateReward {
        CreateReward::builder().creator(creator).recipient(recipient).amount(amount).build()
    }

    #[test]
    fn test_only_evaluator_rewards() {
        let ledger = ledger();
        let err = ledger.create_reward(reward("gitopia1alice", "gitopia1bob", 10)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);

        let id = ledger.create_reward(reward("evaluator", "gitopia1bob", 10)).unwrap();
        let found = ledger.reward_by_recipient(&Address::new("gitopia1bob")).unwrap();
        assert_eq!(found.id, id);
        assert_eq!(found.amount, 10);
    }

    #[test]
    fn test_one_reward_per_recipient() {
        let ledger = ledger();
        ledger.create_reward(reward("evaluator", "gitopia1bob", 10)).unwrap();
        let err = ledger.create_reward(reward("evaluator", "gitopia1bob", 5)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AlreadyExists);
        assert_eq!(
            ledger.create_reward(reward("evaluator", "gitopia1carol", 0)).unwrap_err().code(),
            ErrorCode::InvalidRequest
        );
    }

    #[test]
    fn test_no_evaluator_configured() {
        let ledger = Ledger::in_memory();
        let err = ledger.create_reward(reward("evaluator", "gitopia1bob", 1)).unwrap_err();
        assert_eq!(err.code(), ErrorCode::Unauthorized);
    }
}
