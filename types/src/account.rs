use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};

use crate::{
    read_string, string_encode_size, write_string, MAX_ID_LENGTH, MAX_NAME_LENGTH,
    MAX_OWNED_ITEMS, STARTING_COINS,
};

/// Identifier of an account document in the remote store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for AccountId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Write for AccountId {
    fn write(&self, writer: &mut impl BufMut) {
        write_string(&self.0, writer);
    }
}

impl Read for AccountId {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self(read_string(reader, MAX_ID_LENGTH)?))
    }
}

impl EncodeSize for AccountId {
    fn encode_size(&self) -> usize {
        string_encode_size(&self.0)
    }
}

/// One user's economic state.
///
/// `coins` is the only spendable balance and never goes negative; `wealth`
/// and `charm` are monotone lifetime counters used for leveling.
/// `agency_balance` is present only for accounts with agent privilege.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub coins: u64,
    pub wealth: u64,
    pub charm: u64,
    pub agency_balance: Option<u64>,
    pub total_recharge: u64,
    pub vip_level: u8,
    pub owned_items: Vec<String>,
}

impl Account {
    /// Create a fresh account with starter balances.
    pub fn new(id: impl Into<AccountId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            coins: STARTING_COINS,
            wealth: 0,
            charm: 0,
            agency_balance: None,
            total_recharge: 0,
            vip_level: 0,
            owned_items: Vec::new(),
        }
    }

    /// Whether this account holds agent privilege.
    pub fn is_agent(&self) -> bool {
        self.agency_balance.is_some()
    }
}

impl Write for Account {
    fn write(&self, writer: &mut impl BufMut) {
        self.id.write(writer);
        write_string(&self.name, writer);
        self.coins.write(writer);
        self.wealth.write(writer);
        self.charm.write(writer);
        self.agency_balance.write(writer);
        self.total_recharge.write(writer);
        self.vip_level.write(writer);
        (self.owned_items.len() as u32).write(writer);
        for item in &self.owned_items {
            write_string(item, writer);
        }
    }
}

impl Read for Account {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        let id = AccountId::read(reader)?;
        let name = read_string(reader, MAX_NAME_LENGTH)?;
        let coins = u64::read(reader)?;
        let wealth = u64::read(reader)?;
        let charm = u64::read(reader)?;
        let agency_balance = Option::<u64>::read(reader)?;
        let total_recharge = u64::read(reader)?;
        let vip_level = u8::read(reader)?;
        let count = u32::read(reader)? as usize;
        if count > MAX_OWNED_ITEMS {
            return Err(Error::Invalid("Account", "too many owned items"));
        }
        let mut owned_items = Vec::with_capacity(count);
        for _ in 0..count {
            owned_items.push(read_string(reader, MAX_ID_LENGTH)?);
        }
        Ok(Self {
            id,
            name,
            coins,
            wealth,
            charm,
            agency_balance,
            total_recharge,
            vip_level,
            owned_items,
        })
    }
}

impl EncodeSize for Account {
    fn encode_size(&self) -> usize {
        self.id.encode_size()
            + string_encode_size(&self.name)
            + self.coins.encode_size()
            + self.wealth.encode_size()
            + self.charm.encode_size()
            + self.agency_balance.encode_size()
            + self.total_recharge.encode_size()
            + self.vip_level.encode_size()
            + 4
            + self
                .owned_items
                .iter()
                .map(|item| string_encode_size(item))
                .sum::<usize>()
    }
}

/// Signed per-field balance deltas applied atomically to one account.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AccountDelta {
    pub coins: i64,
    pub wealth: i64,
    pub charm: i64,
    pub agency: i64,
    pub recharge: i64,
}

impl AccountDelta {
    /// Plain coin movement (positive credits, negative debits).
    pub fn coins(delta: i64) -> Self {
        Self {
            coins: delta,
            ..Self::default()
        }
    }

    /// A gift or game spend: coins leave, lifetime wealth grows by the same
    /// amount.
    pub fn gift_spend(total: u64) -> Self {
        Self {
            coins: -(total as i64),
            wealth: total as i64,
            ..Self::default()
        }
    }

    /// A purchase spend (store item, VIP tier); does not count toward wealth.
    pub fn purchase(price: u64) -> Self {
        Self::coins(-(price as i64))
    }

    /// Charm credited to a gift recipient.
    pub fn charm_credit(total: u64) -> Self {
        Self {
            charm: total as i64,
            ..Self::default()
        }
    }

    /// The agent-side leg of an agency transfer.
    pub fn agency_debit(amount: u64) -> Self {
        Self {
            agency: -(amount as i64),
            ..Self::default()
        }
    }

    /// The target-side leg of an agency transfer.
    pub fn recharge_credit(amount: u64) -> Self {
        Self {
            coins: amount as i64,
            recharge: amount as i64,
            ..Self::default()
        }
    }

    /// Merge two deltas applied to the same account.
    pub fn merge(self, other: Self) -> Self {
        Self {
            coins: self.coins + other.coins,
            wealth: self.wealth + other.wealth,
            charm: self.charm + other.charm,
            agency: self.agency + other.agency,
            recharge: self.recharge + other.recharge,
        }
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }
}

impl Write for AccountDelta {
    fn write(&self, writer: &mut impl BufMut) {
        self.coins.write(writer);
        self.wealth.write(writer);
        self.charm.write(writer);
        self.agency.write(writer);
        self.recharge.write(writer);
    }
}

impl Read for AccountDelta {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            coins: i64::read(reader)?,
            wealth: i64::read(reader)?,
            charm: i64::read(reader)?,
            agency: i64::read(reader)?,
            recharge: i64::read(reader)?,
        })
    }
}

impl EncodeSize for AccountDelta {
    fn encode_size(&self) -> usize {
        self.coins.encode_size()
            + self.wealth.encode_size()
            + self.charm.encode_size()
            + self.agency.encode_size()
            + self.recharge.encode_size()
    }
}

/// One agency recharge: the agent's pre-funded balance pays out coins to the
/// target account. Committed remotely as a single all-or-nothing write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferIntent {
    pub agent: AccountId,
    pub target: AccountId,
    pub amount: u64,
}

impl TransferIntent {
    /// The two per-account legs of this transfer.
    pub fn legs(&self) -> [(AccountId, AccountDelta); 2] {
        [
            (self.agent.clone(), AccountDelta::agency_debit(self.amount)),
            (
                self.target.clone(),
                AccountDelta::recharge_credit(self.amount),
            ),
        ]
    }
}

impl Write for TransferIntent {
    fn write(&self, writer: &mut impl BufMut) {
        self.agent.write(writer);
        self.target.write(writer);
        self.amount.write(writer);
    }
}

impl Read for TransferIntent {
    type Cfg = ();

    fn read_cfg(reader: &mut impl Buf, _: &Self::Cfg) -> Result<Self, Error> {
        Ok(Self {
            agent: AccountId::read(reader)?,
            target: AccountId::read(reader)?,
            amount: u64::read(reader)?,
        })
    }
}

impl EncodeSize for TransferIntent {
    fn encode_size(&self) -> usize {
        self.agent.encode_size() + self.target.encode_size() + self.amount.encode_size()
    }
}
