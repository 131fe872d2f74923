//! Filtered block query builder.
//!
//! A [`BlockFilter`] is translated into an explicit [`BlockQuery`] plan:
//! narrowing predicates, the list of relations to attach, ordering and
//! pagination. Building is pure; [`crate::BlockRepository::get_blocks`]
//! executes the plan against the relational store.

use std::fmt;

use tonidx_types::{Block, BlockFilter, BlockId, Hash256};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Predicate {
    /// `workchain = ? AND shard = ? AND seq_no = ?`
    Identity(BlockId),
    /// `workchain = ?`
    Workchain(i32),
    /// `file_hash = ?`
    FileHash(Hash256),
}

impl Predicate {
    pub fn matches(&self, block: &Block) -> bool {
        match self {
            Self::Identity(id) => block.id == *id,
            Self::Workchain(wc) => block.id.workchain == *wc,
            Self::FileHash(hash) => block.file_hash == *hash,
        }
    }
}

/// Where a transaction or message relation is attached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scope {
    /// The selected blocks themselves.
    Root,
    /// Every shard block loaded under the selected blocks.
    Shards,
}

impl Scope {
    fn prefix(self) -> &'static str {
        match self {
            Self::Root => "",
            Self::Shards => "Shards.",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Relation {
    Master,
    Shards,
    Transactions(Scope),
    InMsg(Scope),
    /// Outgoing messages, restricted to `incoming = false` so the incoming
    /// message of a transaction is not loaded twice.
    OutMsg(Scope),
}

impl Relation {
    /// Relation path, e.g. `Shards.Transactions.OutMsg`.
    pub fn path(&self) -> String {
        match self {
            Self::Master => "Master".to_string(),
            Self::Shards => "Shards".to_string(),
            Self::Transactions(scope) => format!("{}Transactions", scope.prefix()),
            Self::InMsg(scope) => format!("{}Transactions.InMsg", scope.prefix()),
            Self::OutMsg(scope) => format!("{}Transactions.OutMsg", scope.prefix()),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())?;
        if let Self::OutMsg(_) = self {
            f.write_str(" (incoming = false)")?;
        }
        Ok(())
    }
}

/// Which relations to load eagerly.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EagerLoad {
    pub master: bool,
    pub shards: bool,
    pub transactions: bool,
    /// Only meaningful together with `transactions`.
    pub messages: bool,
}

impl From<&BlockFilter> for EagerLoad {
    fn from(f: &BlockFilter) -> Self {
        Self {
            master: f.with_master,
            shards: f.with_shards,
            transactions: f.with_transactions,
            messages: f.with_transactions && f.with_transaction_messages,
        }
    }
}

impl EagerLoad {
    /// Relations in the order they must be attached: a relation path is
    /// always preceded by the relation it hangs off.
    pub fn relations(&self) -> Vec<Relation> {
        let mut relations = Vec::new();
        if self.master {
            relations.push(Relation::Master);
        }
        if self.shards {
            relations.push(Relation::Shards);
        }
        if self.transactions {
            push_transactions(&mut relations, Scope::Root, self.messages);
            if self.shards {
                push_transactions(&mut relations, Scope::Shards, self.messages);
            }
        }
        relations
    }
}

fn push_transactions(relations: &mut Vec<Relation>, scope: Scope, with_messages: bool) {
    relations.push(Relation::Transactions(scope));
    if with_messages {
        relations.push(Relation::InMsg(scope));
        relations.push(Relation::OutMsg(scope));
    }
}

/// An executable block query plan. Results are always ordered by `seq_no`
/// descending; `offset` and `limit` apply after ordering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockQuery {
    pub predicates: Vec<Predicate>,
    pub eager: EagerLoad,
    pub relations: Vec<Relation>,
    pub offset: usize,
    pub limit: usize,
}

impl BlockQuery {
    pub fn build(filter: &BlockFilter, offset: usize, limit: usize) -> Self {
        let mut predicates = Vec::new();

        // Identity and workchain are mutually exclusive, identity wins.
        if let Some(id) = filter.id {
            predicates.push(Predicate::Identity(id));
        } else if let Some(wc) = filter.workchain {
            predicates.push(Predicate::Workchain(wc));
        }

        if let Some(hash) = filter.file_hash {
            predicates.push(Predicate::FileHash(hash));
        }

        let eager = EagerLoad::from(filter);
        Self {
            predicates,
            relations: eager.relations(),
            eager,
            offset,
            limit,
        }
    }

    /// The predicate that selects the access path (primary key or index).
    pub fn narrowing(&self) -> Option<&Predicate> {
        self.predicates
            .iter()
            .find(|p| matches!(p, Predicate::Identity(_) | Predicate::Workchain(_)))
    }

    pub fn matches(&self, block: &Block) -> bool {
        self.predicates.iter().all(|p| p.matches(block))
    }
}
