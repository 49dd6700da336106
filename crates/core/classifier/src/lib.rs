//! Rule engine that classifies a dataset by probing its capabilities.
//!
//! A dataset's kind is inferred from which streaming capabilities it
//! serves: each rule lists probes that must succeed and probes that must
//! fail, and the first rule whose probes all agree wins. Probes are
//! memoized within a single classification pass, so a capability shared
//! by several rules is only queried once per dataset.

use std::collections::HashMap;

use network_metadata::{BlockNum, Kind};

/// The query family named in a capability probe request.
///
/// This is a wire-level notion: it covers families a probe can ask about
/// even when no classification kind maps onto them directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryType {
    Evm,
    Solana,
    Substrate,
    Fuel,
    Tron,
    Starknet,
    Bitcoin,
    Hyperliquid,
}

impl QueryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Evm => "evm",
            QueryType::Solana => "solana",
            QueryType::Substrate => "substrate",
            QueryType::Fuel => "fuel",
            QueryType::Tron => "tron",
            QueryType::Starknet => "starknet",
            QueryType::Bitcoin => "bitcoin",
            QueryType::Hyperliquid => "hyperliquid",
        }
    }
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single capability check: does the dataset serve `capability` under
/// the `query` family?
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Probe {
    pub query: QueryType,
    pub capability: &'static str,
}

const fn probe(query: QueryType, capability: &'static str) -> Probe {
    Probe { query, capability }
}

/// One classification rule: assigns `kind` when every probe in `all`
/// succeeds and every probe in `none` fails.
#[derive(Debug, Clone, Copy)]
pub struct Rule {
    pub kind: Kind,
    pub all: &'static [Probe],
    pub none: &'static [Probe],
}

/// The classification rules, in evaluation order. Order matters: EVM is
/// checked first and carries negative probes that keep EVM-compatible
/// wrappers of other families from matching it.
pub const RULES: &[Rule] = &[
    Rule {
        kind: Kind::Evm,
        all: &[probe(QueryType::Evm, "transactions")],
        none: &[
            probe(QueryType::Solana, "instructions"),
            probe(QueryType::Starknet, "events"),
            probe(QueryType::Fuel, "receipts"),
            probe(QueryType::Tron, "internalTransactions"),
        ],
    },
    Rule {
        kind: Kind::Solana,
        all: &[
            probe(QueryType::Solana, "instructions"),
            probe(QueryType::Solana, "tokenBalances"),
        ],
        none: &[],
    },
    Rule {
        kind: Kind::Substrate,
        all: &[
            probe(QueryType::Substrate, "events"),
            probe(QueryType::Substrate, "calls"),
        ],
        none: &[],
    },
    Rule {
        kind: Kind::Fuel,
        all: &[
            probe(QueryType::Fuel, "receipts"),
            probe(QueryType::Fuel, "inputs"),
        ],
        none: &[],
    },
    Rule {
        kind: Kind::Tron,
        all: &[
            probe(QueryType::Tron, "transactions"),
            probe(QueryType::Tron, "internalTransactions"),
        ],
        none: &[],
    },
    Rule {
        kind: Kind::HyperliquidFills,
        all: &[probe(QueryType::Hyperliquid, "fills")],
        none: &[],
    },
    Rule {
        kind: Kind::HyperliquidReplicaCmds,
        all: &[probe(QueryType::Hyperliquid, "orderActions")],
        none: &[],
    },
    Rule {
        kind: Kind::Bitcoin,
        all: &[probe(QueryType::Bitcoin, "inputs")],
        none: &[probe(QueryType::Fuel, "receipts")],
    },
];

/// Answers capability probes against a single dataset.
pub trait CapabilityProber {
    type Error;

    /// Whether the dataset serves `capability` under the `query` family
    /// at the given reference block.
    async fn probe(
        &self,
        query: QueryType,
        capability: &'static str,
        reference: BlockNum,
    ) -> Result<bool, Self::Error>;
}

/// Classifies one dataset by evaluating [`RULES`] in order against the
/// given prober.
///
/// Probes are evaluated sequentially with short-circuiting and memoized
/// across rules, so each distinct (query, capability) pair is sent at
/// most once. Returns `None` when no rule matches.
///
/// # Errors
///
/// The first probe failure aborts the pass: a partial answer could
/// misclassify the dataset.
pub async fn classify<P: CapabilityProber>(
    prober: &P,
    reference: BlockNum,
) -> Result<Option<Kind>, P::Error> {
    let mut memo: HashMap<Probe, bool> = HashMap::new();

    for rule in RULES {
        if rule_matches(prober, rule, reference, &mut memo).await? {
            return Ok(Some(rule.kind));
        }
    }

    Ok(None)
}

async fn rule_matches<P: CapabilityProber>(
    prober: &P,
    rule: &Rule,
    reference: BlockNum,
    memo: &mut HashMap<Probe, bool>,
) -> Result<bool, P::Error> {
    for required in rule.all {
        if !check(prober, *required, reference, memo).await? {
            return Ok(false);
        }
    }
    for excluded in rule.none {
        if check(prober, *excluded, reference, memo).await? {
            return Ok(false);
        }
    }
    Ok(true)
}

async fn check<P: CapabilityProber>(
    prober: &P,
    probe: Probe,
    reference: BlockNum,
    memo: &mut HashMap<Probe, bool>,
) -> Result<bool, P::Error> {
    if let Some(answer) = memo.get(&probe) {
        return Ok(*answer);
    }

    let answer = prober.probe(probe.query, probe.capability, reference).await?;
    memo.insert(probe, answer);

    Ok(answer)
}
