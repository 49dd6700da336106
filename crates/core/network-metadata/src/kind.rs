/// The blockchain-family classification tag assigned to a dataset.
///
/// Once classified, a dataset's kind is one of this fixed set; an absent
/// kind means the dataset is unclassified. The serialized tags are the
/// kebab-case strings stored in the metadata document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Kind {
    Evm,
    Solana,
    Substrate,
    Fuel,
    Tron,
    Bitcoin,
    HyperliquidFills,
    HyperliquidReplicaCmds,
}

impl Kind {
    /// Returns the serialized tag for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Evm => "evm",
            Kind::Solana => "solana",
            Kind::Substrate => "substrate",
            Kind::Fuel => "fuel",
            Kind::Tron => "tron",
            Kind::Bitcoin => "bitcoin",
            Kind::HyperliquidFills => "hyperliquid-fills",
            Kind::HyperliquidReplicaCmds => "hyperliquid-replica-cmds",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Kind {
    type Err = UnknownKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "evm" => Ok(Kind::Evm),
            "solana" => Ok(Kind::Solana),
            "substrate" => Ok(Kind::Substrate),
            "fuel" => Ok(Kind::Fuel),
            "tron" => Ok(Kind::Tron),
            "bitcoin" => Ok(Kind::Bitcoin),
            "hyperliquid-fills" => Ok(Kind::HyperliquidFills),
            "hyperliquid-replica-cmds" => Ok(Kind::HyperliquidReplicaCmds),
            _ => Err(UnknownKindError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unrecognized kind tag.
#[derive(Debug, thiserror::Error)]
#[error("unknown dataset kind '{0}'")]
pub struct UnknownKindError(String);

/// Whether a network is a production chain or a test deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    Mainnet,
    Testnet,
    Devnet,
}

impl NetworkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkType::Mainnet => "mainnet",
            NetworkType::Testnet => "testnet",
            NetworkType::Devnet => "devnet",
        }
    }
}

impl std::fmt::Display for NetworkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_tags_roundtrip() {
        let kinds = [
            Kind::Evm,
            Kind::Solana,
            Kind::Substrate,
            Kind::Fuel,
            Kind::Tron,
            Kind::Bitcoin,
            Kind::HyperliquidFills,
            Kind::HyperliquidReplicaCmds,
        ];

        for kind in kinds {
            let parsed: Kind = kind.as_str().parse().expect("tag should parse");
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn kind_serializes_as_kebab_case_tag() {
        let yaml = serde_yaml::to_string(&Kind::HyperliquidReplicaCmds).expect("should serialize");
        assert_eq!(yaml.trim(), "hyperliquid-replica-cmds");
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let result = "starknet".parse::<Kind>();
        assert!(result.is_err(), "starknet is not a classification kind");
    }
}
