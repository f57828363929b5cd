//! Plan types: parsed steps, tool names, and the routing request body.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Hard upper bound on the number of steps a single plan may contain.
pub const MAX_PLAN_STEPS: usize = 10;

/// The tools a plan step may invoke.
///
/// All three route to the same routing capability; the variant only records
/// why the step is being taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ToolName {
    CrossChain,
    SameChainOther,
    SameChainSelf,
}

impl ToolName {
    /// Name the planner is instructed to emit.
    pub fn planner_name(&self) -> &'static str {
        match self {
            ToolName::CrossChain => "Optimal_Path_CrossChain",
            ToolName::SameChainOther => "Optimal_Path_SameChainOther",
            ToolName::SameChainSelf => "Optimal_Path_SameChainSelf",
        }
    }

    /// Human-readable reason for taking a step with this tool.
    pub fn reason(&self) -> &'static str {
        match self {
            ToolName::CrossChain => "cross-chain transfer",
            ToolName::SameChainOther => "same-chain transfer to another address",
            ToolName::SameChainSelf => "same-chain swap to self",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolName::CrossChain => write!(f, "CrossChain"),
            ToolName::SameChainOther => write!(f, "SameChainOther"),
            ToolName::SameChainSelf => write!(f, "SameChainSelf"),
        }
    }
}

impl FromStr for ToolName {
    type Err = String;

    /// Accepts both the planner spelling (`Optimal_Path_CrossChain`) and the
    /// bare variant name (`CrossChain`). Matching is exact otherwise.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_prefix("Optimal_Path_").unwrap_or(s);
        match bare {
            "CrossChain" => Ok(ToolName::CrossChain),
            "SameChainOther" => Ok(ToolName::SameChainOther),
            "SameChainSelf" => Ok(ToolName::SameChainSelf),
            _ => Err(s.to_string()),
        }
    }
}

/// One planned unit of work. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub description: String,
    pub step_id: String,
    pub tool_name: ToolName,
    /// Kept verbatim until execution; may reference earlier step ids.
    pub raw_args: String,
}

/// Tokens the routing service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Token {
    Usdc,
    Usdt,
    Eth,
}

impl Token {
    pub const ALL: [Token; 3] = [Token::Usdc, Token::Usdt, Token::Eth];

    pub fn as_str(&self) -> &'static str {
        match self {
            Token::Usdc => "USDC",
            Token::Usdt => "USDT",
            Token::Eth => "ETH",
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Token {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USDC" => Ok(Token::Usdc),
            "USDT" => Ok(Token::Usdt),
            "ETH" => Ok(Token::Eth),
            other => Err(format!(
                "unsupported token '{other}' (supported: USDC, USDT, ETH)"
            )),
        }
    }
}

/// Chains the routing service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Chain {
    Polygon,
    Base,
    Avalanche,
}

impl Chain {
    pub const ALL: [Chain; 3] = [Chain::Polygon, Chain::Base, Chain::Avalanche];

    pub fn as_str(&self) -> &'static str {
        match self {
            Chain::Polygon => "POLYGON",
            Chain::Base => "BASE",
            Chain::Avalanche => "AVALANCHE",
        }
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Chain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "POLYGON" => Ok(Chain::Polygon),
            "BASE" => Ok(Chain::Base),
            "AVALANCHE" => Ok(Chain::Avalanche),
            other => Err(format!(
                "unsupported chain '{other}' (supported: POLYGON, BASE, AVALANCHE)"
            )),
        }
    }
}

/// JSON body sent to the routing service for one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub from_token: Token,
    pub user_address: String,
    pub to_token: Token,
    pub receiver_address: String,
    pub from_chain_name: Chain,
    pub to_chain_name: Chain,
    pub input_amount: String,
}
