//! Tables of the shared `ethereum` schema.

use crate::select::Select;

pub const SCHEMA_NAME: &str = "ethereum";

pub const BLOCKS: &str = "blocks";
pub const TRANSACTIONS: &str = "transactions";
pub const LOGS: &str = "logs";
pub const TRACES: &str = "traces";
pub const CONTRACTS: &str = "contracts";
pub const LATEST_INTERACTIONS: &str = "latest_interactions";

pub const TABLES: [&str; 6] = [
    BLOCKS,
    TRANSACTIONS,
    LOGS,
    TRACES,
    CONTRACTS,
    LATEST_INTERACTIONS,
];

fn table(name: &str) -> Select {
    Select::table(name).with_schema(SCHEMA_NAME)
}

pub fn blocks() -> Select {
    table(BLOCKS)
}

pub fn transactions() -> Select {
    table(TRANSACTIONS)
}

pub fn logs() -> Select {
    table(LOGS)
}

pub fn traces() -> Select {
    table(TRACES)
}

pub fn contracts() -> Select {
    table(CONTRACTS)
}

pub fn latest_interactions() -> Select {
    table(LATEST_INTERACTIONS)
}
