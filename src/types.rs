/// One entry of a `getSignaturesForAddress` history page, newest first.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct SignatureInfo {
    /// Transaction signature (base58).
    pub signature: String,
    /// Unix timestamp of the containing block, when the node knows it.
    pub block_time: Option<i64>,
}

/// A retrieved transaction body, reduced to the parts the pipeline reads.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TransactionRecord {
    /// Transaction signature (base58).
    pub signature: String,
    /// Raw program log lines, in emission order.
    pub log_messages: Vec<String>,
    /// Inner instructions grouped by invoking top-level instruction.
    #[serde(default)]
    pub inner_instructions: Vec<InnerInstructionGroup>,
    /// Unix timestamp of the containing block, when the node knows it.
    pub block_time: Option<i64>,
}

/// Inner instructions spawned by one top-level instruction.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct InnerInstructionGroup {
    /// Index of the invoking top-level instruction within the transaction.
    pub index: u32,
    /// Parsed inner instructions, in execution order.
    pub instructions: Vec<ParsedInstruction>,
}

/// One jsonParsed inner instruction.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct ParsedInstruction {
    /// Program that executed the instruction.
    pub program_id: String,
    /// Parsed instruction discriminator (e.g. `"transfer"`, `"transferChecked"`).
    pub kind: String,
    /// Parsed instruction payload; shape depends on `kind`.
    #[serde(default)]
    pub info: serde_json::Value,
}
