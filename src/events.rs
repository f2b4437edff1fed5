/// A schema-decoded program event recovered from a transaction's logs.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramEvent {
    /// Event discriminator name (e.g. `"CreatedOrder"`).
    pub name: String,
    /// Decoded event fields.
    pub fields: serde_json::Value,
}

/// Log decoder bound to one program's event schema.
///
/// Constructed once per program and passed into the pipeline explicitly,
/// so reconstruction stays testable with synthetic schemas.
pub trait EventDecoder {
    /// Decode every event the bound program emitted in `log_messages`.
    /// Lines the schema does not recognize are ignored.
    fn decode_events(&self, log_messages: &[String]) -> Vec<ProgramEvent>;
}
