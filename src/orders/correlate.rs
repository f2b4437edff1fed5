/// Suffix of a top-level program invocation log line.
const TOP_LEVEL_INVOKE: &str = "invoke [1]";

/// Recover the top-level instruction index behind each fulfillment by
/// walking the transaction's log lines in order.
///
/// Log ordering is the only linkage the chain guarantees between an emitted
/// event and the instruction that produced it: every `"Program <id> invoke
/// [1]"` line opens the next top-level instruction, and an
/// `instruction_marker` line seen while the target program's invocation is
/// open closes it and yields its index. Nested invocations (`invoke [2]`
/// and deeper) do not advance the counter.
///
/// The returned indexes are positional: the caller must check their count
/// against the fulfillment-event count before pairing them up.
pub fn invocation_indexes(
    log_messages: &[String],
    program_address: &str,
    instruction_marker: &str,
) -> Vec<u32> {
    let mut next_index: u32 = 0;
    let mut open: Option<u32> = None;
    let mut indexes = Vec::new();

    for line in log_messages {
        if line.ends_with(TOP_LEVEL_INVOKE) {
            let index = next_index;
            next_index += 1;
            if line.contains(program_address) {
                open = Some(index);
            }
        } else if line.contains(instruction_marker) {
            if let Some(index) = open.take() {
                indexes.push(index);
            }
        }
    }

    indexes
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROGRAM: &str = "dst1111111111111111111111111111111111111111";
    const MARKER: &str = "Instruction: FulfillOrder";

    fn logs(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| (*l).to_string()).collect()
    }

    #[test]
    fn single_fulfillment_at_first_instruction() {
        let logs = logs(&[
            "Program dst1111111111111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: FulfillOrder",
            "Program dst1111111111111111111111111111111111111111 success",
        ]);
        assert_eq!(invocation_indexes(&logs, PROGRAM, MARKER), vec![0]);
    }

    #[test]
    fn preceding_instructions_shift_the_index() {
        let logs = logs(&[
            "Program ComputeBudget111111111111111111111111111111 invoke [1]",
            "Program ComputeBudget111111111111111111111111111111 success",
            "Program dst1111111111111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: FulfillOrder",
            "Program dst1111111111111111111111111111111111111111 success",
        ]);
        assert_eq!(invocation_indexes(&logs, PROGRAM, MARKER), vec![1]);
    }

    #[test]
    fn two_fulfillments_yield_two_indexes() {
        let logs = logs(&[
            "Program dst1111111111111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: FulfillOrder",
            "Program dst1111111111111111111111111111111111111111 success",
            "Program 11111111111111111111111111111111 invoke [1]",
            "Program 11111111111111111111111111111111 success",
            "Program dst1111111111111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: FulfillOrder",
            "Program dst1111111111111111111111111111111111111111 success",
        ]);
        assert_eq!(invocation_indexes(&logs, PROGRAM, MARKER), vec![0, 2]);
    }

    #[test]
    fn nested_invocations_do_not_advance_the_counter() {
        let logs = logs(&[
            "Program dst1111111111111111111111111111111111111111 invoke [1]",
            "Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA invoke [2]",
            "Program TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA success",
            "Program log: Instruction: FulfillOrder",
            "Program dst1111111111111111111111111111111111111111 success",
        ]);
        assert_eq!(invocation_indexes(&logs, PROGRAM, MARKER), vec![0]);
    }

    #[test]
    fn marker_without_open_invocation_is_ignored() {
        let logs = logs(&[
            "Program othr111111111111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: FulfillOrder",
            "Program othr111111111111111111111111111111111111111 success",
        ]);
        assert_eq!(invocation_indexes(&logs, PROGRAM, MARKER), Vec::<u32>::new());
    }

    #[test]
    fn repeated_marker_counts_once_per_invocation() {
        let logs = logs(&[
            "Program dst1111111111111111111111111111111111111111 invoke [1]",
            "Program log: Instruction: FulfillOrder",
            "Program log: Instruction: FulfillOrder",
            "Program dst1111111111111111111111111111111111111111 success",
        ]);
        assert_eq!(invocation_indexes(&logs, PROGRAM, MARKER), vec![0]);
    }

    #[test]
    fn no_matching_lines_yield_nothing() {
        let logs = logs(&[
            "Program 11111111111111111111111111111111 invoke [1]",
            "Program 11111111111111111111111111111111 success",
        ]);
        assert_eq!(invocation_indexes(&logs, PROGRAM, MARKER), Vec::<u32>::new());
    }
}
