//! Call batching — which calls are safe to run concurrently.
//!
//! Reads never conflict with each other and may run alongside one in-flight
//! write per system; two writes against the same system must never overlap.
//! Writes against different systems are independent.

use std::collections::{HashMap, VecDeque};

use super::call::ToolCall;

/// Partition calls into ordered batches; calls within a batch may run
/// concurrently, batches run strictly one after another.
///
/// Batch 1 holds every read plus the first write of each system; each later
/// batch takes the next not-yet-scheduled write from every system that still
/// has one. Batch composition is deterministic: reads keep submission order,
/// write slots follow each system's first appearance.
pub fn classify(calls: Vec<ToolCall>) -> Vec<Vec<ToolCall>> {
    let mut reads: Vec<ToolCall> = Vec::new();
    let mut system_order: Vec<String> = Vec::new();
    let mut writes: HashMap<String, VecDeque<ToolCall>> = HashMap::new();

    for call in calls {
        if call.hint.is_read() {
            reads.push(call);
        } else {
            let key = call.effective_system_key().to_string();
            if !writes.contains_key(&key) {
                system_order.push(key.clone());
            }
            writes.entry(key).or_default().push_back(call);
        }
    }

    let mut batches: Vec<Vec<ToolCall>> = Vec::new();

    let mut first = reads;
    for key in &system_order {
        if let Some(write) = writes.get_mut(key).and_then(VecDeque::pop_front) {
            first.push(write);
        }
    }
    if !first.is_empty() {
        batches.push(first);
    }

    loop {
        let mut round: Vec<ToolCall> = Vec::new();
        for key in &system_order {
            if let Some(write) = writes.get_mut(key).and_then(VecDeque::pop_front) {
                round.push(write);
            }
        }
        if round.is_empty() {
            break;
        }
        batches.push(round);
    }

    batches
}

// =============================================================================
// Tests
// =============================================================================
