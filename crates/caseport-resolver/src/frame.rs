use crate::Classification;
use caseport_ids::SourceId;
use caseport_ports::{CallMode, SourceField, SourceStep};
use caseport_schema::{Step, TestCase};
use std::collections::VecDeque;

/// Which step list of an item a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Block {
    Pre,
    Main,
    Post,
}

/// A call the frame is blocked on until the callee's frame closes.
#[derive(Debug, Clone)]
pub(crate) struct PendingCall {
    pub block: Block,
    pub callee: SourceId,
    pub mode: CallMode,
}

/// Item data that only touches shared resolver state once the frame closes.
#[derive(Debug, Default)]
pub(crate) struct Staged {
    /// Custom fields, one per name.
    pub fields: Vec<SourceField>,
    pub section_id: Option<SourceId>,
    pub section_path: Option<String>,
}

/// One item being converted.
///
/// The working copy is always a `TestCase`; it becomes a `SharedStep` when
/// the frame closes if `kind` says so.
#[derive(Debug)]
pub(crate) struct Frame {
    pub source_id: SourceId,
    pub kind: Classification,
    pub item: TestCase,
    pub staged: Staged,
    pub waiting: Option<PendingCall>,
    pending: VecDeque<(Block, SourceStep)>,
}

impl Frame {
    pub fn new(
        source_id: SourceId,
        kind: Classification,
        item: TestCase,
        staged: Staged,
        blocks: [(Block, Vec<SourceStep>); 3],
    ) -> Self {
        let mut pending = VecDeque::new();
        for (block, steps) in blocks {
            flatten(steps, block, &mut pending);
        }
        Self {
            source_id,
            kind,
            item,
            staged,
            waiting: None,
            pending,
        }
    }

    pub fn next_step(&mut self) -> Option<(Block, SourceStep)> {
        self.pending.pop_front()
    }

    pub fn extend(&mut self, block: Block, steps: impl IntoIterator<Item = Step>) {
        let target = match block {
            Block::Pre => &mut self.item.precondition_steps,
            Block::Main => &mut self.item.steps,
            Block::Post => &mut self.item.postcondition_steps,
        };
        target.extend(steps);
    }
}

/// Depth-first, source order. Grouping-only parents contribute nothing.
fn flatten(steps: Vec<SourceStep>, block: Block, out: &mut VecDeque<(Block, SourceStep)>) {
    for mut step in steps {
        let container = step.is_container();
        let children = std::mem::take(&mut step.children);
        if !container {
            out.push_back((block, step));
        }
        flatten(children, block, out);
    }
}
