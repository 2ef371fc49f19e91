use super::lowering::FUNC_LABEL_PREFIX;
use super::tac::{Instruction, Opcode};
use std::collections::{BTreeSet, HashMap};

pub type BlockId = usize;

/// A maximal straight-line run of instructions, `instrs[start..end]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: BlockId,
    start: usize,
    end: usize,
    label: Option<String>,
    successors: Vec<BlockId>,
}

impl Block {
    pub fn get_id(&self) -> BlockId {
        self.id
    }

    pub fn get_label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn get_range(&self) -> std::ops::Range<usize> {
        self.start..self.end
    }

    pub fn get_successors(&self) -> &[BlockId] {
        &self.successors
    }
}

/// Basic-block graph over a flat TAC list. Calls are not edges; every
/// `func_*` block is an entry of its own.
#[derive(Debug)]
pub struct Cfg {
    blocks: Vec<Block>,
    entries: Vec<BlockId>,
}

impl Cfg {
    pub fn new(instrs: &[Instruction]) -> Self {
        let mut leaders = BTreeSet::new();
        leaders.insert(0);

        for (i, instr) in instrs.iter().enumerate() {
            match instr.op {
                Opcode::Label => {
                    leaders.insert(i);
                }
                Opcode::Goto | Opcode::IfFalse | Opcode::Return => {
                    leaders.insert(i + 1);
                }
                _ => {}
            }
        }

        let starts: Vec<usize> = leaders.into_iter().filter(|&i| i < instrs.len()).collect();
        let mut blocks = vec![];
        let mut label_to_block = HashMap::new();

        for (id, &start) in starts.iter().enumerate() {
            let end = starts.get(id + 1).copied().unwrap_or(instrs.len());
            let label = instrs[start].label_name().map(str::to_string);

            if let Some(label) = &label {
                label_to_block.insert(label.clone(), id);
            }

            blocks.push(Block {
                id,
                start,
                end,
                label,
                successors: vec![],
            });
        }

        let block_count = blocks.len();
        for block in blocks.iter_mut() {
            let fallthrough = (block.id + 1 < block_count).then_some(block.id + 1);
            let Some(last) = instrs[block.start..block.end].last() else {
                continue;
            };

            let target = last
                .jump_target()
                .and_then(|label| label_to_block.get(label).copied());

            block.successors = match last.op {
                Opcode::Goto => target.into_iter().collect(),
                Opcode::IfFalse => fallthrough.into_iter().chain(target).collect(),
                Opcode::Return => vec![],
                _ => fallthrough.into_iter().collect(),
            };
            block.successors.dedup();
        }

        let mut entries = vec![];
        if !blocks.is_empty() {
            entries.push(0);
        }
        entries.extend(
            blocks
                .iter()
                .filter(|b| {
                    b.label
                        .as_deref()
                        .is_some_and(|l| l.starts_with(FUNC_LABEL_PREFIX))
                })
                .map(|b| b.id),
        );

        Self { blocks, entries }
    }

    pub fn get_blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn get_entries(&self) -> &[BlockId] {
        &self.entries
    }

    /// Blocks that no entry can reach.
    pub fn unreachable_blocks(&self) -> BTreeSet<BlockId> {
        let mut seen = BTreeSet::new();
        let mut stack: Vec<BlockId> = self.entries.clone();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }

            stack.extend(self.blocks[id].successors.iter().copied());
        }

        (0..self.blocks.len()).filter(|id| !seen.contains(id)).collect()
    }
}
