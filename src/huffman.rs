//! Huffman code construction and bit-trie matching
//!
//! Classic bottom-up merge over a min-heap. Leaves are seeded in table order
//! and every node's arena index is its insertion sequence, so equal weights
//! pop first-in first-out and a given table always yields the same codes.
//! The merge arena is kept afterwards as the decode trie.

use std::borrow::Borrow;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use tracing::debug;

use crate::bitio::{BitSink, BitSource};
use crate::error::{CodecError, Result};
use crate::frequency::{FrequencyTable, Symbol};

/// Longest code the 64-bit code word can carry.
pub const MAX_CODE_LEN: u8 = 64;

const ABSENT: u32 = u32::MAX;

/// A code word: the low `len` bits of `bits`, sent most significant first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Code {
    bits: u64,
    len: u8,
}

impl Code {
    pub fn bits(&self) -> u64 {
        self.bits
    }

    pub fn len(&self) -> u8 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when `self` is a proper or equal bit-prefix of `other`.
    pub fn is_prefix_of(&self, other: &Code) -> bool {
        self.len <= other.len
            && other.bits.checked_shr(u32::from(other.len - self.len)).unwrap_or(0) == self.bits
    }

    pub fn write(&self, sink: &mut BitSink) -> Result<()> {
        sink.write_bits(self.bits, u32::from(self.len))
    }

    fn child(self, bit: u64) -> Result<Code> {
        if self.len == MAX_CODE_LEN {
            return Err(CodecError::InvalidAlphabet(format!(
                "code length exceeds {MAX_CODE_LEN} bits"
            )));
        }
        Ok(Code {
            bits: (self.bits << 1) | bit,
            len: self.len + 1,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Node {
    Leaf(u32),
    Branch([u32; 2]),
}

/// Per-symbol codes plus the trie that inverts them.
#[derive(Debug, Clone)]
pub struct HuffmanCode<S: Symbol> {
    symbols: Vec<S>,
    codes: Vec<Code>,
    index: HashMap<S, u32>,
    nodes: Vec<Node>,
    root: u32,
    escape: u32,
    max_len: u8,
}

impl<S: Symbol> HuffmanCode<S> {
    pub fn build(table: &FrequencyTable<S>) -> Result<Self> {
        Self::from_weights(
            table.iter().map(|(symbol, weight)| (symbol.clone(), weight)),
            table.escape(),
        )
    }

    /// Build from raw (symbol, weight) entries in their given order. Zero
    /// weights are skipped; an empty alphabet or one without `escape` fails.
    pub fn from_weights<I>(entries: I, escape: &S) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
    {
        let mut symbols = Vec::new();
        let mut weights = Vec::new();
        let mut index = HashMap::new();
        for (symbol, weight) in entries {
            if weight == 0 {
                continue;
            }
            let slot = u32::try_from(symbols.len())
                .ok()
                .filter(|&slot| slot < ABSENT / 2)
                .ok_or_else(|| CodecError::InvalidAlphabet("too many symbols".into()))?;
            if index.insert(symbol.clone(), slot).is_some() {
                return Err(CodecError::InvalidAlphabet(format!(
                    "duplicate symbol {symbol:?}"
                )));
            }
            symbols.push(symbol);
            weights.push(u128::from(weight));
        }
        if symbols.is_empty() {
            return Err(CodecError::InvalidAlphabet(
                "no symbols with positive weight".into(),
            ));
        }
        let escape = *index.get(escape).ok_or_else(|| {
            CodecError::InvalidAlphabet(format!("escape symbol {escape:?} is not in the alphabet"))
        })?;

        let mut nodes: Vec<Node> = (0..symbols.len() as u32).map(Node::Leaf).collect();
        let mut heap: BinaryHeap<Reverse<(u128, u32)>> = weights
            .iter()
            .enumerate()
            .map(|(i, &weight)| Reverse((weight, i as u32)))
            .collect();

        let mut root = loop {
            let Reverse((weight, left)) = heap
                .pop()
                .ok_or_else(|| CodecError::InvalidAlphabet("empty merge heap".into()))?;
            let Some(Reverse((other, right))) = heap.pop() else {
                break left;
            };
            let merged = nodes.len() as u32;
            nodes.push(Node::Branch([left, right]));
            heap.push(Reverse((weight + other, merged)));
        };
        // a lone symbol still costs one bit
        if let Node::Leaf(_) = nodes[root as usize] {
            nodes.push(Node::Branch([root, ABSENT]));
            root = nodes.len() as u32 - 1;
        }

        let mut codes = vec![Code { bits: 0, len: 0 }; symbols.len()];
        let mut max_len = 0;
        let mut stack = vec![(root, Code { bits: 0, len: 0 })];
        while let Some((node, code)) = stack.pop() {
            match nodes[node as usize] {
                Node::Leaf(symbol) => {
                    codes[symbol as usize] = code;
                    max_len = max_len.max(code.len);
                }
                Node::Branch([zero, one]) => {
                    if one != ABSENT {
                        stack.push((one, code.child(1)?));
                    }
                    stack.push((zero, code.child(0)?));
                }
            }
        }

        debug!(symbols = symbols.len(), max_code_len = max_len, "built huffman code");
        Ok(Self {
            symbols,
            codes,
            index,
            nodes,
            root,
            escape,
            max_len,
        })
    }

    pub fn code_of<Q>(&self, symbol: &Q) -> Option<Code>
    where
        S: Borrow<Q>,
        Q: std::hash::Hash + Eq + ?Sized,
    {
        self.index.get(symbol).map(|&i| self.codes[i as usize])
    }

    pub fn escape_code(&self) -> Code {
        self.codes[self.escape as usize]
    }

    pub fn escape_symbol(&self) -> &S {
        &self.symbols[self.escape as usize]
    }

    pub fn is_escape<Q>(&self, symbol: &Q) -> bool
    where
        S: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let escape: &Q = self.escape_symbol().borrow();
        escape == symbol
    }

    pub fn is_escape_index(&self, index: u32) -> bool {
        index == self.escape
    }

    pub fn symbol(&self, index: u32) -> Option<&S> {
        self.symbols.get(index as usize)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn max_code_len(&self) -> u8 {
        self.max_len
    }

    /// (symbol, code) pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&S, Code)> + '_ {
        self.symbols.iter().zip(self.codes.iter().copied())
    }

    /// Walk the trie one bit at a time until a leaf; returns the symbol index.
    pub fn read_index(&self, source: &mut BitSource<'_>) -> Result<u32> {
        let mut node = self.root;
        loop {
            match self.nodes[node as usize] {
                Node::Leaf(symbol) => return Ok(symbol),
                Node::Branch(children) => {
                    node = children[usize::from(source.read_bit()?)];
                    if node == ABSENT {
                        return Err(dangling());
                    }
                }
            }
        }
    }

    pub fn matcher(&self) -> Matcher<'_, S> {
        Matcher {
            code: self,
            node: self.root,
        }
    }
}

fn dangling() -> CodecError {
    CodecError::CorruptStream("bit pattern matches no code".into())
}

/// Result of feeding one bit to a [`Matcher`].
#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a, S> {
    Descend,
    Resolved(&'a S),
}

/// Incremental decoder for callers that receive bits one at a time.
pub struct Matcher<'a, S: Symbol> {
    code: &'a HuffmanCode<S>,
    node: u32,
}

impl<'a, S: Symbol> Matcher<'a, S> {
    /// Consume one bit. After a symbol resolves the matcher restarts at the root.
    pub fn step(&mut self, bit: bool) -> Result<Step<'a, S>> {
        let Node::Branch(children) = self.code.nodes[self.node as usize] else {
            return Err(dangling());
        };
        let next = children[usize::from(bit)];
        if next == ABSENT {
            self.node = self.code.root;
            return Err(dangling());
        }
        match self.code.nodes[next as usize] {
            Node::Leaf(symbol) => {
                self.node = self.code.root;
                Ok(Step::Resolved(&self.code.symbols[symbol as usize]))
            }
            Node::Branch(_) => {
                self.node = next;
                Ok(Step::Descend)
            }
        }
    }

    /// True when no partial code is pending.
    pub fn at_boundary(&self) -> bool {
        self.node == self.code.root
    }
}
