//! Round-by-round record of a block passing through DES or 3DES.
//!
//! 3DES is traced as three separate 16-round passes (E under K1, D under K2, E under K3)
//! rather than one 48-round run, since the middle pass runs its schedule backwards.

use std::fmt;

use crate::block::Block;
use crate::des::{des_block_operate, Des, HalfBlock};
use crate::des3::TripleDes;
use crate::key::{Key64, TripleKey};
use crate::key_schedule::{Direction, Subkey};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    /// 1-based round number.
    pub round: usize,
    pub left: HalfBlock,
    pub right: HalfBlock,
    pub subkey: Subkey
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassTrace {
    /// 1-based position of this pass in the cipher.
    pub pass: usize,
    /// Which key (1, 2 or 3) the pass ran under.
    pub key_index: usize,
    pub direction: Direction,
    pub input: Block,
    pub rounds: Vec<RoundState>,
    pub output: Block
}

fn trace_pass(cipher: &Des, input: &Block, direction: Direction, pass: usize, key_index: usize) -> PassTrace {
    let mut rounds = Vec::with_capacity(16);
    let output = des_block_operate(input, cipher.schedule(), direction, |round, left, right, subkey| {
        rounds.push(RoundState { round: round + 1, left: *left, right: *right, subkey: *subkey });
    });

    log::trace!("pass {} ({:?} under K{}) finished after {} rounds", pass, direction, key_index, rounds.len());
    PassTrace { pass, key_index, direction, input: *input, rounds, output }
}

pub fn trace_des(block: &Block, key: &Key64, direction: Direction) -> Vec<PassTrace> {
    vec![trace_pass(&Des::new(key), block, direction, 1, 1)]
}

pub fn trace_triple_des(block: &Block, key: &TripleKey, direction: Direction) -> Vec<PassTrace> {
    let cipher = TripleDes::new(key);
    let [k1, k2, k3] = cipher.passes();

    // decryption walks the keys backwards, the middle pass always runs opposite to the outer two
    let keys = match direction {
        Direction::Encrypt => [(k1, 1), (k2, 2), (k3, 3)],
        Direction::Decrypt => [(k3, 3), (k2, 2), (k1, 1)]
    };
    let directions = [direction, direction.reverse(), direction];

    let mut passes = Vec::with_capacity(3);
    let mut input = *block;
    for (i, ((des, key_index), pass_direction)) in keys.into_iter().zip(directions).enumerate() {
        let pass = trace_pass(des, &input, pass_direction, i + 1, key_index);
        input = pass.output;
        passes.push(pass);
    }
    passes
}

impl fmt::Display for PassTrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.direction {
            Direction::Encrypt => "encrypt",
            Direction::Decrypt => "decrypt"
        };
        writeln!(f, "pass {}: {} with K{} input {}", self.pass, op, self.key_index, hex::encode(self.input))?;
        for r in self.rounds.iter() {
            writeln!(f, "  round {:2}  K={}  L={}  R={}", r.round, hex::encode(r.subkey), hex::encode(r.left), hex::encode(r.right))?;
        }
        write!(f, "  output {}", hex::encode(self.output))
    }
}
