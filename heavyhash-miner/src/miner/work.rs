use crate::header::RpcBlock;
use crate::pow::PowState;

/// The template currently being mined, with its precomputed search state.
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub block: RpcBlock,
    pub pow: PowState,
}

impl WorkItem {
    /// Derive the search state for `block`. Generates the matrix.
    pub fn new(block: RpcBlock) -> Self {
        let pow = PowState::new(&block.header);
        Self { block, pow }
    }

    /// Stamp a winning nonce and hand back the block for submission.
    pub fn into_solved(mut self, nonce: u64) -> RpcBlock {
        self.block.header.nonce = nonce;
        self.block
    }
}
