//! Tree flattening.
//!
//! Each detached tree is emitted in preorder (children before siblings)
//! while its links are rewritten in place, so that afterwards the whole
//! tree is one chain threaded through `child`, ready to go back to the
//! freelist with a single compare-exchange. Block access order degenerates
//! over time as a result; reclamation cost is what matters here.
//!
//! The traversal uses an explicit stack: sibling chains under a contended
//! root can grow far deeper than any realistic call nesting.

use std::sync::atomic::Ordering;

use crate::api::sink::RecordSink;
use crate::core::state::ProfilerCore;
use crate::pool::freelist::BlockPool;

enum Step {
    /// Emit this block and descend.
    Enter(u16),
    /// Child subtree done; decide whether a sibling subtree follows.
    AfterChild { block: u16, child: u16, sibling: u16 },
    /// Both subtrees done; splice the sibling chain in front of the child chain.
    AfterBoth {
        block: u16,
        child: u16,
        sibling: u16,
        child_leaf: u16,
    },
    /// Only a sibling subtree existed; hook it onto `child`.
    AfterSibling { block: u16, sibling: u16 },
}

/// Emit the tree rooted at `root` and rewrite it into a chain through
/// `child`. Returns the slot of the chain's tail.
///
/// The caller must own the tree exclusively (a detached root with its
/// `sibling` already cleared).
pub(crate) fn process_tree(pool: &BlockPool, root: u16, sink: Option<&dyn RecordSink>) -> u16 {
    let mut steps = vec![Step::Enter(root)];
    // Tail of the most recently completed subtree chain.
    let mut leaf = root;

    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(slot) => {
                // SAFETY: every slot reachable from `root` is part of the
                // tree the caller owns.
                let (child, sibling) = unsafe {
                    let block = pool.get(slot);
                    if let Some(sink) = sink {
                        sink.write(&(*block).record_image());
                    }
                    ((*block).child.load(Ordering::Relaxed), (*block).sibling)
                };
                if child != 0 {
                    steps.push(Step::AfterChild {
                        block: slot,
                        child,
                        sibling,
                    });
                    steps.push(Step::Enter(child));
                } else if sibling != 0 {
                    steps.push(Step::AfterSibling {
                        block: slot,
                        sibling,
                    });
                    steps.push(Step::Enter(sibling));
                } else {
                    leaf = slot;
                }
            }
            Step::AfterChild {
                block,
                child,
                sibling,
            } => {
                if sibling != 0 {
                    steps.push(Step::AfterBoth {
                        block,
                        child,
                        sibling,
                        child_leaf: leaf,
                    });
                    steps.push(Step::Enter(sibling));
                }
                // Without a sibling, `leaf` already holds the child chain's
                // tail and the block's links are already chain-shaped.
            }
            Step::AfterBoth {
                block,
                child,
                sibling,
                child_leaf,
            } => {
                // `leaf` is the sibling chain's tail. Final chain:
                // block → sibling…leaf → child…child_leaf.
                // SAFETY: all involved slots are in the owned tree.
                unsafe {
                    (*pool.get(leaf)).child.store(child, Ordering::Relaxed);
                    let blockptr = pool.get(block);
                    (*blockptr).child.store(sibling, Ordering::Relaxed);
                    (*blockptr).sibling = 0;
                }
                leaf = child_leaf;
            }
            Step::AfterSibling { block, sibling } => {
                // SAFETY: as above.
                unsafe {
                    let blockptr = pool.get(block);
                    (*blockptr).child.store(sibling, Ordering::Relaxed);
                    (*blockptr).sibling = 0;
                }
                // `leaf` is the sibling chain's tail, which tails the whole
                // chain.
            }
        }
    }
    leaf
}

/// Detach the pending chain and flatten every tree on it, returning each
/// tree to the freelist as one bulk chain.
pub(crate) fn process_roots(core: &ProfilerCore, sink: Option<&dyn RecordSink>) {
    let mut slot = core.detach_roots();
    while slot != 0 {
        // SAFETY: detaching transferred the whole chain to us. The next
        // root has to be saved before flattening rewrites the links.
        let next = unsafe {
            let block = core.pool.get(slot);
            let next = (*block).sibling;
            (*block).sibling = 0;
            next
        };
        let leaf = process_tree(&core.pool, slot, sink);
        core.pool.free_chain(slot, leaf);
        slot = next;
    }
}
