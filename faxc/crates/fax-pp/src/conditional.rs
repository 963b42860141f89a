//! Per-source conditional (`#if`/`#ifdef`/.../`#endif`) stack.

use fax_util::pool::{Pool, PoolHandle};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveKind {
    If,
    Ifdef,
    Ifndef,
    Elif,
    Else,
}

#[derive(Clone, Debug)]
pub struct Conditional {
    pub kind: DirectiveKind,
    pub start_line: u32,
    /// True iff any ancestor is skipping, or no branch has been chosen yet
    /// in this chain.
    pub skipping: bool,
    /// True iff this is the (at most one) branch of its chain being emitted.
    pub chosen: bool,
    /// Whether the conditional *outside* this chain is itself skipping.
    /// Fixed at push time; `elif`/`else` never change it, only whether a
    /// branch inside this chain has been chosen.
    pub(crate) ancestor_skipping: bool,
}

/// One `IncludeState`'s conditional stack. Pool-backed for reuse across pushes/pops.
pub struct ConditionalStack {
    pool: Pool<Conditional>,
    stack: Vec<PoolHandle>,
}

impl ConditionalStack {
    pub fn new() -> Self {
        Self {
            pool: Pool::new(),
            stack: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    /// `skipping` as observed by the token pump: whether the *current*
    /// (innermost) conditional is suppressing emission.
    pub fn currently_skipping(&self) -> bool {
        self.top().map(|c| c.skipping).unwrap_or(false)
    }

    pub fn top(&self) -> Option<&Conditional> {
        self.stack.last().map(|&h| self.pool.get(h))
    }

    /// Whether the innermost chain's `ancestor_skipping` flag is set — used
    /// by `#elif`/`#else` dispatch to decide whether to evaluate an
    /// expression at all.
    pub fn ancestor_skipping(&self) -> bool {
        self.top().map(|c| c.ancestor_skipping).unwrap_or(false)
    }

    /// Push `#if`/`#ifdef`/`#ifndef`: nested conditionals inherit
    /// `skipping` from the parent.
    pub fn push_if(&mut self, kind: DirectiveKind, start_line: u32, condition_true: bool) {
        let ancestor_skipping = self.currently_skipping();
        let chosen = !ancestor_skipping && condition_true;
        let handle = self.pool.alloc(Conditional {
            kind,
            start_line,
            skipping: ancestor_skipping || !chosen,
            chosen,
            ancestor_skipping,
        });
        self.stack.push(handle);
    }

    /// `#elif`: only legal atop an `If`/`Ifdef`/`Ifndef`/`Elif` whose chain
    /// hasn't reached an `#else` yet.
    pub fn elif(&mut self, start_line: u32, condition_true: bool) -> Result<(), &'static str> {
        let handle = *self.stack.last().ok_or("elif without matching if")?;
        let entry = self.pool.get_mut(handle);
        if entry.kind == DirectiveKind::Else {
            return Err("elif after else");
        }
        let branch_already_chosen = entry.chosen;
        let chosen = !entry.ancestor_skipping && !branch_already_chosen && condition_true;
        entry.kind = DirectiveKind::Elif;
        entry.start_line = start_line;
        entry.chosen = entry.chosen || chosen;
        entry.skipping = entry.ancestor_skipping || !chosen;
        Ok(())
    }

    /// `#else`: flips to the else branch if no prior branch was chosen.
    pub fn else_branch(&mut self, start_line: u32) -> Result<(), &'static str> {
        let handle = *self.stack.last().ok_or("else without matching if")?;
        let entry = self.pool.get_mut(handle);
        if entry.kind == DirectiveKind::Else {
            return Err("else after else");
        }
        let branch_already_chosen = entry.chosen;
        let chosen = !entry.ancestor_skipping && !branch_already_chosen;
        entry.kind = DirectiveKind::Else;
        entry.start_line = start_line;
        entry.chosen = entry.chosen || chosen;
        entry.skipping = entry.ancestor_skipping || !chosen;
        Ok(())
    }

    pub fn pop_endif(&mut self) -> Result<(), &'static str> {
        let handle = self.stack.pop().ok_or("endif without matching if")?;
        self.pool.free(handle);
        Ok(())
    }
}

impl Default for ConditionalStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn if_true_is_chosen_and_not_skipping() {
        let mut stack = ConditionalStack::new();
        stack.push_if(DirectiveKind::If, 1, true);
        assert!(stack.top().unwrap().chosen);
        assert!(!stack.currently_skipping());
    }

    #[test]
    fn if_false_skips_and_else_picks_up() {
        let mut stack = ConditionalStack::new();
        stack.push_if(DirectiveKind::If, 1, false);
        assert!(stack.currently_skipping());
        stack.else_branch(3).unwrap();
        assert!(!stack.currently_skipping());
        assert!(stack.top().unwrap().chosen);
    }

    #[test]
    fn else_after_else_is_rejected() {
        let mut stack = ConditionalStack::new();
        stack.push_if(DirectiveKind::If, 1, false);
        stack.else_branch(2).unwrap();
        assert!(stack.else_branch(3).is_err());
    }

    #[test]
    fn elif_after_else_is_rejected() {
        let mut stack = ConditionalStack::new();
        stack.push_if(DirectiveKind::If, 1, false);
        stack.else_branch(2).unwrap();
        assert!(stack.elif(3, true).is_err());
    }

    #[test]
    fn elif_only_fires_if_if_branch_was_false() {
        let mut stack = ConditionalStack::new();
        stack.push_if(DirectiveKind::If, 1, true);
        stack.elif(2, true).unwrap();
        // the `if` branch already won; elif must not also be chosen
        assert!(stack.currently_skipping());
    }

    #[test]
    fn nested_conditional_inherits_skipping() {
        let mut stack = ConditionalStack::new();
        stack.push_if(DirectiveKind::If, 1, false);
        stack.push_if(DirectiveKind::If, 2, true);
        assert!(stack.currently_skipping());
    }

    #[test]
    fn endif_pops() {
        let mut stack = ConditionalStack::new();
        stack.push_if(DirectiveKind::If, 1, true);
        stack.pop_endif().unwrap();
        assert!(stack.is_empty());
    }
}
