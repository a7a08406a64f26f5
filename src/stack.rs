//! # Operand Stack
//!
//! The 256-bit word stack, bounded at 1024 entries.

use crate::errors::VmError;
use crate::types::U256;

/// Hard limit on stack depth.
pub const STACK_LIMIT: usize = 1024;

/// LIFO operand stack of 256-bit words.
#[derive(Clone, Debug, Default)]
pub struct Stack {
    items: Vec<U256>,
}

impl Stack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Vec::with_capacity(32),
        }
    }

    /// Current depth.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns true if no operands are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Pushes a word.
    ///
    /// # Errors
    ///
    /// `StackOverflow` when the stack already holds 1024 items.
    pub fn push(&mut self, value: U256) -> Result<(), VmError> {
        if self.items.len() >= STACK_LIMIT {
            return Err(VmError::StackOverflow);
        }
        self.items.push(value);
        Ok(())
    }

    /// Pops the top word.
    ///
    /// # Errors
    ///
    /// `StackUnderflow` when the stack is empty.
    pub fn pop(&mut self) -> Result<U256, VmError> {
        self.items.pop().ok_or(VmError::StackUnderflow)
    }

    /// Reads the word `depth` positions from the top without removing it
    /// (0 is the top).
    ///
    /// # Errors
    ///
    /// `StackUnderflow` when fewer than `depth + 1` items are present.
    pub fn peek(&self, depth: usize) -> Result<U256, VmError> {
        if depth >= self.items.len() {
            return Err(VmError::StackUnderflow);
        }
        Ok(self.items[self.items.len() - 1 - depth])
    }

    /// DUPn: pushes a copy of the word `n` positions down (1 is the top).
    ///
    /// # Errors
    ///
    /// `StackUnderflow` or `StackOverflow`.
    pub fn dup(&mut self, n: usize) -> Result<(), VmError> {
        let value = self.peek(n - 1)?;
        self.push(value)
    }

    /// SWAPn: exchanges the top word with the one `n` positions below it.
    ///
    /// # Errors
    ///
    /// `StackUnderflow` when fewer than `n + 1` items are present.
    pub fn swap(&mut self, n: usize) -> Result<(), VmError> {
        if n >= self.items.len() {
            return Err(VmError::StackUnderflow);
        }
        let top = self.items.len() - 1;
        self.items.swap(top, top - n);
        Ok(())
    }

    /// Read-only view for tracers.
    #[must_use]
    pub fn as_slice(&self) -> &[U256] {
        &self.items
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop_order() {
        let mut stack = Stack::new();
        stack.push(U256::from(1)).unwrap();
        stack.push(U256::from(2)).unwrap();
        assert_eq!(stack.pop().unwrap(), U256::from(2));
        assert_eq!(stack.pop().unwrap(), U256::from(1));
        assert_eq!(stack.pop(), Err(VmError::StackUnderflow));
    }

    #[test]
    fn test_overflow_at_limit() {
        let mut stack = Stack::new();
        for i in 0..STACK_LIMIT {
            stack.push(U256::from(i)).unwrap();
        }
        assert_eq!(stack.push(U256::zero()), Err(VmError::StackOverflow));
        assert_eq!(stack.len(), STACK_LIMIT);
    }

    #[test]
    fn test_dup_semantics() {
        let mut stack = Stack::new();
        stack.push(U256::from(10)).unwrap();
        stack.push(U256::from(20)).unwrap();

        // DUP1 copies the top.
        stack.dup(1).unwrap();
        assert_eq!(stack.peek(0).unwrap(), U256::from(20));

        // DUP3 copies the bottom.
        stack.dup(3).unwrap();
        assert_eq!(stack.peek(0).unwrap(), U256::from(10));
        assert_eq!(stack.len(), 4);
    }

    #[test]
    fn test_swap_semantics() {
        let mut stack = Stack::new();
        stack.push(U256::from(1)).unwrap();
        stack.push(U256::from(2)).unwrap();
        stack.push(U256::from(3)).unwrap();

        stack.swap(2).unwrap();
        assert_eq!(stack.peek(0).unwrap(), U256::from(1));
        assert_eq!(stack.peek(2).unwrap(), U256::from(3));

        assert_eq!(stack.swap(3), Err(VmError::StackUnderflow));
    }

    #[test]
    fn test_dup_underflow() {
        let mut stack = Stack::new();
        assert_eq!(stack.dup(1), Err(VmError::StackUnderflow));
    }
}
